use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::services::franchise_service::FranchiseService;

#[derive(Debug, Deserialize)]
pub struct FranchisePayload {
    pub nombre: String,
}

fn require_topology_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.rol.can_manage_franchises() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Solo super_admin puede administrar franquicias",
        ))
    }
}

fn validated_name(payload: &FranchisePayload) -> Result<&str, ApiError> {
    let nombre = payload.nombre.trim();
    if nombre.is_empty() {
        return Err(ApiError::bad_request("El nombre no puede estar vacio"));
    }
    Ok(nombre)
}

/// POST /api/franquicias
pub async fn create_franchise(
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<FranchisePayload>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;
    let nombre = validated_name(&payload)?;

    let pool = DatabaseManager::pool().await?;
    let franchise = FranchiseService::new(pool).create(nombre, &user.email).await?;

    Ok(Json(json!({
        "success": true,
        "franquicia": franchise
    })))
}

/// GET /api/franquicias
pub async fn list_franchises(
    user: Option<Extension<AuthUser>>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let franchises = FranchiseService::new(pool).list().await?;

    Ok(Json(json!({
        "success": true,
        "total": franchises.len(),
        "franquicias": franchises
    })))
}

/// GET /api/franquicias/:franquicia_id
pub async fn get_franchise(
    user: Option<Extension<AuthUser>>,
    Path(franquicia_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let (franchise, sedes) = FranchiseService::new(pool).detail(&franquicia_id).await?;

    Ok(Json(json!({
        "success": true,
        "franquicia": franchise,
        "sedes": sedes
    })))
}

/// PUT /api/franquicias/:franquicia_id
pub async fn rename_franchise(
    user: Option<Extension<AuthUser>>,
    Path(franquicia_id): Path<String>,
    Json(payload): Json<FranchisePayload>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;
    let nombre = validated_name(&payload)?;

    let pool = DatabaseManager::pool().await?;
    let franchise = FranchiseService::new(pool)
        .rename(&franquicia_id, nombre, &user.email)
        .await?;

    Ok(Json(json!({
        "success": true,
        "franquicia": franchise
    })))
}

/// DELETE /api/franquicias/:franquicia_id
pub async fn delete_franchise(
    user: Option<Extension<AuthUser>>,
    Path(franquicia_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    FranchiseService::new(pool).delete(&franquicia_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Franquicia {} eliminada", franquicia_id)
    })))
}

/// POST /api/franquicias/:franquicia_id/sedes/:sede_id
pub async fn assign_site(
    user: Option<Extension<AuthUser>>,
    Path((franquicia_id, sede_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let result = FranchiseService::new(pool)
        .assign_site(&franquicia_id, &sede_id, &user.email)
        .await?;

    Ok(Json(json!({
        "success": true,
        "franquicia_id": result.franquicia_id,
        "sede_id": result.sede_id,
        "usuarios_afectados": result.usuarios_afectados
    })))
}

/// DELETE /api/franquicias/:franquicia_id/sedes/:sede_id
pub async fn unassign_site(
    user: Option<Extension<AuthUser>>,
    Path((franquicia_id, sede_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_topology_admin(&user)?;

    let pool = DatabaseManager::pool().await?;
    let result = FranchiseService::new(pool)
        .unassign_site(&franquicia_id, &sede_id, &user.email)
        .await?;

    Ok(Json(json!({
        "success": true,
        "franquicia_id": result.franquicia_id,
        "sede_id": result.sede_id,
        "usuarios_afectados": result.usuarios_afectados
    })))
}
