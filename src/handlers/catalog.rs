use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::scope::Visibility;
use crate::services::catalog_service::{CatalogService, CreateServiceInput, UpdateServiceInput};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub activo: Option<bool>,
    pub categoria: Option<String>,
}

fn require_catalog_access(user: &AuthUser) -> Result<(), ApiError> {
    if user.rol.can_manage_catalog() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "No tienes permisos para administrar el catalogo",
        ))
    }
}

/// POST /api/servicios
pub async fn create_service(
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<CreateServiceInput>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_catalog_access(&user)?;

    if payload.nombre.trim().is_empty() {
        return Err(ApiError::bad_request("El nombre no puede estar vacio"));
    }
    if payload.duracion_minutos <= 0 {
        return Err(ApiError::bad_request(
            "duracion_minutos debe ser mayor que cero",
        ));
    }

    let pool = DatabaseManager::pool().await?;
    let item = CatalogService::new(pool).create(&user, payload).await?;

    Ok(Json(json!({
        "success": true,
        "servicio": item,
        "alcance": item.alcance()
    })))
}

/// GET /api/servicios
pub async fn list_services(
    user: Option<Extension<AuthUser>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let items = CatalogService::new(pool)
        .list(&visibility, query.activo, query.categoria.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "total": items.len(),
        "servicios": items
    })))
}

/// GET /api/servicios/:servicio_id
pub async fn get_service(
    user: Option<Extension<AuthUser>>,
    Path(servicio_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let item = CatalogService::new(pool).get(&servicio_id).await?;

    Ok(Json(json!({
        "success": true,
        "servicio": item,
        "alcance": item.alcance()
    })))
}

/// PUT /api/servicios/:servicio_id
pub async fn update_service(
    user: Option<Extension<AuthUser>>,
    Path(servicio_id): Path<String>,
    Json(payload): Json<UpdateServiceInput>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_catalog_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let item = CatalogService::new(pool)
        .update(&user, &servicio_id, payload)
        .await?;

    Ok(Json(json!({
        "success": true,
        "servicio": item
    })))
}

/// DELETE /api/servicios/:servicio_id
pub async fn delete_service(
    user: Option<Extension<AuthUser>>,
    Path(servicio_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_catalog_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let item = CatalogService::new(pool)
        .soft_delete(&user, &servicio_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Servicio {} desactivado", servicio_id),
        "servicio": item
    })))
}

/// GET /api/servicios/:servicio_id/validar
pub async fn validate_service(
    user: Option<Extension<AuthUser>>,
    Path(servicio_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let (item, alcance) = CatalogService::new(pool).validate(&servicio_id).await?;

    Ok(Json(json!({
        "success": true,
        "valido": true,
        "servicio_id": item.servicio_id,
        "nombre": item.nombre,
        "alcance": alcance
    })))
}
