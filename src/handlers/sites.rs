use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthUser, Role};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::scope::Visibility;
use crate::services::site_service::SiteService;

#[derive(Debug, Deserialize)]
pub struct SitePayload {
    pub nombre: String,
    pub pais: String,
}

/// POST /api/sedes
pub async fn create_site(
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<SitePayload>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    if !user.rol.can_manage_franchises() {
        return Err(ApiError::forbidden("Solo super_admin puede crear sedes"));
    }
    if payload.nombre.trim().is_empty() || payload.pais.trim().is_empty() {
        return Err(ApiError::bad_request("nombre y pais son obligatorios"));
    }

    let pool = DatabaseManager::pool().await?;
    let site = SiteService::new(pool)
        .create(&payload.nombre, &payload.pais)
        .await?;

    Ok(Json(json!({
        "success": true,
        "sede": site
    })))
}

/// GET /api/sedes
pub async fn list_sites(user: Option<Extension<AuthUser>>) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let sites = SiteService::new(pool).list(&visibility).await?;

    Ok(Json(json!({
        "success": true,
        "total": sites.len(),
        "sedes": sites
    })))
}

/// GET /api/sedes/:sede_id
pub async fn get_site(
    user: Option<Extension<AuthUser>>,
    Path(sede_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let site = SiteService::new(pool).find(&sede_id).await?;

    Ok(Json(json!({
        "success": true,
        "sede": site
    })))
}

/// GET /api/sedes/:sede_id/cuentas
pub async fn list_site_accounts(
    user: Option<Extension<AuthUser>>,
    Path(sede_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    // Admins only; an admin_sede may only inspect their own site
    match user.rol {
        Role::SuperAdmin | Role::AdminFranquicia => {}
        Role::AdminSede if user.sede_id.as_deref() == Some(sede_id.as_str()) => {}
        _ => {
            return Err(ApiError::forbidden(
                "No tienes permisos para ver las cuentas de esta sede",
            ))
        }
    }

    let pool = DatabaseManager::pool().await?;
    let accounts = SiteService::new(pool).accounts(&sede_id).await?;

    Ok(Json(json!({
        "success": true,
        "total": accounts.len(),
        "cuentas": accounts
    })))
}
