use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{AuthUser, Role};
use crate::database::manager::DatabaseManager;
use crate::database::models::{CommissionKind, CommissionState};
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::services::commission_service::{summarize, CommissionFilters, CommissionService};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub profesional_id: Option<String>,
    pub sede_id: Option<String>,
    pub estado: Option<String>,
    pub tipo_comision: Option<String>,
}

fn parse_state(raw: Option<&str>) -> Result<Option<CommissionState>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => CommissionState::parse(s).map(Some).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Estado invalido: {s}. Use 'pendiente' o 'liquidada'"
            ))
        }),
    }
}

fn parse_kind(raw: Option<&str>) -> Result<Option<CommissionKind>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => CommissionKind::parse(s).map(Some).ok_or_else(|| {
            ApiError::bad_request(format!(
                "Tipo invalido: {s}. Use 'servicios', 'productos' o 'mixto'"
            ))
        }),
    }
}

/// GET /api/comisiones
pub async fn list_commissions(
    user: Option<Extension<AuthUser>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    let filters = CommissionFilters {
        profesional_id: query.profesional_id,
        sede_id: query.sede_id,
        estado: parse_state(query.estado.as_deref())?,
        tipo_comision: parse_kind(query.tipo_comision.as_deref())?,
    };

    let pool = DatabaseManager::pool().await?;
    let commissions = CommissionService::new(pool).list(&user, filters).await?;

    Ok(Json(json!({
        "success": true,
        "total": commissions.len(),
        "comisiones": commissions
    })))
}

/// GET /api/comisiones/:comision_id
pub async fn get_commission(
    user: Option<Extension<AuthUser>>,
    Path(comision_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let commission = CommissionService::new(pool).get(&user, &comision_id).await?;

    let resumen = summarize(&commission);

    Ok(Json(json!({
        "success": true,
        "comision": commission,
        "resumen": resumen
    })))
}

/// PUT /api/comisiones/:comision_id/liquidar
pub async fn settle_commission(
    user: Option<Extension<AuthUser>>,
    Path(comision_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    if !matches!(user.rol, Role::SuperAdmin | Role::AdminSede) {
        return Err(ApiError::forbidden(
            "No tienes permisos para liquidar comisiones",
        ));
    }

    let pool = DatabaseManager::pool().await?;
    let commission = CommissionService::new(pool)
        .settle(&user, &comision_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "comision": commission
    })))
}
