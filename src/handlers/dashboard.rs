use axum::{extract::Query, Extension, Json};
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::services::dashboard_service::DashboardService;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sede_id: Option<String>,
}

/// GET /api/dashboard/ventas
pub async fn sales_dashboard(
    user: Option<Extension<AuthUser>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;

    let pool = DatabaseManager::pool().await?;
    let report = DashboardService::new(pool)
        .sales_dashboard(
            &user,
            query.period.as_deref().unwrap_or("last_7_days"),
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            query.sede_id.as_deref(),
            Local::now().naive_local(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "dashboard": report,
        "usuario": {
            "email": user.email,
            "rol": user.rol,
            "sede_id": user.sede_id
        }
    })))
}
