use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::require_user;
use crate::scope::Visibility;
use crate::services::client_service::{ClientService, CreateClientInput, UpdateClientInput};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filtro: Option<String>,
    pub limite: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub filtro: Option<String>,
    pub limite: Option<i64>,
    pub pagina: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NotePayload {
    pub texto: String,
}

fn clamp_limit(requested: Option<i64>) -> i64 {
    let api = &config::config().api;
    requested
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_list_limit)
}

fn require_read_access(user: &AuthUser) -> Result<(), ApiError> {
    if user.rol.can_view_clients() || user.rol.can_manage_clients() {
        Ok(())
    } else {
        Err(ApiError::forbidden("No tienes permisos para ver clientes"))
    }
}

fn require_write_access(user: &AuthUser) -> Result<(), ApiError> {
    if user.rol.can_manage_clients() {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "No tienes permisos para administrar clientes",
        ))
    }
}

/// POST /api/clientes
pub async fn create_client(
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<CreateClientInput>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_write_access(&user)?;

    if payload.nombre.trim().is_empty() {
        return Err(ApiError::bad_request("El nombre no puede estar vacio"));
    }

    let pool = DatabaseManager::pool().await?;
    let client = ClientService::new(pool).create(&user, payload).await?;

    Ok(Json(json!({
        "success": true,
        "cliente": client
    })))
}

/// GET /api/clientes
pub async fn list_clients(
    user: Option<Extension<AuthUser>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_read_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let clients = ClientService::new(pool)
        .list(&visibility, query.filtro.as_deref(), clamp_limit(query.limite))
        .await?;

    Ok(Json(json!({
        "success": true,
        "total": clients.len(),
        "clientes": clients
    })))
}

/// GET /api/clientes/paginado
pub async fn list_clients_paginated(
    user: Option<Extension<AuthUser>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_read_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let (clients, paginacion) = ClientService::new(pool)
        .list_paginated(
            &visibility,
            query.filtro.as_deref(),
            clamp_limit(query.limite),
            query.pagina.unwrap_or(1),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "clientes": clients,
        "paginacion": paginacion
    })))
}

/// GET /api/clientes/:cliente_id
pub async fn get_client(
    user: Option<Extension<AuthUser>>,
    Path(cliente_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_read_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let client = ClientService::new(pool).get(&visibility, &cliente_id).await?;

    Ok(Json(json!({
        "success": true,
        "cliente": client
    })))
}

/// PUT /api/clientes/:cliente_id
pub async fn update_client(
    user: Option<Extension<AuthUser>>,
    Path(cliente_id): Path<String>,
    Json(payload): Json<UpdateClientInput>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_write_access(&user)?;

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let client = ClientService::new(pool)
        .update(&visibility, &user, &cliente_id, payload)
        .await?;

    Ok(Json(json!({
        "success": true,
        "cliente": client
    })))
}

/// POST /api/clientes/:cliente_id/notas
pub async fn add_client_note(
    user: Option<Extension<AuthUser>>,
    Path(cliente_id): Path<String>,
    Json(payload): Json<NotePayload>,
) -> Result<Json<Value>, ApiError> {
    let user = require_user(user.as_deref())?;
    require_write_access(&user)?;

    if payload.texto.trim().is_empty() {
        return Err(ApiError::bad_request("La nota no puede estar vacia"));
    }

    let pool = DatabaseManager::pool().await?;
    let visibility = Visibility::for_user(&pool, &user).await?;
    let client = ClientService::new(pool)
        .add_note(&visibility, &user, &cliente_id, &payload.texto)
        .await?;

    Ok(Json(json!({
        "success": true,
        "cliente": client
    })))
}
