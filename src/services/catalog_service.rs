use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::{AuthUser, Role};
use crate::database::bind_value_as;
use crate::database::manager::DatabaseError;
use crate::database::models::{Alcance, CatalogItem};
use crate::ident::{self, Entity};
use crate::scope::{self, Visibility};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Servicio no encontrado: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Formato de id invalido: {0}")]
    InvalidIdFormat(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceInput {
    pub nombre: String,
    #[serde(default)]
    pub categoria: Option<String>,
    /// Per-currency price map, stored as-is
    pub precios: Value,
    pub duracion_minutos: i32,
    #[serde(default)]
    pub sede_id: Option<String>,
    #[serde(default)]
    pub franquicia_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceInput {
    pub nombre: Option<String>,
    pub categoria: Option<String>,
    pub precios: Option<Value>,
    pub duracion_minutos: Option<i32>,
}

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a catalog service. A super_admin chooses the scope tags freely
    /// (omitting both makes the service global); an admin_sede always creates
    /// under their own site, with the franchise tag resolved from the site.
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateServiceInput,
    ) -> Result<CatalogItem, CatalogError> {
        let (sede_id, franquicia_id) = match user.rol {
            Role::SuperAdmin => (input.sede_id, input.franquicia_id),
            Role::AdminSede => {
                let sede = user.sede_id.clone().ok_or_else(|| {
                    CatalogError::Forbidden("El administrador no tiene sede asignada".into())
                })?;
                let franquicia = scope::franchise_of(&self.pool, &sede).await?;
                (Some(sede), franquicia)
            }
            _ => {
                return Err(CatalogError::Forbidden(
                    "No tienes permisos para crear servicios".into(),
                ))
            }
        };

        let servicio_id = ident::generate_id(&self.pool, Entity::Servicio).await?;

        let item = sqlx::query_as::<_, CatalogItem>(
            r#"INSERT INTO servicios
                   (servicio_id, nombre, categoria, precios, duracion_minutos,
                    sede_id, franquicia_id, activo, creado_por, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9)
               RETURNING *"#,
        )
        .bind(&servicio_id)
        .bind(input.nombre.trim())
        .bind(&input.categoria)
        .bind(&input.precios)
        .bind(input.duracion_minutos)
        .bind(&sede_id)
        .bind(&franquicia_id)
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    /// Scoped listing. `activo = None` lists everything the caller can see,
    /// including soft-deleted services.
    pub async fn list(
        &self,
        visibility: &Visibility,
        activo: Option<bool>,
        categoria: Option<&str>,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let (predicate, params) = visibility.predicate(1);
        let mut next = visibility.next_param(1);
        let mut sql = format!("SELECT * FROM servicios WHERE {predicate}");
        let mut extra: Vec<Value> = Vec::new();

        if let Some(activo) = activo {
            sql.push_str(&format!(" AND activo = ${next}"));
            extra.push(json!(activo));
            next += 1;
        }
        if let Some(categoria) = categoria.map(str::trim).filter(|c| !c.is_empty()) {
            sql.push_str(&format!(" AND categoria = ${next}"));
            extra.push(json!(categoria));
        }

        sql.push_str(" ORDER BY nombre ASC");

        let mut query = sqlx::query_as::<_, CatalogItem>(&sql);
        for param in params.iter().chain(extra.iter()) {
            query = bind_value_as(query, param);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, servicio_id: &str) -> Result<CatalogItem, CatalogError> {
        sqlx::query_as::<_, CatalogItem>("SELECT * FROM servicios WHERE servicio_id = $1")
            .bind(servicio_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::NotFound(servicio_id.to_string()))
    }

    /// Update mutable fields. Scope tags are immutable after creation; an
    /// admin_sede may only touch services local to their own site.
    pub async fn update(
        &self,
        user: &AuthUser,
        servicio_id: &str,
        input: UpdateServiceInput,
    ) -> Result<CatalogItem, CatalogError> {
        let item = self.get(servicio_id).await?;
        self.check_ownership(user, &item)?;

        let updated = sqlx::query_as::<_, CatalogItem>(
            r#"UPDATE servicios
               SET nombre = COALESCE($2, nombre),
                   categoria = COALESCE($3, categoria),
                   precios = COALESCE($4, precios),
                   duracion_minutos = COALESCE($5, duracion_minutos),
                   updated_by = $6,
                   updated_at = $7
               WHERE servicio_id = $1
               RETURNING *"#,
        )
        .bind(servicio_id)
        .bind(input.nombre.as_deref().map(str::trim))
        .bind(&input.categoria)
        .bind(&input.precios)
        .bind(input.duracion_minutos)
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Soft delete: the row is kept, `activo` flips to false and the deletion
    /// actor and timestamp are recorded.
    pub async fn soft_delete(
        &self,
        user: &AuthUser,
        servicio_id: &str,
    ) -> Result<CatalogItem, CatalogError> {
        let item = self.get(servicio_id).await?;
        self.check_ownership(user, &item)?;

        let deleted = sqlx::query_as::<_, CatalogItem>(
            r#"UPDATE servicios
               SET activo = FALSE, deleted_by = $2, deleted_at = $3
               WHERE servicio_id = $1
               RETURNING *"#,
        )
        .bind(servicio_id)
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(deleted)
    }

    /// Validate a service reference before it is embedded elsewhere: the id
    /// must be well-formed and resolve to an active service. Returns the
    /// service along with its scope classification.
    pub async fn validate(
        &self,
        servicio_id: &str,
    ) -> Result<(CatalogItem, Alcance), CatalogError> {
        if !ident::validate_format(Entity::Servicio, servicio_id) {
            return Err(CatalogError::InvalidIdFormat(servicio_id.to_string()));
        }

        let item = self.get(servicio_id).await?;
        if !item.activo {
            return Err(CatalogError::NotFound(servicio_id.to_string()));
        }

        let alcance = item.alcance();
        Ok((item, alcance))
    }

    fn check_ownership(&self, user: &AuthUser, item: &CatalogItem) -> Result<(), CatalogError> {
        match user.rol {
            Role::SuperAdmin => Ok(()),
            Role::AdminSede => {
                if item.sede_id.is_some() && item.sede_id == user.sede_id {
                    Ok(())
                } else {
                    Err(CatalogError::Forbidden(
                        "Solo puedes modificar servicios de tu propia sede".into(),
                    ))
                }
            }
            _ => Err(CatalogError::Forbidden(
                "No tienes permisos para modificar servicios".into(),
            )),
        }
    }
}
