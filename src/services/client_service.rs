use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::AuthUser;
use crate::database::bind_value_as;
use crate::database::manager::DatabaseError;
use crate::database::models::{Client, ClientNote, ClientSummary};
use crate::ident::{self, Entity};
use crate::scope::Visibility;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Cliente no encontrado: {0}")]
    NotFound(String),

    #[error("Debe indicar la sede del cliente")]
    SiteRequired,

    #[error("Sede no encontrada: {0}")]
    SiteNotFound(String),

    #[error("Ya existe un cliente con ese {field}")]
    DuplicateContact { field: &'static str },

    #[error("Pagina {pagina} fuera de rango (total: {total_paginas})")]
    PageOutOfRange { pagina: i64, total_paginas: i64 },

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct CreateClientInput {
    pub nombre: String,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub sede_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientInput {
    pub nombre: Option<String>,
    pub correo: Option<String>,
    pub telefono: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PageMetadata {
    pub total: i64,
    pub pagina: i64,
    pub limite: i64,
    pub total_paginas: i64,
    pub tiene_siguiente: bool,
    pub tiene_anterior: bool,
    pub rango_inicio: i64,
    pub rango_fin: i64,
}

/// Record-level access check used on single-client reads and writes. When
/// both the caller's site and the client carry a franchise tag the franchise
/// decides; otherwise it falls back to a plain site comparison.
pub fn can_access(visibility: &Visibility, client: &Client) -> bool {
    match visibility {
        Visibility::Unrestricted => true,
        Visibility::Franchise(franquicia) => match client.franquicia_id.as_deref() {
            Some(tag) => tag == franquicia,
            None => true,
        },
        Visibility::Site {
            sede_id,
            franquicia_id,
        } => match (franquicia_id.as_deref(), client.franquicia_id.as_deref()) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => client.sede_id == *sede_id,
        },
    }
}

pub struct ClientService {
    pool: PgPool,
}

impl ClientService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a client bound to a site. The franchise tag is copied from the
    /// site once, at creation, and never rewritten afterwards.
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateClientInput,
    ) -> Result<Client, ClientError> {
        let sede_id = user
            .sede_id
            .clone()
            .or(input.sede_id)
            .ok_or(ClientError::SiteRequired)?;

        let site: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT pais, franquicia_id FROM sedes WHERE sede_id = $1")
                .bind(&sede_id)
                .fetch_optional(&self.pool)
                .await?;
        let (pais, franquicia_id) = site.ok_or(ClientError::SiteNotFound(sede_id.clone()))?;

        let correo = normalize(input.correo);
        let telefono = normalize(input.telefono);
        self.check_duplicates(correo.as_deref(), telefono.as_deref(), None)
            .await?;

        let cliente_id = ident::generate_id(&self.pool, Entity::Cliente).await?;

        let client = sqlx::query_as::<_, Client>(
            r#"INSERT INTO clientes
                   (cliente_id, nombre, correo, telefono, sede_id, franquicia_id, pais,
                    notas_historial, creado_por, fecha_creacion)
               VALUES ($1, $2, $3, $4, $5, $6, $7, '[]', $8, $9)
               RETURNING *"#,
        )
        .bind(&cliente_id)
        .bind(input.nombre.trim())
        .bind(&correo)
        .bind(&telefono)
        .bind(&sede_id)
        .bind(&franquicia_id)
        .bind(&pais)
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    /// Flat scoped listing, optionally filtered by a free-text search over
    /// name, contact fields and the public id.
    pub async fn list(
        &self,
        visibility: &Visibility,
        filtro: Option<&str>,
        limite: i64,
    ) -> Result<Vec<Client>, ClientError> {
        let (predicate, params) = visibility.predicate(1);
        let mut next = visibility.next_param(1);
        let mut sql = format!("SELECT * FROM clientes WHERE {predicate}");
        let mut extra: Vec<serde_json::Value> = Vec::new();

        if let Some(filtro) = filtro.map(str::trim).filter(|f| !f.is_empty()) {
            sql.push_str(&format!(
                " AND (nombre ILIKE ${n} OR correo ILIKE ${n} OR telefono ILIKE ${n} OR cliente_id ILIKE ${n})",
                n = next
            ));
            extra.push(json!(format!("%{filtro}%")));
            next += 1;
        }

        sql.push_str(&format!(" ORDER BY nombre ASC LIMIT ${next}"));
        extra.push(json!(limite));

        let mut query = sqlx::query_as::<_, Client>(&sql);
        for param in params.iter().chain(extra.iter()) {
            query = bind_value_as(query, param);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Paginated summary listing. The page window is validated against the
    /// scoped count before fetching; page 1 over an empty scope is fine.
    pub async fn list_paginated(
        &self,
        visibility: &Visibility,
        filtro: Option<&str>,
        limite: i64,
        pagina: i64,
    ) -> Result<(Vec<ClientSummary>, PageMetadata), ClientError> {
        let (predicate, params) = visibility.predicate(1);
        let mut next = visibility.next_param(1);
        let mut condition = predicate;
        let mut extra: Vec<serde_json::Value> = Vec::new();

        if let Some(filtro) = filtro.map(str::trim).filter(|f| !f.is_empty()) {
            condition.push_str(&format!(
                " AND (nombre ILIKE ${n} OR correo ILIKE ${n} OR telefono ILIKE ${n} OR cliente_id ILIKE ${n})",
                n = next
            ));
            extra.push(json!(format!("%{filtro}%")));
            next += 1;
        }

        let count_sql = format!("SELECT COUNT(*) FROM clientes WHERE {condition}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for param in params.iter().chain(extra.iter()) {
            count_query = bind_value_as(count_query, param);
        }
        let (total,) = count_query.fetch_one(&self.pool).await?;

        let total_paginas = if total == 0 {
            1
        } else {
            (total + limite - 1) / limite
        };
        if pagina < 1 || pagina > total_paginas {
            return Err(ClientError::PageOutOfRange {
                pagina,
                total_paginas,
            });
        }

        let offset = (pagina - 1) * limite;
        let page_sql = format!(
            "SELECT id, cliente_id, nombre, correo, telefono, sede_id, franquicia_id \
             FROM clientes WHERE {condition} ORDER BY nombre ASC LIMIT ${next} OFFSET ${m}",
            m = next + 1
        );
        extra.push(json!(limite));
        extra.push(json!(offset));

        let mut page_query = sqlx::query_as::<_, ClientSummary>(&page_sql);
        for param in params.iter().chain(extra.iter()) {
            page_query = bind_value_as(page_query, param);
        }
        let rows = page_query.fetch_all(&self.pool).await?;

        let rango_inicio = if total == 0 { 0 } else { offset + 1 };
        let rango_fin = (offset + rows.len() as i64).min(total);

        Ok((
            rows,
            PageMetadata {
                total,
                pagina,
                limite,
                total_paginas,
                tiene_siguiente: pagina < total_paginas,
                tiene_anterior: pagina > 1,
                rango_inicio,
                rango_fin,
            },
        ))
    }

    pub async fn get(
        &self,
        visibility: &Visibility,
        cliente_id: &str,
    ) -> Result<Client, ClientError> {
        let client = self.find(cliente_id).await?;

        if !can_access(visibility, &client) {
            return Err(ClientError::Forbidden(
                "No tienes acceso a este cliente".into(),
            ));
        }

        Ok(client)
    }

    pub async fn update(
        &self,
        visibility: &Visibility,
        user: &AuthUser,
        cliente_id: &str,
        input: UpdateClientInput,
    ) -> Result<Client, ClientError> {
        let client = self.get(visibility, cliente_id).await?;

        let correo = normalize(input.correo);
        let telefono = normalize(input.telefono);
        self.check_duplicates(correo.as_deref(), telefono.as_deref(), Some(&client.cliente_id))
            .await?;

        let updated = sqlx::query_as::<_, Client>(
            r#"UPDATE clientes
               SET nombre = COALESCE($2, nombre),
                   correo = COALESCE($3, correo),
                   telefono = COALESCE($4, telefono),
                   modificado_por = $5,
                   fecha_modificacion = $6
               WHERE cliente_id = $1
               RETURNING *"#,
        )
        .bind(cliente_id)
        .bind(input.nombre.as_deref().map(str::trim))
        .bind(&correo)
        .bind(&telefono)
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Append a note to the client's history. Notes are append-only.
    pub async fn add_note(
        &self,
        visibility: &Visibility,
        user: &AuthUser,
        cliente_id: &str,
        texto: &str,
    ) -> Result<Client, ClientError> {
        self.get(visibility, cliente_id).await?;

        let note = ClientNote {
            texto: texto.trim().to_string(),
            autor: user.email.clone(),
            fecha: Utc::now().naive_utc(),
        };

        let updated = sqlx::query_as::<_, Client>(
            r#"UPDATE clientes
               SET notas_historial = notas_historial || $2::jsonb,
                   modificado_por = $3,
                   fecha_modificacion = $4
               WHERE cliente_id = $1
               RETURNING *"#,
        )
        .bind(cliente_id)
        .bind(json!([note]))
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn find(&self, cliente_id: &str) -> Result<Client, ClientError> {
        sqlx::query_as::<_, Client>("SELECT * FROM clientes WHERE cliente_id = $1")
            .bind(cliente_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ClientError::NotFound(cliente_id.to_string()))
    }

    async fn check_duplicates(
        &self,
        correo: Option<&str>,
        telefono: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<(), ClientError> {
        if let Some(correo) = correo {
            if self.contact_taken("correo", correo, exclude).await? {
                return Err(ClientError::DuplicateContact { field: "correo" });
            }
        }
        if let Some(telefono) = telefono {
            if self.contact_taken("telefono", telefono, exclude).await? {
                return Err(ClientError::DuplicateContact { field: "telefono" });
            }
        }
        Ok(())
    }

    async fn contact_taken(
        &self,
        column: &str,
        value: &str,
        exclude: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let sql = match exclude {
            Some(_) => format!(
                "SELECT EXISTS(SELECT 1 FROM clientes WHERE {column} = $1 AND cliente_id <> $2)"
            ),
            None => format!("SELECT EXISTS(SELECT 1 FROM clientes WHERE {column} = $1)"),
        };

        let mut query = sqlx::query_as::<_, (bool,)>(&sql).bind(value);
        if let Some(exclude) = exclude {
            query = query.bind(exclude);
        }

        let (exists,) = query.fetch_one(&self.pool).await?;
        Ok(exists)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn client(sede: &str, franquicia: Option<&str>) -> Client {
        Client {
            id: uuid::Uuid::new_v4(),
            cliente_id: "CL-000001".into(),
            nombre: "Ana".into(),
            correo: None,
            telefono: None,
            sede_id: sede.into(),
            franquicia_id: franquicia.map(str::to_string),
            pais: "CO".into(),
            notas_historial: sqlx::types::Json(vec![]),
            creado_por: "admin@x".into(),
            fecha_creacion: Utc::now().naive_utc(),
            modificado_por: None,
            fecha_modificacion: None,
        }
    }

    #[test]
    fn franchise_tags_decide_when_both_present() {
        let v = Visibility::from_parts(
            Role::AdminSede,
            Some("SD-1".into()),
            Some("FR-1".into()),
        )
        .unwrap();

        // Sibling site, same franchise: allowed even though sites differ
        assert!(can_access(&v, &client("SD-2", Some("FR-1"))));
        assert!(!can_access(&v, &client("SD-2", Some("FR-2"))));
    }

    #[test]
    fn falls_back_to_site_comparison_without_franchise() {
        let v = Visibility::from_parts(Role::AdminSede, Some("SD-1".into()), None).unwrap();
        assert!(can_access(&v, &client("SD-1", None)));
        assert!(!can_access(&v, &client("SD-2", None)));
    }

    #[test]
    fn franchise_admin_sees_untagged_clients() {
        let v = Visibility::Franchise("FR-1".into());
        assert!(can_access(&v, &client("SD-9", None)));
        assert!(can_access(&v, &client("SD-9", Some("FR-1"))));
        assert!(!can_access(&v, &client("SD-9", Some("FR-2"))));
    }

    #[test]
    fn normalizes_blank_contacts_to_none() {
        assert_eq!(normalize(Some("  ".into())), None);
        assert_eq!(normalize(Some(" a@b.co ".into())), Some("a@b.co".into()));
        assert_eq!(normalize(None), None);
    }
}
