use serde_json::{json, Value};
use sqlx::PgPool;

use crate::database::bind_value_as;
use crate::database::models::{Account, Site};
use crate::scope::Visibility;
use crate::services::franchise_service::FranchiseError;
use crate::ident::{self, Entity};

/// Ownership predicate over the `sedes` table itself. Unlike scoped resource
/// tables, a NULL `franquicia_id` here means "not yet assigned", so the
/// franchise and site cases match exactly instead of keeping a global branch.
fn ownership_condition(visibility: &Visibility) -> (String, Vec<Value>) {
    match visibility {
        Visibility::Unrestricted => ("1=1".to_string(), vec![]),
        Visibility::Franchise(franquicia_id) => {
            ("franquicia_id = $1".to_string(), vec![json!(franquicia_id)])
        }
        Visibility::Site {
            sede_id,
            franquicia_id: Some(franquicia_id),
        } => (
            "(sede_id = $1 OR franquicia_id = $2)".to_string(),
            vec![json!(sede_id), json!(franquicia_id)],
        ),
        Visibility::Site {
            sede_id,
            franquicia_id: None,
        } => ("sede_id = $1".to_string(), vec![json!(sede_id)]),
    }
}

pub struct SiteService {
    pool: PgPool,
}

impl SiteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, nombre: &str, pais: &str) -> Result<Site, FranchiseError> {
        let sede_id = ident::generate_id(&self.pool, Entity::Sede).await?;

        let site = sqlx::query_as::<_, Site>(
            r#"INSERT INTO sedes (sede_id, nombre, pais)
               VALUES ($1, $2, $3)
               RETURNING *"#,
        )
        .bind(&sede_id)
        .bind(nombre.trim())
        .bind(pais.trim())
        .fetch_one(&self.pool)
        .await?;

        Ok(site)
    }

    pub async fn list(&self, visibility: &Visibility) -> Result<Vec<Site>, FranchiseError> {
        let (condition, params) = ownership_condition(visibility);
        let sql = format!("SELECT * FROM sedes WHERE {condition} ORDER BY nombre ASC");

        let mut query = sqlx::query_as::<_, Site>(&sql);
        for param in &params {
            query = bind_value_as(query, param);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn find(&self, sede_id: &str) -> Result<Site, FranchiseError> {
        sqlx::query_as::<_, Site>("SELECT * FROM sedes WHERE sede_id = $1")
            .bind(sede_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FranchiseError::SiteNotFound(sede_id.to_string()))
    }

    /// Staff accounts bound to a site, as written by the membership
    /// propagator. Useful for verifying how far a propagation reached.
    pub async fn accounts(&self, sede_id: &str) -> Result<Vec<Account>, FranchiseError> {
        self.find(sede_id).await?;

        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM cuentas WHERE sede_id = $1 ORDER BY email ASC",
        )
        .bind(sede_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn franchise_listing_matches_the_tag_exactly() {
        let (condition, params) = ownership_condition(&Visibility::Franchise("FR-000001".into()));
        assert_eq!(condition, "franquicia_id = $1");
        assert_eq!(params, vec![json!("FR-000001")]);
        // Unassigned sites must stay out of a franchise admin's listing
        assert!(!condition.contains("IS NULL"));
    }

    #[test]
    fn site_listing_reaches_siblings_only_through_the_franchise() {
        let (condition, params) = ownership_condition(&Visibility::Site {
            sede_id: "SD-000001".into(),
            franquicia_id: Some("FR-000001".into()),
        });
        assert_eq!(condition, "(sede_id = $1 OR franquicia_id = $2)");
        assert_eq!(params, vec![json!("SD-000001"), json!("FR-000001")]);

        let (condition, params) = ownership_condition(&Visibility::Site {
            sede_id: "SD-000001".into(),
            franquicia_id: None,
        });
        assert_eq!(condition, "sede_id = $1");
        assert_eq!(params, vec![json!("SD-000001")]);
    }

    #[test]
    fn unrestricted_listing_has_no_filter() {
        let (condition, params) = ownership_condition(&Visibility::Unrestricted);
        assert_eq!(condition, "1=1");
        assert!(params.is_empty());
    }
}
