use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::{Franchise, Site};
use crate::ident::{self, Entity};

#[derive(Debug, Error)]
pub enum FranchiseError {
    #[error("Franquicia no encontrada: {0}")]
    NotFound(String),

    #[error("Sede no encontrada: {0}")]
    SiteNotFound(String),

    #[error("La sede '{sede_id}' ya pertenece a la franquicia '{franquicia_id}'")]
    SiteClaimed {
        sede_id: String,
        franquicia_id: String,
    },

    #[error("La sede '{sede_id}' no pertenece a esta franquicia")]
    SiteNotMember { sede_id: String },

    #[error("La franquicia tiene {count} sede(s) asignada(s), desasignalas primero")]
    HasSites { count: usize },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Outcome of an assign/unassign round trip, reported back to the caller
/// so operators can see how far the propagation reached.
#[derive(Debug)]
pub struct PropagationResult {
    pub franquicia_id: String,
    pub sede_id: String,
    pub usuarios_afectados: u64,
}

/// A site already claimed by another franchise cannot be assigned; assigning
/// a site its current owner already holds is a no-op, not a conflict.
fn check_site_unclaimed(site: &Site, franquicia_id: &str) -> Result<(), FranchiseError> {
    match site.franquicia_id.as_deref() {
        Some(owner) if owner != franquicia_id => Err(FranchiseError::SiteClaimed {
            sede_id: site.sede_id.clone(),
            franquicia_id: owner.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Unassigning a site the franchise never held is a conflict, so a stale
/// client cannot silently clear another franchise's tags.
fn check_site_member(franchise: &Franchise, sede_id: &str) -> Result<(), FranchiseError> {
    if franchise.sedes.iter().any(|s| s == sede_id) {
        Ok(())
    } else {
        Err(FranchiseError::SiteNotMember {
            sede_id: sede_id.to_string(),
        })
    }
}

/// A franchise can only be removed once it holds no sites, so nothing is
/// ever left pointing at a dead franchise id.
fn check_no_member_sites(franchise: &Franchise) -> Result<(), FranchiseError> {
    if franchise.sedes.is_empty() {
        Ok(())
    } else {
        Err(FranchiseError::HasSites {
            count: franchise.sedes.len(),
        })
    }
}

pub struct FranchiseService {
    pool: PgPool,
}

impl FranchiseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, nombre: &str, actor: &str) -> Result<Franchise, FranchiseError> {
        let franquicia_id = ident::generate_id(&self.pool, Entity::Franquicia).await?;

        let franchise = sqlx::query_as::<_, Franchise>(
            r#"INSERT INTO franquicias (franquicia_id, nombre, sedes, creado_por, fecha_creacion)
               VALUES ($1, $2, '{}', $3, $4)
               RETURNING *"#,
        )
        .bind(&franquicia_id)
        .bind(nombre.trim())
        .bind(actor)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(franchise)
    }

    pub async fn list(&self) -> Result<Vec<Franchise>, FranchiseError> {
        let rows = sqlx::query_as::<_, Franchise>("SELECT * FROM franquicias ORDER BY nombre ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find(&self, franquicia_id: &str) -> Result<Franchise, FranchiseError> {
        sqlx::query_as::<_, Franchise>("SELECT * FROM franquicias WHERE franquicia_id = $1")
            .bind(franquicia_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FranchiseError::NotFound(franquicia_id.to_string()))
    }

    /// Detail view: the franchise document plus the full rows of its member sites.
    pub async fn detail(&self, franquicia_id: &str) -> Result<(Franchise, Vec<Site>), FranchiseError> {
        let franchise = self.find(franquicia_id).await?;

        let sites = sqlx::query_as::<_, Site>(
            "SELECT * FROM sedes WHERE sede_id = ANY($1) ORDER BY nombre ASC",
        )
        .bind(&franchise.sedes)
        .fetch_all(&self.pool)
        .await?;

        Ok((franchise, sites))
    }

    pub async fn rename(
        &self,
        franquicia_id: &str,
        nombre: &str,
        actor: &str,
    ) -> Result<Franchise, FranchiseError> {
        let franchise = sqlx::query_as::<_, Franchise>(
            r#"UPDATE franquicias
               SET nombre = $2, modificado_por = $3, fecha_modificacion = $4
               WHERE franquicia_id = $1
               RETURNING *"#,
        )
        .bind(franquicia_id)
        .bind(nombre.trim())
        .bind(actor)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FranchiseError::NotFound(franquicia_id.to_string()))?;

        Ok(franchise)
    }

    pub async fn delete(&self, franquicia_id: &str) -> Result<(), FranchiseError> {
        let franchise = self.find(franquicia_id).await?;
        check_no_member_sites(&franchise)?;

        sqlx::query("DELETE FROM franquicias WHERE franquicia_id = $1")
            .bind(franquicia_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Attach a site to a franchise and propagate the membership.
    ///
    /// Three writes in fixed order: the franchise's member list, the site's
    /// back-reference, then every account bound to the site. All three run in
    /// one transaction, so a failure never leaves a half-propagated
    /// membership.
    pub async fn assign_site(
        &self,
        franquicia_id: &str,
        sede_id: &str,
        actor: &str,
    ) -> Result<PropagationResult, FranchiseError> {
        self.find(franquicia_id).await?;

        let site = sqlx::query_as::<_, Site>("SELECT * FROM sedes WHERE sede_id = $1")
            .bind(sede_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FranchiseError::SiteNotFound(sede_id.to_string()))?;

        check_site_unclaimed(&site, franquicia_id)?;

        let mut tx = self.pool.begin().await?;

        // Write 1: add-if-absent on the member list, always stamping the audit fields
        sqlx::query(
            r#"UPDATE franquicias
               SET sedes = CASE WHEN $2 = ANY(sedes) THEN sedes ELSE array_append(sedes, $2) END,
                   modificado_por = $3, fecha_modificacion = $4
               WHERE franquicia_id = $1"#,
        )
        .bind(franquicia_id)
        .bind(sede_id)
        .bind(actor)
        .bind(Utc::now().naive_utc())
        .execute(&mut *tx)
        .await?;
        debug!(franquicia_id, sede_id, "assign: member list updated");

        // Write 2: back-reference on the site
        sqlx::query("UPDATE sedes SET franquicia_id = $1 WHERE sede_id = $2")
            .bind(franquicia_id)
            .bind(sede_id)
            .execute(&mut *tx)
            .await?;
        debug!(franquicia_id, sede_id, "assign: site back-reference set");

        // Write 3: bulk-tag every account bound to the site
        let result = sqlx::query("UPDATE cuentas SET franquicia_id = $1 WHERE sede_id = $2")
            .bind(franquicia_id)
            .bind(sede_id)
            .execute(&mut *tx)
            .await?;
        debug!(
            franquicia_id,
            sede_id,
            usuarios = result.rows_affected(),
            "assign: accounts tagged"
        );

        tx.commit().await?;

        Ok(PropagationResult {
            franquicia_id: franquicia_id.to_string(),
            sede_id: sede_id.to_string(),
            usuarios_afectados: result.rows_affected(),
        })
    }

    /// Detach a site and clear the membership everywhere the assign wrote it.
    /// Same transactional shape as [`FranchiseService::assign_site`].
    pub async fn unassign_site(
        &self,
        franquicia_id: &str,
        sede_id: &str,
        actor: &str,
    ) -> Result<PropagationResult, FranchiseError> {
        let franchise = self.find(franquicia_id).await?;
        check_site_member(&franchise, sede_id)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"UPDATE franquicias
               SET sedes = array_remove(sedes, $2), modificado_por = $3, fecha_modificacion = $4
               WHERE franquicia_id = $1"#,
        )
        .bind(franquicia_id)
        .bind(sede_id)
        .bind(actor)
        .bind(Utc::now().naive_utc())
        .execute(&mut *tx)
        .await?;
        debug!(franquicia_id, sede_id, "unassign: member list updated");

        sqlx::query("UPDATE sedes SET franquicia_id = NULL WHERE sede_id = $1")
            .bind(sede_id)
            .execute(&mut *tx)
            .await?;
        debug!(franquicia_id, sede_id, "unassign: site back-reference cleared");

        let result = sqlx::query("UPDATE cuentas SET franquicia_id = NULL WHERE sede_id = $1")
            .bind(sede_id)
            .execute(&mut *tx)
            .await?;
        debug!(
            franquicia_id,
            sede_id,
            usuarios = result.rows_affected(),
            "unassign: accounts untagged"
        );

        tx.commit().await?;

        Ok(PropagationResult {
            franquicia_id: franquicia_id.to_string(),
            sede_id: sede_id.to_string(),
            usuarios_afectados: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn site(sede_id: &str, franquicia_id: Option<&str>) -> Site {
        Site {
            id: Uuid::new_v4(),
            sede_id: sede_id.into(),
            nombre: "Sede Centro".into(),
            pais: "CO".into(),
            franquicia_id: franquicia_id.map(str::to_string),
        }
    }

    fn franchise(franquicia_id: &str, sedes: &[&str]) -> Franchise {
        Franchise {
            id: Uuid::new_v4(),
            franquicia_id: franquicia_id.into(),
            nombre: "Bella".into(),
            sedes: sedes.iter().map(|s| s.to_string()).collect(),
            creado_por: "admin@example.com".into(),
            fecha_creacion: Utc::now().naive_utc(),
            modificado_por: None,
            fecha_modificacion: None,
        }
    }

    #[test]
    fn unassigned_site_can_be_claimed() {
        assert!(check_site_unclaimed(&site("SD-000001", None), "FR-000001").is_ok());
    }

    #[test]
    fn reassigning_to_the_current_owner_is_not_a_conflict() {
        assert!(check_site_unclaimed(&site("SD-000001", Some("FR-000001")), "FR-000001").is_ok());
    }

    #[test]
    fn site_claimed_elsewhere_names_the_owner() {
        let err = check_site_unclaimed(&site("SD-000001", Some("FR-000002")), "FR-000001")
            .unwrap_err();
        match err {
            FranchiseError::SiteClaimed {
                sede_id,
                franquicia_id,
            } => {
                assert_eq!(sede_id, "SD-000001");
                assert_eq!(franquicia_id, "FR-000002");
            }
            other => panic!("expected SiteClaimed, got {other:?}"),
        }
    }

    #[test]
    fn unassigning_a_non_member_is_a_conflict() {
        let fr = franchise("FR-000001", &["SD-000001"]);
        assert!(check_site_member(&fr, "SD-000001").is_ok());

        let err = check_site_member(&fr, "SD-000002").unwrap_err();
        assert!(matches!(
            err,
            FranchiseError::SiteNotMember { sede_id } if sede_id == "SD-000002"
        ));
    }

    #[test]
    fn delete_is_blocked_while_sites_remain() {
        let err = check_no_member_sites(&franchise("FR-000001", &["SD-000001", "SD-000002"]))
            .unwrap_err();
        assert!(matches!(err, FranchiseError::HasSites { count: 2 }));

        assert!(check_no_member_sites(&franchise("FR-000001", &[])).is_ok());
    }

    #[test]
    fn assign_then_unassign_restores_the_preconditions() {
        // Simulate the membership round trip on the in-memory documents: a
        // claimed site is only assignable by its owner, and once unassigned
        // it is free for any franchise again
        let mut fr = franchise("FR-000001", &[]);
        let mut sd = site("SD-000001", None);

        check_site_unclaimed(&sd, &fr.franquicia_id).unwrap();
        fr.sedes.push(sd.sede_id.clone());
        sd.franquicia_id = Some(fr.franquicia_id.clone());

        assert!(matches!(
            check_site_unclaimed(&sd, "FR-000002"),
            Err(FranchiseError::SiteClaimed { .. })
        ));
        assert!(check_no_member_sites(&fr).is_err());

        check_site_member(&fr, &sd.sede_id).unwrap();
        fr.sedes.retain(|s| s != &sd.sede_id);
        sd.franquicia_id = None;

        assert!(check_site_unclaimed(&sd, "FR-000002").is_ok());
        assert!(check_no_member_sites(&fr).is_ok());
        assert!(check_site_member(&fr, &sd.sede_id).is_err());
    }
}
