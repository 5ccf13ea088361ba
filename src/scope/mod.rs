//! Franchise-scoped visibility.
//!
//! Every read over clients or catalog services goes through a [`Visibility`]
//! derived from the caller's role and site binding. The predicate it renders
//! is a disjunction of up to three branches: records with no scope tag
//! (global), records tagged with the caller's site (local), and records
//! tagged with the caller's franchise (franchise-wide). The global branch is
//! unconditional: global visibility must never require a franchise to exist.

use serde_json::{json, Value};
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::{AuthUser, Role};

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("User has no assigned site")]
    MissingSite,

    #[error("User has no assigned franchise")]
    MissingFranchise,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Look up the franchise a site belongs to. Absent site and untagged site
/// both resolve to `None`; callers treat them identically.
pub async fn franchise_of(pool: &PgPool, sede_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT franquicia_id FROM sedes WHERE sede_id = $1")
            .bind(sede_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(franquicia,)| franquicia))
}

/// Column names the predicate renders against. Both clients and catalog
/// services use the default pair.
#[derive(Debug, Clone, Copy)]
pub struct ScopeColumns {
    pub sede: &'static str,
    pub franquicia: &'static str,
}

impl Default for ScopeColumns {
    fn default() -> Self {
        Self {
            sede: "sede_id",
            franquicia: "franquicia_id",
        }
    }
}

/// Resolved visibility scope of a caller, per the fixed role policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// super_admin: no predicate
    Unrestricted,
    /// admin_franquicia: global records plus the franchise's records, no
    /// site restriction
    Franchise(String),
    /// admin_sede / estilista: global records, the site's own records, and
    /// (when the site carries a franchise tag) the franchise's records
    Site {
        sede_id: String,
        franquicia_id: Option<String>,
    },
}

impl Visibility {
    /// Derive visibility from already-resolved bindings. Pure counterpart of
    /// [`Visibility::for_user`].
    pub fn from_parts(
        rol: Role,
        sede_id: Option<String>,
        franquicia_id: Option<String>,
    ) -> Result<Visibility, ScopeError> {
        match rol {
            Role::SuperAdmin => Ok(Visibility::Unrestricted),
            Role::AdminFranquicia => franquicia_id
                .map(Visibility::Franchise)
                .ok_or(ScopeError::MissingFranchise),
            Role::AdminSede | Role::Estilista => {
                let sede_id = sede_id.ok_or(ScopeError::MissingSite)?;
                Ok(Visibility::Site {
                    sede_id,
                    franquicia_id,
                })
            }
        }
    }

    /// Derive visibility for the authenticated caller. The franchise binding
    /// comes from the token when present, otherwise from a single site
    /// lookup (identity resolver).
    pub async fn for_user(pool: &PgPool, user: &AuthUser) -> Result<Visibility, ScopeError> {
        let franquicia_id = match (&user.rol, &user.franquicia_id, &user.sede_id) {
            (Role::SuperAdmin, ..) => None,
            (_, Some(franquicia), _) => Some(franquicia.clone()),
            (_, None, Some(sede)) => franchise_of(pool, sede).await?,
            (_, None, None) => None,
        };

        Self::from_parts(user.rol, user.sede_id.clone(), franquicia_id)
    }

    /// Render the scope predicate as a SQL fragment with numbered bind
    /// params starting at `start_param`. Returns the fragment and the param
    /// values in bind order. A record matching several branches is still a
    /// single row: one WHERE disjunction, set semantics for free.
    pub fn predicate(&self, start_param: usize) -> (String, Vec<Value>) {
        self.predicate_with(&ScopeColumns::default(), start_param)
    }

    pub fn predicate_with(&self, cols: &ScopeColumns, start_param: usize) -> (String, Vec<Value>) {
        match self {
            Visibility::Unrestricted => ("1=1".to_string(), vec![]),
            Visibility::Franchise(franquicia) => (
                format!(
                    "(\"{col}\" IS NULL OR \"{col}\" = ${n})",
                    col = cols.franquicia,
                    n = start_param
                ),
                vec![json!(franquicia)],
            ),
            Visibility::Site {
                sede_id,
                franquicia_id,
            } => {
                let mut sql = format!(
                    "(\"{sede}\" IS NULL OR \"{sede}\" = ${n}",
                    sede = cols.sede,
                    n = start_param
                );
                let mut params = vec![json!(sede_id)];

                // Franchise-wide visibility is additive: only present when
                // the caller's site actually carries a franchise tag
                if let Some(franquicia) = franquicia_id {
                    sql.push_str(&format!(
                        " OR \"{col}\" = ${n}",
                        col = cols.franquicia,
                        n = start_param + 1
                    ));
                    params.push(json!(franquicia));
                }

                sql.push(')');
                (sql, params)
            }
        }
    }

    /// Next free param index after this predicate's binds
    pub fn next_param(&self, start_param: usize) -> usize {
        start_param + self.param_count()
    }

    fn param_count(&self) -> usize {
        match self {
            Visibility::Unrestricted => 0,
            Visibility::Franchise(_) => 1,
            Visibility::Site { franquicia_id, .. } => {
                if franquicia_id.is_some() {
                    2
                } else {
                    1
                }
            }
        }
    }
}
