use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use thiserror::Error;

use crate::analytics::metrics::round2;
use crate::auth::{AuthUser, Role};
use crate::database::bind_value_as;
use crate::database::manager::DatabaseError;
use crate::database::models::{Commission, CommissionKind, CommissionState};
use crate::scope;

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Comision no encontrada: {0}")]
    NotFound(String),

    #[error("La comision {0} ya fue liquidada")]
    AlreadySettled(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Default)]
pub struct CommissionFilters {
    pub profesional_id: Option<String>,
    pub sede_id: Option<String>,
    pub estado: Option<CommissionState>,
    pub tipo_comision: Option<CommissionKind>,
}

/// Which commissions a caller may touch. Commission rows are always
/// site-bound, so the franchise case resolves through the owning site's tag
/// rather than a tag on the row itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionScope {
    All,
    Franchise(String),
    Site(String),
}

impl CommissionScope {
    /// Derive the scope from the caller's role and bindings. A missing
    /// binding is rejected, never widened to a broader scope.
    pub fn for_user(user: &AuthUser) -> Result<CommissionScope, CommissionError> {
        match user.rol {
            Role::SuperAdmin => Ok(CommissionScope::All),
            Role::AdminFranquicia => user
                .franquicia_id
                .clone()
                .map(CommissionScope::Franchise)
                .ok_or_else(|| {
                    CommissionError::Forbidden(
                        "El administrador no tiene franquicia asignada".into(),
                    )
                }),
            Role::AdminSede | Role::Estilista => user
                .sede_id
                .clone()
                .map(CommissionScope::Site)
                .ok_or_else(|| {
                    CommissionError::Forbidden("El usuario no tiene sede asignada".into())
                }),
        }
    }

    /// Record-level check, given the franchise tag of the commission's site
    pub fn allows(&self, sede_id: &str, site_franquicia: Option<&str>) -> bool {
        match self {
            CommissionScope::All => true,
            CommissionScope::Franchise(franquicia) => site_franquicia == Some(franquicia.as_str()),
            CommissionScope::Site(own) => sede_id == own,
        }
    }
}

/// Service/product split of a commission with each side's share of the total
#[derive(Debug, Serialize)]
pub struct CommissionSummary {
    pub comision_id: String,
    pub profesional_id: String,
    pub moneda: String,
    pub total_comisiones: f64,
    pub comisiones_servicios: f64,
    pub comisiones_productos: f64,
    pub porcentaje_servicios: f64,
    pub porcentaje_productos: f64,
}

pub fn summarize(commission: &Commission) -> CommissionSummary {
    let servicios = round2(commission.total_comisiones_servicios());
    let productos = round2(commission.total_comisiones_productos());
    let total = commission.total_comisiones;

    let (pct_servicios, pct_productos) = if total > 0.0 {
        (
            round2(servicios / total * 100.0),
            round2(productos / total * 100.0),
        )
    } else {
        (0.0, 0.0)
    };

    CommissionSummary {
        comision_id: commission.comision_id.clone(),
        profesional_id: commission.profesional_id.clone(),
        moneda: commission.moneda.clone(),
        total_comisiones: total,
        comisiones_servicios: servicios,
        comisiones_productos: productos,
        porcentaje_servicios: pct_servicios,
        porcentaje_productos: pct_productos,
    }
}

pub struct CommissionService {
    pool: PgPool,
}

impl CommissionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Scoped listing. The caller's scope is always applied as a predicate;
    /// an explicit site filter can only narrow it, and a site-bound caller
    /// asking for another site is rejected outright. A stylist additionally
    /// only sees their own records.
    pub async fn list(
        &self,
        user: &AuthUser,
        filters: CommissionFilters,
    ) -> Result<Vec<Commission>, CommissionError> {
        let scope = CommissionScope::for_user(user)?;

        let mut sql = String::from("SELECT * FROM comisiones WHERE 1=1");
        let mut params: Vec<Value> = Vec::new();

        match &scope {
            CommissionScope::All => {
                if let Some(sede_id) = &filters.sede_id {
                    params.push(json!(sede_id));
                    sql.push_str(&format!(" AND sede_id = ${}", params.len()));
                }
            }
            CommissionScope::Franchise(franquicia) => {
                if let Some(sede_id) = &filters.sede_id {
                    params.push(json!(sede_id));
                    sql.push_str(&format!(" AND sede_id = ${}", params.len()));
                }
                params.push(json!(franquicia));
                sql.push_str(&format!(
                    " AND sede_id IN (SELECT sede_id FROM sedes WHERE franquicia_id = ${})",
                    params.len()
                ));
            }
            CommissionScope::Site(own) => {
                if let Some(requested) = &filters.sede_id {
                    if requested != own {
                        return Err(CommissionError::Forbidden(
                            "Solo puedes consultar comisiones de tu propia sede".into(),
                        ));
                    }
                }
                params.push(json!(own));
                sql.push_str(&format!(" AND sede_id = ${}", params.len()));
            }
        }

        let profesional_id = if user.rol == Role::Estilista {
            Some(user.email.clone())
        } else {
            filters.profesional_id
        };
        if let Some(profesional_id) = &profesional_id {
            params.push(json!(profesional_id));
            sql.push_str(&format!(" AND profesional_id = ${}", params.len()));
        }
        if let Some(estado) = filters.estado {
            params.push(json!(estado.as_str()));
            sql.push_str(&format!(" AND estado = ${}", params.len()));
        }
        if let Some(tipo) = filters.tipo_comision {
            params.push(json!(tipo.as_str()));
            sql.push_str(&format!(" AND tipo_comision = ${}", params.len()));
        }

        sql.push_str(" ORDER BY creado_en DESC");

        let mut query = sqlx::query_as::<_, Commission>(&sql);
        for param in &params {
            query = bind_value_as(query, param);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn get(
        &self,
        user: &AuthUser,
        comision_id: &str,
    ) -> Result<Commission, CommissionError> {
        let commission = self.find(comision_id).await?;
        self.check_access(user, &commission).await?;
        Ok(commission)
    }

    /// Settle a pending commission within the caller's scope. Settlement is
    /// terminal: settling twice is a conflict, never a silent no-op.
    pub async fn settle(
        &self,
        user: &AuthUser,
        comision_id: &str,
    ) -> Result<Commission, CommissionError> {
        let commission = self.find(comision_id).await?;
        self.check_access(user, &commission).await?;

        if commission.estado == CommissionState::Liquidada.as_str() {
            return Err(CommissionError::AlreadySettled(comision_id.to_string()));
        }

        let settled = sqlx::query_as::<_, Commission>(
            r#"UPDATE comisiones
               SET estado = $2, liquidada_por = $3, liquidada_en = $4
               WHERE comision_id = $1
               RETURNING *"#,
        )
        .bind(comision_id)
        .bind(CommissionState::Liquidada.as_str())
        .bind(&user.email)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(settled)
    }

    async fn find(&self, comision_id: &str) -> Result<Commission, CommissionError> {
        sqlx::query_as::<_, Commission>("SELECT * FROM comisiones WHERE comision_id = $1")
            .bind(comision_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CommissionError::NotFound(comision_id.to_string()))
    }

    async fn check_access(
        &self,
        user: &AuthUser,
        commission: &Commission,
    ) -> Result<(), CommissionError> {
        let scope = CommissionScope::for_user(user)?;

        // The franchise case needs the owning site's tag; the others decide
        // on the row alone
        let site_franquicia = match &scope {
            CommissionScope::Franchise(_) => {
                scope::franchise_of(&self.pool, &commission.sede_id).await?
            }
            _ => None,
        };

        if !scope.allows(&commission.sede_id, site_franquicia.as_deref()) {
            return Err(CommissionError::Forbidden(
                "No tienes acceso a esta comision".into(),
            ));
        }
        if user.rol == Role::Estilista && commission.profesional_id != user.email {
            return Err(CommissionError::Forbidden(
                "No tienes acceso a esta comision".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CommissionLine;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn user(rol: Role, sede: Option<&str>, franquicia: Option<&str>) -> AuthUser {
        AuthUser {
            email: "laura@example.com".into(),
            rol,
            sede_id: sede.map(str::to_string),
            franquicia_id: franquicia.map(str::to_string),
        }
    }

    #[test]
    fn scope_follows_role_and_binding() {
        assert_eq!(
            CommissionScope::for_user(&user(Role::SuperAdmin, None, None)).unwrap(),
            CommissionScope::All
        );
        assert_eq!(
            CommissionScope::for_user(&user(Role::AdminFranquicia, None, Some("FR-1"))).unwrap(),
            CommissionScope::Franchise("FR-1".into())
        );
        assert_eq!(
            CommissionScope::for_user(&user(Role::Estilista, Some("SD-1"), None)).unwrap(),
            CommissionScope::Site("SD-1".into())
        );
    }

    #[test]
    fn missing_binding_is_forbidden_not_widened() {
        // A franchise admin with no franchise must not fall through to an
        // unfiltered listing
        assert!(matches!(
            CommissionScope::for_user(&user(Role::AdminFranquicia, None, None)),
            Err(CommissionError::Forbidden(_))
        ));
        assert!(matches!(
            CommissionScope::for_user(&user(Role::AdminSede, None, None)),
            Err(CommissionError::Forbidden(_))
        ));
        assert!(matches!(
            CommissionScope::for_user(&user(Role::Estilista, None, Some("FR-1"))),
            Err(CommissionError::Forbidden(_))
        ));
    }

    #[test]
    fn franchise_scope_decides_through_the_sites_tag() {
        let scope = CommissionScope::Franchise("FR-1".into());
        assert!(scope.allows("SD-2", Some("FR-1")));
        assert!(!scope.allows("SD-2", Some("FR-2")));
        // Unassigned site: tag absent, not "global"
        assert!(!scope.allows("SD-2", None));
    }

    #[test]
    fn site_scope_is_an_exact_pin() {
        let scope = CommissionScope::Site("SD-1".into());
        assert!(scope.allows("SD-1", None));
        assert!(!scope.allows("SD-2", Some("FR-1")));
    }

    fn line(servicio: f64, productos: f64) -> CommissionLine {
        CommissionLine {
            servicio_id: "SV-000001".into(),
            servicio_nombre: "Corte".into(),
            valor_servicio: servicio * 2.0,
            porcentaje: 50.0,
            valor_comision_servicio: servicio,
            valor_comision_productos: productos,
            valor_comision_total: servicio + productos,
            fecha: "01-06-2026".into(),
            numero_comprobante: None,
        }
    }

    fn commission(lines: Vec<CommissionLine>, total: f64) -> Commission {
        Commission {
            id: Uuid::new_v4(),
            comision_id: "CM-000001".into(),
            profesional_id: "estilista@x".into(),
            profesional_nombre: "Laura".into(),
            sede_id: "SD-1".into(),
            moneda: "COP".into(),
            tipo_comision: "mixto".into(),
            total_servicios: lines.len() as i32,
            total_comisiones: total,
            servicios_detalle: Json(lines),
            periodo_inicio: "01-06-2026".into(),
            periodo_fin: "15-06-2026".into(),
            estado: "pendiente".into(),
            creado_en: Utc::now().naive_utc(),
            liquidada_por: None,
            liquidada_en: None,
        }
    }

    #[test]
    fn splits_sides_and_percentages() {
        let c = commission(vec![line(60.0, 20.0), line(15.0, 5.0)], 100.0);
        let s = summarize(&c);
        assert_eq!(s.comisiones_servicios, 75.0);
        assert_eq!(s.comisiones_productos, 25.0);
        assert_eq!(s.porcentaje_servicios, 75.0);
        assert_eq!(s.porcentaje_productos, 25.0);
    }

    #[test]
    fn zero_total_yields_zero_percentages() {
        let c = commission(vec![], 0.0);
        let s = summarize(&c);
        assert_eq!(s.porcentaje_servicios, 0.0);
        assert_eq!(s.porcentaje_productos, 0.0);
    }
}
