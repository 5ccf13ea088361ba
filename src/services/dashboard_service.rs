use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;

use crate::analytics::{
    advisories_for, compute_period_metrics, data_quality, growth, Advisory, CurrencyMetrics,
    DataQuality, Period,
};
use crate::analytics::periods::{self, DateRange};
use crate::auth::{AuthUser, Role};
use crate::error::ApiError;

/// Which sites a dashboard query aggregates over
#[derive(Debug, Clone, PartialEq, Eq)]
enum SiteFilter {
    All,
    One(String),
    Franchise(String),
}

/// Per-currency metrics with the growth figure folded in for the response
#[derive(Debug, Serialize)]
pub struct CurrencyReport {
    #[serde(flatten)]
    pub metricas: CurrencyMetrics,
    pub crecimiento_ventas: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub periodo: String,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub dias: i64,
    pub sede_id: Option<String>,
    pub cantidad_ventas: usize,
    pub monedas_detectadas: Vec<String>,
    pub metricas_por_moneda: BTreeMap<String, CurrencyReport>,
    pub advertencias: Vec<Advisory>,
    pub calidad_datos: DataQuality,
}

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the sales dashboard for the caller's scope. Fetches the current
    /// and previous windows, aggregates per currency, and attaches growth
    /// and data-quality advisories.
    pub async fn sales_dashboard(
        &self,
        user: &AuthUser,
        period: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        sede_id: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<DashboardReport, ApiError> {
        let filter = self.resolve_site_filter(user, sede_id).await?;

        let period = Period::parse(period)?;
        let range = periods::resolve(period, start_date, end_date, now)?;
        let previous = range.previous();

        let current_sales = self.fetch_sales(&filter, &range).await?;
        let previous_sales = self.fetch_sales(&filter, &previous).await?;
        debug!(
            current = current_sales.len(),
            previous = previous_sales.len(),
            dias = range.days(),
            "dashboard windows fetched"
        );

        let current_metrics = compute_period_metrics(&current_sales);
        let previous_metrics = compute_period_metrics(&previous_sales);
        let growths = growth(&current_metrics, &previous_metrics);

        let advertencias = advisories_for(current_sales.len(), range.days());
        let calidad_datos = data_quality(&advertencias);

        let monedas_detectadas: Vec<String> = current_metrics.keys().cloned().collect();
        let metricas_por_moneda = current_metrics
            .into_iter()
            .map(|(moneda, metricas)| {
                let crecimiento = growths
                    .get(&moneda)
                    .map(|g| g.formatted())
                    .unwrap_or_else(|| "0.0%".to_string());
                (
                    moneda,
                    CurrencyReport {
                        metricas,
                        crecimiento_ventas: crecimiento,
                    },
                )
            })
            .collect();

        Ok(DashboardReport {
            periodo: period_label(period),
            fecha_inicio: range.start.format("%d-%m-%Y").to_string(),
            fecha_fin: range.end.format("%d-%m-%Y").to_string(),
            dias: range.days(),
            sede_id: match &filter {
                SiteFilter::One(sede) => Some(sede.clone()),
                _ => None,
            },
            cantidad_ventas: current_sales.len(),
            monedas_detectadas,
            metricas_por_moneda,
            advertencias,
            calidad_datos,
        })
    }

    /// Pin the aggregation to the sites the caller may see. An admin_sede is
    /// always pinned to their own site and may not ask for another one; an
    /// admin_franquicia defaults to their franchise's sites but may pass any
    /// explicit site.
    async fn resolve_site_filter(
        &self,
        user: &AuthUser,
        requested: Option<&str>,
    ) -> Result<SiteFilter, ApiError> {
        if !user.rol.can_view_dashboard() {
            return Err(ApiError::forbidden(
                "No tienes permisos para ver el dashboard",
            ));
        }

        match user.rol {
            Role::SuperAdmin => Ok(match requested {
                Some(sede) => SiteFilter::One(sede.to_string()),
                None => SiteFilter::All,
            }),
            Role::AdminFranquicia => match requested {
                Some(sede) => Ok(SiteFilter::One(sede.to_string())),
                None => {
                    let franquicia = user.franquicia_id.clone().ok_or_else(|| {
                        ApiError::forbidden("El administrador no tiene franquicia asignada")
                    })?;
                    Ok(SiteFilter::Franchise(franquicia))
                }
            },
            Role::AdminSede => {
                let own = user.sede_id.clone().ok_or_else(|| {
                    ApiError::forbidden("El administrador no tiene sede asignada")
                })?;
                if let Some(sede) = requested {
                    if sede != own {
                        return Err(ApiError::forbidden(
                            "Solo puedes consultar el dashboard de tu propia sede",
                        ));
                    }
                }
                Ok(SiteFilter::One(own))
            }
            Role::Estilista => Err(ApiError::forbidden(
                "No tienes permisos para ver el dashboard",
            )),
        }
    }

    async fn fetch_sales(
        &self,
        filter: &SiteFilter,
        range: &DateRange,
    ) -> Result<Vec<crate::database::models::Sale>, ApiError> {
        let mut sql =
            String::from("SELECT * FROM ventas WHERE fecha_pago >= $1 AND fecha_pago <= $2");
        let mut extra: Option<&str> = None;

        match filter {
            SiteFilter::All => {}
            SiteFilter::One(sede) => {
                sql.push_str(" AND sede_id = $3");
                extra = Some(sede);
            }
            SiteFilter::Franchise(franquicia) => {
                sql.push_str(
                    " AND sede_id IN (SELECT sede_id FROM sedes WHERE franquicia_id = $3)",
                );
                extra = Some(franquicia);
            }
        }

        let mut query = sqlx::query_as::<_, crate::database::models::Sale>(&sql)
            .bind(range.start)
            .bind(range.end);
        if let Some(s) = extra {
            query = query.bind(s);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

fn period_label(period: Period) -> String {
    match period {
        Period::Today => "today",
        Period::Last7Days => "last_7_days",
        Period::Last30Days => "last_30_days",
        Period::Month => "month",
        Period::Custom => "custom",
    }
    .to_string()
}
