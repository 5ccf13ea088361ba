use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Commission lifecycle. `liquidada` is terminal; no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionState {
    Pendiente,
    Liquidada,
}

impl CommissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionState::Pendiente => "pendiente",
            CommissionState::Liquidada => "liquidada",
        }
    }

    pub fn parse(s: &str) -> Option<CommissionState> {
        match s {
            "pendiente" => Some(CommissionState::Pendiente),
            "liquidada" => Some(CommissionState::Liquidada),
            _ => None,
        }
    }
}

/// Commission basis configured per site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionKind {
    Servicios,
    Productos,
    Mixto,
}

impl CommissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionKind::Servicios => "servicios",
            CommissionKind::Productos => "productos",
            CommissionKind::Mixto => "mixto",
        }
    }

    pub fn parse(s: &str) -> Option<CommissionKind> {
        match s {
            "servicios" => Some(CommissionKind::Servicios),
            "productos" => Some(CommissionKind::Productos),
            "mixto" => Some(CommissionKind::Mixto),
            _ => None,
        }
    }
}

/// Per-service detail inside a commission: the service's own commission,
/// the commission on products sold alongside it, and their sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionLine {
    pub servicio_id: String,
    pub servicio_nombre: String,
    pub valor_servicio: f64,
    pub porcentaje: f64,
    pub valor_comision_servicio: f64,
    #[serde(default)]
    pub valor_comision_productos: f64,
    pub valor_comision_total: f64,
    pub fecha: String,
    #[serde(default)]
    pub numero_comprobante: Option<String>,
}

/// Computed payout record for a professional over a period
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commission {
    pub id: Uuid,
    pub comision_id: String,
    pub profesional_id: String,
    pub profesional_nombre: String,
    pub sede_id: String,
    pub moneda: String,
    pub tipo_comision: String,
    pub total_servicios: i32,
    pub total_comisiones: f64,
    pub servicios_detalle: Json<Vec<CommissionLine>>,
    pub periodo_inicio: String,
    pub periodo_fin: String,
    pub estado: String,
    pub creado_en: NaiveDateTime,
    pub liquidada_por: Option<String>,
    pub liquidada_en: Option<NaiveDateTime>,
}

impl Commission {
    /// Sum of service-side commissions across the detail lines
    pub fn total_comisiones_servicios(&self) -> f64 {
        self.servicios_detalle
            .iter()
            .map(|l| l.valor_comision_servicio)
            .sum()
    }

    /// Sum of product-side commissions across the detail lines
    pub fn total_comisiones_productos(&self) -> f64 {
        self.servicios_detalle
            .iter()
            .map(|l| l.valor_comision_productos)
            .sum()
    }
}
