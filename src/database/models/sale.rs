use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Line item kind. Unknown kinds deserialize as `Otro` and are excluded from
/// the service/product split; an absent kind defaults to `Servicio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Servicio,
    Producto,
    #[serde(other)]
    Otro,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    #[serde(default)]
    pub tipo: ItemKind,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
}

/// Payment methods tracked in the breakdown object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Tarjeta,
    TarjetaCredito,
    TarjetaDebito,
    LinkDePago,
    Giftcard,
    Addi,
    Abonos,
    Otros,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 10] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Transferencia,
        PaymentMethod::Tarjeta,
        PaymentMethod::TarjetaCredito,
        PaymentMethod::TarjetaDebito,
        PaymentMethod::LinkDePago,
        PaymentMethod::Giftcard,
        PaymentMethod::Addi,
        PaymentMethod::Abonos,
        PaymentMethod::Otros,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Transferencia => "transferencia",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::TarjetaCredito => "tarjeta_credito",
            PaymentMethod::TarjetaDebito => "tarjeta_debito",
            PaymentMethod::LinkDePago => "link_de_pago",
            PaymentMethod::Giftcard => "giftcard",
            PaymentMethod::Addi => "addi",
            PaymentMethod::Abonos => "abonos",
            PaymentMethod::Otros => "otros",
        }
    }
}

/// Payment breakdown recorded at sale time. `total` is the authoritative
/// amount of money that actually entered; it may legitimately differ from the
/// sum of line-item subtotals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub efectivo: f64,
    #[serde(default)]
    pub transferencia: f64,
    #[serde(default)]
    pub tarjeta: f64,
    #[serde(default)]
    pub tarjeta_credito: f64,
    #[serde(default)]
    pub tarjeta_debito: f64,
    #[serde(default)]
    pub link_de_pago: f64,
    #[serde(default)]
    pub giftcard: f64,
    #[serde(default)]
    pub addi: f64,
    #[serde(default)]
    pub abonos: f64,
    #[serde(default)]
    pub otros: f64,
}

impl PaymentBreakdown {
    pub fn amount(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::Efectivo => self.efectivo,
            PaymentMethod::Transferencia => self.transferencia,
            PaymentMethod::Tarjeta => self.tarjeta,
            PaymentMethod::TarjetaCredito => self.tarjeta_credito,
            PaymentMethod::TarjetaDebito => self.tarjeta_debito,
            PaymentMethod::LinkDePago => self.link_de_pago,
            PaymentMethod::Giftcard => self.giftcard,
            PaymentMethod::Addi => self.addi,
            PaymentMethod::Abonos => self.abonos,
            PaymentMethod::Otros => self.otros,
        }
    }
}

/// Paid sale record. Sales are immutable inputs to aggregation; this core
/// never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub venta_id: String,
    pub sede_id: String,
    pub moneda: String,
    pub fecha_pago: NaiveDateTime,
    pub items: Json<Vec<SaleItem>>,
    pub desglose_pagos: Json<PaymentBreakdown>,
}
