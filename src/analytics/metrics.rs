use std::collections::BTreeMap;

use serde::Serialize;

use crate::database::models::{ItemKind, PaymentMethod, Sale};

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Financial metrics for one currency over one period.
///
/// `ventas_totales` comes from the payment breakdown's `total` field, never
/// from summing line items; the two may legitimately differ. The
/// service/product split comes from item subtotals. `metodos_pago` is
/// sparse: a method that collected nothing is absent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CurrencyMetrics {
    pub ventas_totales: f64,
    pub cantidad_ventas: u64,
    pub ticket_promedio: f64,
    pub ventas_servicios: f64,
    pub ventas_productos: f64,
    pub metodos_pago: BTreeMap<&'static str, f64>,
}

/// Accumulate per-currency metrics over a window of sales. Keyed by currency
/// code; only currencies with sales appear. Record order does not affect the
/// result.
pub fn compute_period_metrics(sales: &[Sale]) -> BTreeMap<String, CurrencyMetrics> {
    let mut by_currency: BTreeMap<String, CurrencyMetrics> = BTreeMap::new();

    for sale in sales {
        let metrics = by_currency.entry(sale.moneda.clone()).or_default();

        metrics.ventas_totales += sale.desglose_pagos.total;
        metrics.cantidad_ventas += 1;

        for item in sale.items.iter() {
            match item.tipo {
                ItemKind::Servicio => metrics.ventas_servicios += item.subtotal,
                ItemKind::Producto => metrics.ventas_productos += item.subtotal,
                ItemKind::Otro => {}
            }
        }

        for method in PaymentMethod::ALL {
            let valor = sale.desglose_pagos.amount(method);
            if valor > 0.0 {
                *metrics.metodos_pago.entry(method.as_str()).or_insert(0.0) += valor;
            }
        }
    }

    for metrics in by_currency.values_mut() {
        metrics.ticket_promedio = if metrics.cantidad_ventas > 0 {
            round2(metrics.ventas_totales / metrics.cantidad_ventas as f64)
        } else {
            0.0
        };

        metrics.ventas_totales = round2(metrics.ventas_totales);
        metrics.ventas_servicios = round2(metrics.ventas_servicios);
        metrics.ventas_productos = round2(metrics.ventas_productos);

        // Sparse output: keep only methods that actually collected money
        metrics.metodos_pago = metrics
            .metodos_pago
            .iter()
            .map(|(k, v)| (*k, round2(*v)))
            .filter(|(_, v)| *v != 0.0)
            .collect();
    }

    by_currency
}

/// Period-over-period growth for one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Growth {
    pub ventas: f64,
    pub prefijo: &'static str,
}

impl Growth {
    /// Display form, e.g. "+100.0%" or "-12.5%"
    pub fn formatted(&self) -> String {
        format!("{}{:.1}%", self.prefijo, self.ventas)
    }
}

/// Growth percentage vs the previous period, per currency in `current`.
/// A currency with no prior data has a zero baseline: growth is 100% when
/// the current period sold anything, 0% otherwise. Never an error.
pub fn growth(
    current: &BTreeMap<String, CurrencyMetrics>,
    previous: &BTreeMap<String, CurrencyMetrics>,
) -> BTreeMap<String, Growth> {
    let mut growths = BTreeMap::new();

    for (moneda, datos) in current {
        let ventas_actual = datos.ventas_totales;
        let ventas_anterior = previous
            .get(moneda)
            .map(|m| m.ventas_totales)
            .unwrap_or(0.0);

        let crecimiento = if ventas_anterior > 0.0 {
            round1((ventas_actual - ventas_anterior) / ventas_anterior * 100.0)
        } else if ventas_actual > 0.0 {
            100.0
        } else {
            0.0
        };

        growths.insert(
            moneda.clone(),
            Growth {
                ventas: crecimiento,
                prefijo: if crecimiento > 0.0 { "+" } else { "" },
            },
        );
    }

    growths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{PaymentBreakdown, SaleItem};
    use chrono::NaiveDate;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn sale(moneda: &str, total: f64, items: Vec<SaleItem>, breakdown: PaymentBreakdown) -> Sale {
        let mut desglose = breakdown;
        desglose.total = total;
        Sale {
            id: Uuid::new_v4(),
            venta_id: "VT-000001".to_string(),
            sede_id: "SD-000001".to_string(),
            moneda: moneda.to_string(),
            fecha_pago: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            items: Json(items),
            desglose_pagos: Json(desglose),
        }
    }

    fn item(tipo: ItemKind, subtotal: f64) -> SaleItem {
        SaleItem {
            tipo,
            descripcion: None,
            subtotal,
        }
    }

    #[test]
    fn totals_come_from_breakdown_not_item_sum() {
        // Items sum to 80 but the breakdown says 100 entered the till
        let sales = vec![sale(
            "COP",
            100.0,
            vec![item(ItemKind::Servicio, 50.0), item(ItemKind::Producto, 30.0)],
            PaymentBreakdown {
                efectivo: 100.0,
                ..Default::default()
            },
        )];

        let metrics = compute_period_metrics(&sales);
        let cop = &metrics["COP"];
        assert_eq!(cop.ventas_totales, 100.0);
        assert_eq!(cop.ventas_servicios, 50.0);
        assert_eq!(cop.ventas_productos, 30.0);
        assert_eq!(cop.cantidad_ventas, 1);
        assert_eq!(cop.ticket_promedio, 100.0);
    }

    #[test]
    fn currencies_bucket_independently() {
        let sales = vec![
            sale("COP", 100.0, vec![], Default::default()),
            sale("USD", 40.0, vec![], Default::default()),
            sale("COP", 60.0, vec![], Default::default()),
        ];

        let metrics = compute_period_metrics(&sales);
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["COP"].ventas_totales, 160.0);
        assert_eq!(metrics["COP"].cantidad_ventas, 2);
        assert_eq!(metrics["COP"].ticket_promedio, 80.0);
        assert_eq!(metrics["USD"].ventas_totales, 40.0);
    }

    #[test]
    fn zero_valued_payment_methods_are_dropped() {
        let sales = vec![sale(
            "COP",
            100.0,
            vec![],
            PaymentBreakdown {
                efectivo: 70.0,
                transferencia: 30.0,
                ..Default::default()
            },
        )];

        let metrics = compute_period_metrics(&sales);
        let metodos = &metrics["COP"].metodos_pago;
        assert_eq!(metodos.len(), 2);
        assert_eq!(metodos["efectivo"], 70.0);
        assert_eq!(metodos["transferencia"], 30.0);
        assert!(!metodos.contains_key("giftcard"));
    }

    #[test]
    fn negative_method_amounts_are_ignored() {
        let sales = vec![sale(
            "COP",
            100.0,
            vec![],
            PaymentBreakdown {
                efectivo: 100.0,
                otros: -15.0,
                ..Default::default()
            },
        )];

        let metrics = compute_period_metrics(&sales);
        assert!(!metrics["COP"].metodos_pago.contains_key("otros"));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut sales = vec![
            sale(
                "COP",
                120.5,
                vec![item(ItemKind::Servicio, 80.25), item(ItemKind::Producto, 40.25)],
                PaymentBreakdown {
                    efectivo: 120.5,
                    ..Default::default()
                },
            ),
            sale(
                "USD",
                35.75,
                vec![item(ItemKind::Servicio, 35.75)],
                PaymentBreakdown {
                    tarjeta: 35.75,
                    ..Default::default()
                },
            ),
            sale(
                "COP",
                89.25,
                vec![item(ItemKind::Producto, 89.25)],
                PaymentBreakdown {
                    transferencia: 89.25,
                    ..Default::default()
                },
            ),
        ];

        let forward = compute_period_metrics(&sales);
        sales.reverse();
        let backward = compute_period_metrics(&sales);
        assert_eq!(forward, backward);
    }

    fn metrics_with_total(total: f64) -> BTreeMap<String, CurrencyMetrics> {
        let mut map = BTreeMap::new();
        map.insert(
            "COP".to_string(),
            CurrencyMetrics {
                ventas_totales: total,
                cantidad_ventas: if total > 0.0 { 1 } else { 0 },
                ..Default::default()
            },
        );
        map
    }

    #[test]
    fn growth_doubles_to_plus_100() {
        let g = growth(&metrics_with_total(1000.0), &metrics_with_total(500.0));
        assert_eq!(g["COP"].formatted(), "+100.0%");
    }

    #[test]
    fn growth_from_zero_baseline_is_100_when_selling() {
        let g = growth(&metrics_with_total(250.0), &metrics_with_total(0.0));
        assert_eq!(g["COP"].formatted(), "+100.0%");

        // Currency absent from the previous period entirely
        let g = growth(&metrics_with_total(250.0), &BTreeMap::new());
        assert_eq!(g["COP"].formatted(), "+100.0%");
    }

    #[test]
    fn growth_with_nothing_sold_anywhere_is_zero() {
        let g = growth(&metrics_with_total(0.0), &metrics_with_total(0.0));
        assert_eq!(g["COP"].formatted(), "0.0%");
    }

    #[test]
    fn negative_growth_has_no_plus_prefix() {
        let g = growth(&metrics_with_total(400.0), &metrics_with_total(500.0));
        assert_eq!(g["COP"].formatted(), "-20.0%");
    }
}
