use serde::Serialize;

/// Advisory severity, ordered so the worst can be taken with `max()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    #[serde(rename = "BAJA")]
    Low,
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "CRÍTICA")]
    Critical,
}

/// Informational data-quality advisory attached to aggregation output.
/// Advisories never block the response.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub tipo: &'static str,
    pub severidad: Severity,
    pub mensaje: String,
    pub recomendacion: &'static str,
}

/// Overall quality label derived from the worst advisory severity.
/// Low-severity advisories alone do not degrade the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataQuality {
    #[serde(rename = "SIN_DATOS")]
    NoData,
    #[serde(rename = "BAJA")]
    Poor,
    #[serde(rename = "MEDIA")]
    Fair,
    #[serde(rename = "BUENA")]
    Good,
}

/// Build the advisory list for a period's sales
pub fn advisories_for(sales_count: usize, period_days: i64) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    if sales_count == 0 {
        advisories.push(Advisory {
            tipo: "SIN_VENTAS",
            severidad: Severity::Critical,
            mensaje: "No hay ventas registradas en este período".to_string(),
            recomendacion: "Verifique que las ventas se estén registrando correctamente",
        });
    } else if sales_count < 5 {
        advisories.push(Advisory {
            tipo: "POCAS_VENTAS",
            severidad: Severity::High,
            mensaje: format!("Solo {} ventas en el período", sales_count),
            recomendacion: "Amplíe el período para análisis más estable",
        });
    }

    if period_days == 1 {
        advisories.push(Advisory {
            tipo: "PERIODO_CORTO",
            severidad: Severity::Medium,
            mensaje: "Métricas de un día tienen alta variabilidad".to_string(),
            recomendacion: "Use 'last_7_days' para tendencias confiables",
        });
    }

    if period_days > 90 {
        advisories.push(Advisory {
            tipo: "PERIODO_LARGO",
            severidad: Severity::Low,
            mensaje: format!("Período de {} días puede ocultar tendencias", period_days),
            recomendacion: "Considere dividir en períodos más cortos para mejor análisis",
        });
    }

    advisories
}

pub fn data_quality(advisories: &[Advisory]) -> DataQuality {
    match advisories.iter().map(|a| a.severidad).max() {
        Some(Severity::Critical) => DataQuality::NoData,
        Some(Severity::High) => DataQuality::Poor,
        Some(Severity::Medium) => DataQuality::Fair,
        Some(Severity::Low) | None => DataQuality::Good,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_period_is_critical() {
        let advisories = advisories_for(0, 7);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].tipo, "SIN_VENTAS");
        assert_eq!(data_quality(&advisories), DataQuality::NoData);
    }

    #[test]
    fn sparse_period_is_high_severity() {
        let advisories = advisories_for(3, 7);
        assert_eq!(advisories[0].tipo, "POCAS_VENTAS");
        assert_eq!(data_quality(&advisories), DataQuality::Poor);
    }

    #[test]
    fn single_day_period_is_flagged_medium() {
        let advisories = advisories_for(20, 1);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].tipo, "PERIODO_CORTO");
        assert_eq!(data_quality(&advisories), DataQuality::Fair);
    }

    #[test]
    fn long_period_alone_stays_good() {
        let advisories = advisories_for(200, 120);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].tipo, "PERIODO_LARGO");
        assert_eq!(data_quality(&advisories), DataQuality::Good);
    }

    #[test]
    fn worst_severity_wins() {
        // Zero sales in a single-day window: critical beats medium
        let advisories = advisories_for(0, 1);
        assert_eq!(advisories.len(), 2);
        assert_eq!(data_quality(&advisories), DataQuality::NoData);
    }

    #[test]
    fn healthy_period_has_no_advisories() {
        let advisories = advisories_for(50, 7);
        assert!(advisories.is_empty());
        assert_eq!(data_quality(&advisories), DataQuality::Good);
    }
}
