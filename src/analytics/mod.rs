//! Sales aggregation: period windows, per-currency financial metrics,
//! period-over-period growth, and data-quality advisories.

pub mod advisories;
pub mod metrics;
pub mod periods;

pub use advisories::{advisories_for, data_quality, Advisory, DataQuality, Severity};
pub use metrics::{compute_period_metrics, growth, CurrencyMetrics, Growth};
pub use periods::{DateRange, Period, PeriodError};
