pub mod account;
pub mod catalog;
pub mod client;
pub mod commission;
pub mod franchise;
pub mod sale;
pub mod site;

pub use account::Account;
pub use catalog::{Alcance, CatalogItem};
pub use client::{Client, ClientNote, ClientSummary};
pub use commission::{Commission, CommissionKind, CommissionLine, CommissionState};
pub use franchise::Franchise;
pub use sale::{ItemKind, PaymentBreakdown, PaymentMethod, Sale, SaleItem};
pub use site::Site;
