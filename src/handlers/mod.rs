pub mod catalog;
pub mod clients;
pub mod commissions;
pub mod dashboard;
pub mod franchises;
pub mod sites;
