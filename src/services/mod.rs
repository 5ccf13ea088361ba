pub mod catalog_service;
pub mod client_service;
pub mod commission_service;
pub mod dashboard_service;
pub mod franchise_service;
pub mod site_service;
