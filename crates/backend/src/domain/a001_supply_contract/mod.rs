pub mod reconciliation;
pub mod service;
