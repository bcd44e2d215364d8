//! Services module for business logic and integrations

pub mod ledger;
pub mod merchant_directory;
