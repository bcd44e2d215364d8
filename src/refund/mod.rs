//! Refund domain: eligibility rules, fee breakdown math and the
//! execution pipeline that drives provider gateways and the ledger.

pub mod breakdown;
pub mod eligibility;
pub mod error;
pub mod processor;
pub mod reconciliation;
pub mod store;
pub mod types;
