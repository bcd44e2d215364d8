//! Merchant refund service for mobile-money transactions.
//!
//! Eligibility rules, the 2% processing-fee breakdown and a single-attempt
//! execution pipeline over the provider gateway and the platform ledger.

pub mod api;
pub mod config;
pub mod database;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod refund;
pub mod services;
