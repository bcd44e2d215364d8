//! HTTP API handlers

pub mod refunds;
