//! Pricing Service - price plan calculation and bill-cycle generation for catalog-driven billing.

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
