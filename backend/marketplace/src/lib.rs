//! EcoChain marketplace backend.
//!
//! Serves the carbon-credit listing document, tracks the wallet session and
//! turns purchase / retirement requests into signed Aptos transactions.

pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod errors;
pub mod listing;
pub mod node;
pub mod payload;
pub mod submitter;
pub mod wallet;
