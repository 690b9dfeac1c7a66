//! # Kompas - Growth Assessment Server
//!
//! Library surface of the Kompas binary, exposing the API and CLI
//! modules for integration testing.

pub mod api;
pub mod cli;
