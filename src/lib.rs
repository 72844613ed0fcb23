//! Inkframe
//!
//! Photo upload server for 800x480 six-color e-paper frames.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
