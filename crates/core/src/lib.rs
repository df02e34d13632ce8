//! Core business logic for votehall.

pub mod services;

pub use services::*;
