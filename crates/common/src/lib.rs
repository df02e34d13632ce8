//! Common utilities and shared types for votehall.
//!
//! This crate provides foundational components used across all votehall crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Time**: Injected time source via [`Clock`] and canonical-timezone
//!   wall-clock parsing
//!
//! # Example
//!
//! ```no_run
//! use votehall_common::{Clock, Config, IdGenerator, AppResult, SystemClock};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     let now = SystemClock::new().now();
//!     println!("Generated ID {} at {}", id, now);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock, format_local, parse_local_datetime, parse_timezone};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
