//! # Contracts
//!
//! Frozen interface contracts, defining the data structures shared by the
//! ride analysis crates. Business crates depend on this crate, never the
//! other way round.
//!
//! ## Time Model
//! - Frame timestamps are epoch milliseconds (i64)
//! - Window and segment times are relative to the earliest frame in the
//!   analyzed set (milliseconds for windows, seconds for segments/events)

mod analysis_config;
mod error;
mod frame;
mod output;
mod state;

pub use analysis_config::*;
pub use error::*;
pub use frame::*;
pub use output::*;
pub use state::*;
