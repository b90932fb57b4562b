//! # Ingestion
//!
//! Frame sources for the ride analysis engine.
//!
//! Responsibilities:
//! - Read frame files (JSON array, JSON Lines) into `Frame`s
//! - Read capabilities reports
//! - Write frames back out
//! - Generate deterministic synthetic rides
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{FrameReader, RideSimulator};
//!
//! let frames = FrameReader::read_path("ride.jsonl")?;
//!
//! let synthetic = RideSimulator::reference_ride().generate();
//! ```

mod error;
mod reader;
mod simulator;

// Re-exports
pub use contracts::Frame;
pub use error::{IngestionError, Result};
pub use reader::{write_frames, write_frames_to_path, FrameFormat, FrameReader};
pub use simulator::{RidePhase, RideSimulator, RideSimulatorConfig, Spike};
