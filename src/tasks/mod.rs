//! Async tasks for the ranging firmware.
//!
//! - `capture`: Echo edge capture, runs on the interrupt-priority executor
//! - `trigger`: Periodic sensor trigger
//! - `ranging`: Pulse to reading conversion
//! - `presentation`: Readout rendering, display flush and diagnostics log

pub mod capture;
pub mod presentation;
pub mod ranging;
pub mod trigger;

#[cfg(not(feature = "timestamp-queue"))]
pub use capture::edge_capture_task;
#[cfg(feature = "timestamp-queue")]
pub use capture::stamp_capture_task;
pub use presentation::presentation_task;
pub use ranging::ranging_task;
pub use trigger::trigger_task;
