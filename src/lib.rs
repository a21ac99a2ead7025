//! Sonar ranging library - testable core of the HC-SR04 ranging firmware.
//!
//! Everything between the echo pin and the display lives here and runs on the
//! host. The binary (`main.rs`) adds the RP2350 peripherals, executors and
//! tasks.
//!
//! # Pipeline
//!
//! ```text
//! trigger ─▶ sensor ─▶ capture (IRQ) ─▶ ranging ─▶ presentation ─▶ SSD1306
//! ```
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test --target x86_64-unknown-linux-gnu
//! cargo test --target x86_64-unknown-linux-gnu --no-default-features --features timestamp-queue
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// Configuration
pub mod config;

// Ranging pipeline
pub mod capture;
pub mod pipeline;
pub mod pulse;
pub mod ranging;
pub mod trigger;

// Display
pub mod framebuffer;
pub mod presentation;
pub mod ssd1306;
