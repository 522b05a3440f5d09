//! # Tartib Support
//!
//! Shared utilities for the Tartib crates.
//!
//! This crate provides:
//! - Rendering of provider chains for cycle reports
//! - Short type names and "did you mean?" suggestions for error messages

pub mod rendering;
