//! Core module - Input parsing and resolution
//!
//! This module provides:
//! - Cache entry model and error taxonomy
//! - Entry mini-language parser
//! - Path resolution
//! - Platform suffix and key derivation
//! - Input validation and workspace resolution
//! - Workflow reporting and plan rendering

pub mod entries;
pub mod inputs;
pub mod model;
pub mod paths;
pub mod platform;
pub mod render;
pub mod report;
pub mod util;
