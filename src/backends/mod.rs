//! Backends module - boringcache CLI integration
//!
//! Provides:
//! - boringcache: argument building and process execution
//! - install: CLI discovery and installation
//! - save: save flow
//! - restore: restore flow

pub mod boringcache;
pub mod install;
pub mod restore;
pub mod save;
