//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and the component transform
//! - Handle-based collections for GPU resource tracking
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
