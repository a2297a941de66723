//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Time management
//! - Logging utilities
//! - Arena-backed node graph

pub mod math;
pub mod time;
pub mod logging;
pub mod node_graph;
