//! Core domain types
//!
//! This module contains the core domain structures used across Trellis
//! services. These types represent the fundamental business entities and are
//! shared between the orchestrator (for persistence) and the boundary layer.

pub mod config;
pub mod instance;
