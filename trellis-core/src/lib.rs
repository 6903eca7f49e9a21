//! Trellis Core
//!
//! Core types and abstractions for the Trellis pipeline orchestrator.
//!
//! This crate contains:
//! - Domain types: Core business entities (PipelineConfig, PipelineInstance)
//! - DTOs: Data transfer objects exposed at the HTTP boundary

pub mod domain;
pub mod dto;
