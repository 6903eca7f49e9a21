//! Data Transfer Objects for the HTTP boundary
//!
//! DTOs are lightweight representations of domain entities optimized for the
//! API surface. Instance DTOs deliberately omit the per-instance secret; the
//! only place a secret is ever rendered is the job-definition document.

pub mod config;
pub mod instance;
