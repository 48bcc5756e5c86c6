//! Approval Core - Approval Workflow Engine
//!
//! This crate provides the core of the approval service: requests move
//! through an ordered sequence of stages, and each stage is acted upon
//! (notify, approve, deny, cancel, skip) by a principal whose authority
//! is decided by an RBAC-scoped access policy.

pub mod config;
pub mod domain;
pub mod error;
pub mod machine;
pub mod policy;
pub mod rbac;
pub mod repository;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApprovalError, Result};
