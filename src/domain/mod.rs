//! Domain models for Approval Core

pub mod action;
pub mod common;
pub mod principal;
pub mod request;
pub mod stage;
pub mod workflow;

pub use action::*;
pub use common::*;
pub use principal::*;
pub use request::*;
pub use stage::*;
pub use workflow::*;
