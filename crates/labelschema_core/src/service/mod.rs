//! Core use-case services.
//!
//! # Responsibility
//! - Translate request payloads into schema mutations.
//! - Keep REST/CLI layers decoupled from aggregate internals.

pub mod task_labels;
