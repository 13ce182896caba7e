//! Label schema domain model.
//!
//! # Responsibility
//! - Define labels, label groups, the label hierarchy and the schema aggregate.
//! - Keep all schema invariants inside this module tree.
//!
//! # Invariants
//! - Every label is identified by a stable `LabelId`.
//! - Deletion is a monotonic soft-delete overlay, never a physical removal.

pub mod group;
pub mod label;
pub mod schema;
pub mod tree;
pub mod view;
