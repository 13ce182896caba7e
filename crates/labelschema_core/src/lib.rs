//! Label schema engine.
//! This crate is the single source of truth for label hierarchy, grouping
//! and soft-deletion invariants.

pub mod logging;
pub mod model;
pub mod record;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::group::{LabelGroup, LabelGroupId, LabelGroupKind};
pub use model::label::{Label, LabelId, LabelValidationError, DEFAULT_LABEL_COLOR};
pub use model::schema::{
    LabelSchema, LabelSchemaError, ParentRef, ProjectId, Provenance, SchemaId, TaskNodeId,
    MIN_ACTIVE_LABELS,
};
pub use model::tree::{LabelTree, LabelTreeError};
pub use model::view::ViewOptions;
pub use record::{
    LabelGroupRecord, LabelSchemaRecord, LabelTreeEdgeRecord, RecordError, RecordResult,
};
pub use service::task_labels::{
    TaskLabelError, TaskLabelService, TaskLabelSpec, TaskLabelsRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
