use crate::persistence::StoreError;
use crate::validation::ValidationError;

/// Failures surfaced by the editing core.
///
/// Selection and surface errors are recovered where they happen (logged,
/// operation skipped or selection collapsed); only `save` hands an error back
/// to the host application.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("No active selection")]
    SelectionUnavailable,
    #[error("Editing surface is not mounted")]
    SurfaceMissing,
    #[error("Could not map offset {offset} onto the document")]
    RestoreFailed { offset: usize },
    #[error("No script is open")]
    NoActiveSession,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
