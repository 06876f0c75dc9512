pub mod document;
pub mod editing;
pub mod error;
pub mod models;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod validation;

// Re-export key types for easier usage
pub use document::{
    Alignment, Document, ListKind, Node, NodePath, Style, has_markup, strip_markup, visible_text,
};
pub use editing::*;
pub use error::EditorError;
pub use models::*;
pub use persistence::*;
pub use session::{EditorSession, SessionState};
pub use settings::{EditorSettings, FontSizeBounds};
pub use validation::{ValidationError, ValidationLimits, Validator};
