pub mod script;

pub use script::{ScriptId, ScriptRecord, ScriptStatus, now_millis};
