pub mod autosave;
pub mod store;

pub use autosave::{AutoSaveEntry, AutoSaveManager, ContentSource};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
