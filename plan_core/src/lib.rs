pub mod adapter;
pub mod clipboard;
pub mod config;
pub mod draft;
pub mod editor;
pub mod flush;
pub mod grid;
pub mod keys;
pub mod picker;
pub mod storage;
pub mod types;

pub use config::{Catalog, Config, ExerciseTemplate, GridSettings};
pub use editor::{Direction, GridEditor, MountedGrid};
pub use grid::{CellPos, Column, GridModel, RowKind};
pub use keys::{GridKey, KeyBus};
pub use storage::StorageError;
pub use types::*;
