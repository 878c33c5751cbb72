//! Model file discovery and loading.

mod collection;
pub mod file_loader;

pub use collection::collect_file_paths;
pub(crate) use collection::has_extension;
pub use file_loader::{DslLoader, ModelLoader, load_file};
