//! The model store: loading, incremental resolution and change propagation.
//!
//! ## Key Types
//!
//! - [`ModelStore`] - Owns sources, the committed [`Model`](crate::model::Model) and watchers
//! - [`ModelWatcher`] - Consumer notified after each successful batch
//! - [`ApplyOutcome`] - What an apply pass did
//! - [`WatchHandle`], [`Debouncer`] - Filesystem watch mode
//!
//! ## Flow
//!
//! ```text
//! load_file ─► pending ─► apply_updates
//!                           ├─ affected set
//!                           ├─ topological sort
//!                           ├─ instantiate (arena checkpoint)
//!                           ├─ resolve each file
//!                           └─ commit + notify  |  roll back
//! ```

mod apply;
mod core;
mod instantiate;
mod resolve;
pub mod sort;
mod watch;
mod watcher;

pub use self::core::{ApplyOutcome, ModelStore};
pub use sort::topological_sort;
pub use watch::{Debouncer, WatchHandle};
pub use watcher::ModelWatcher;
