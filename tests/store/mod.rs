//! Model store tests
//!
//! Tests for the store driven through real files on disk:
//! - Full loads and dependency ordering
//! - Incremental updates and affected sets
//! - Fatal and soft failures, and what they leave behind
//! - Configuration files and watch mode

pub mod tests_config_watch;
pub mod tests_failures;
pub mod tests_incremental;
pub mod tests_load;

use model_store::ModelStore;

/// Property names of a class in the committed model.
pub fn class_properties(store: &ModelStore, class: &str) -> Vec<String> {
    let model = store.model();
    let id = model
        .find_class(class)
        .unwrap_or_else(|| panic!("class {class} not in the model"));
    model
        .property_names(id)
        .into_iter()
        .map(str::to_string)
        .collect()
}
