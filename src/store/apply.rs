//! The incremental apply pass.
//!
//! A batch is staged beyond an arena checkpoint and only reaches
//! [`Model::files`](crate::model::Model) once every affected file resolved
//! cleanly. Any failure truncates the arena back to the checkpoint.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, error, info, warn};

use super::core::{ApplyOutcome, StoreState};
use super::instantiate::instantiate;
use super::resolve::resolve_file;
use super::sort::topological_sort;
use crate::error::StoreError;
use crate::model::{DomainId, Model, ModelFile};
use crate::syntax::ParsedFile;

impl StoreState {
    pub(crate) fn apply_updates(
        &mut self,
        allow_composite_primary_key: bool,
    ) -> Result<ApplyOutcome, StoreError> {
        if self.pending.is_empty() {
            return Ok(ApplyOutcome::Unchanged);
        }

        let result = self.try_apply(allow_composite_primary_key);
        match &result {
            Ok(outcome) => info!(files = outcome.files().len(), "update completed successfully"),
            Err(StoreError::Resolution(errors)) => {
                for e in errors {
                    error!("{e}");
                }
                error!(errors = errors.len(), "model resolution failed, nothing committed");
            }
            Err(e) => error!(error = %e, "model update aborted"),
        }
        result
    }

    /// Files to re-resolve, in source insertion order.
    ///
    /// A pending file that declares domains affects every file. Otherwise the
    /// pending files and their direct dependents are affected.
    pub(crate) fn affected_files(&self) -> Vec<SmolStr> {
        let domains_changed = self
            .pending
            .iter()
            .filter_map(|name| self.sources.get(name))
            .any(ParsedFile::declares_domains);

        self.sources
            .values()
            .filter(|file| {
                domains_changed
                    || self.pending.contains(&file.name)
                    || file.uses.iter().any(|u| self.pending.contains(&u.name))
            })
            .map(|file| file.name.clone())
            .collect()
    }

    fn check_dependencies(&self, affected: &[SmolStr]) -> Result<(), StoreError> {
        for name in affected {
            let Some(source) = self.sources.get(name) else {
                continue;
            };
            if let Some(missing) = source
                .uses
                .iter()
                .find(|u| !self.sources.contains_key(&u.name))
            {
                return Err(StoreError::MissingDependency {
                    path: source.path.clone(),
                    span: missing.span,
                    dependency: missing.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn try_apply(&mut self, allow_composite_primary_key: bool) -> Result<ApplyOutcome, StoreError> {
        let affected = self.affected_files();
        debug!(pending = ?self.pending, affected = ?affected, "computed affected set");
        self.check_dependencies(&affected)?;

        let order: Vec<SmolStr> = {
            let sources: Vec<&ParsedFile> = affected
                .iter()
                .filter_map(|name| self.sources.get(name))
                .collect();
            topological_sort(
                &sources,
                |f| f.name.as_str(),
                |f| f.uses.iter().map(|u| u.name.as_str()),
            )?
            .into_iter()
            .map(|f| f.name.clone())
            .collect()
        };
        debug!(order = ?order, "sorted affected files");

        let checkpoint = self.model.arena.checkpoint();
        let staged = match self.stage(&order, allow_composite_primary_key) {
            Ok(staged) => staged,
            Err(e) => {
                self.model.arena.rollback(checkpoint);
                return Err(e);
            }
        };

        for file in staged {
            self.model.files.insert(file.name.clone(), file);
        }
        let StoreState {
            model,
            watchers,
            pending,
            ..
        } = self;
        let changed: Vec<&ModelFile> = order.iter().filter_map(|n| model.files.get(n)).collect();
        watchers.notify(model, &changed);
        pending.clear();

        Ok(ApplyOutcome::Applied(order))
    }

    /// Instantiate and resolve `order` without touching the committed files.
    fn stage(
        &mut self,
        order: &[SmolStr],
        allow_composite_primary_key: bool,
    ) -> Result<Vec<ModelFile>, StoreError> {
        let Model { arena, files } = &mut self.model;

        let mut staged: Vec<ModelFile> = order
            .iter()
            .filter_map(|name| self.sources.get(name))
            .map(|source| instantiate(arena, source))
            .collect();

        let staged_names: FxHashSet<&str> = order.iter().map(SmolStr::as_str).collect();
        let mut domains: FxHashMap<SmolStr, DomainId> = FxHashMap::default();
        let committed = files
            .values()
            .filter(|f| !staged_names.contains(f.name.as_str()));
        for file in committed.chain(staged.iter()) {
            for &id in &file.domains {
                let name = arena.domain(id).name.clone();
                if domains.insert(name.clone(), id).is_some() {
                    warn!(
                        domain = %name,
                        file = %file.name,
                        "duplicate domain, last declaration wins"
                    );
                }
            }
        }

        let mut errors = Vec::new();
        for index in 0..staged.len() {
            let (resolved, rest) = staged.split_at_mut(index);
            let file = &mut rest[0];
            let dependencies: Vec<&ModelFile> = file
                .uses
                .iter()
                .filter_map(|u| {
                    resolved
                        .iter()
                        .find(|f| f.name == u.name)
                        .or_else(|| files.get(&u.name))
                })
                .collect();

            let found = resolve_file(
                arena,
                file,
                &dependencies,
                &domains,
                allow_composite_primary_key,
            )?;
            errors.extend(found);
        }

        if errors.is_empty() {
            Ok(staged)
        } else {
            Err(StoreError::Resolution(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::path::Path;

    fn state(sources: &[&str]) -> StoreState {
        let mut state = StoreState::default();
        for (i, source) in sources.iter().enumerate() {
            let path = format!("f{i}.tmd");
            let parse = parse(source, Path::new(&path));
            assert!(parse.ok(), "{:?}", parse.errors);
            state.insert_source(parse.file);
        }
        state.pending.clear();
        state
    }

    const FILES: &[&str] = &[
        "file Domains; domain DO_ID {}",
        "file Base; class A { key field Id : DO_ID; }",
        "file Mid; uses Base; class B { association A; }",
        "file Top; uses Mid; class C { association B; }",
        "file Unrelated; class D {}",
    ];

    #[test]
    fn test_affected_is_pending_plus_direct_dependents() {
        let mut state = state(FILES);
        state.pending.insert("Base".into());
        assert_eq!(state.affected_files(), vec!["Base", "Mid"]);
    }

    #[test]
    fn test_domain_change_affects_everything() {
        let mut state = state(FILES);
        state.pending.insert("Domains".into());
        assert_eq!(state.affected_files().len(), FILES.len());
    }

    #[test]
    fn test_missing_dependency_is_fatal() {
        let mut state = state(&["file Lonely;\nuses Ghost;"]);
        state.pending.insert("Lonely".into());
        match state.apply_updates(false) {
            Err(StoreError::MissingDependency {
                span, dependency, ..
            }) => {
                assert_eq!(dependency, "Ghost");
                assert_eq!(span.start.line, 1);
            }
            other => panic!("expected a missing dependency, got {other:?}"),
        }
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.model.file_count(), 0);
    }

    #[test]
    fn test_failed_batch_rolls_back_arena() {
        let mut state = state(&["file Broken; class A { field X : DO_NOPE; }"]);
        state.pending.insert("Broken".into());
        let before = state.model.arena.len();

        let result = state.apply_updates(false);
        assert!(matches!(result, Err(StoreError::Resolution(ref errors)) if errors.len() == 1));
        assert_eq!(state.model.arena.len(), before);
        assert!(state.model.file("Broken").is_none());
    }
}
