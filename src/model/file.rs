use std::path::PathBuf;

use smol_str::SmolStr;

use super::{ClassId, DomainId, EndpointId, PropertyId};
use crate::syntax::{FileAliasDecl, Reference};

/// File-level alias directive: classes and endpoints imported from a dependency.
pub type FileAlias = FileAliasDecl;

/// One model file, with its entities held as arena handles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelFile {
    pub name: SmolStr,
    pub path: PathBuf,
    pub uses: Vec<Reference>,
    pub classes: Vec<ClassId>,
    pub domains: Vec<DomainId>,
    pub endpoints: Vec<EndpointId>,
    pub aliases: Vec<FileAlias>,
    /// References not resolved yet. Empty on every committed file.
    pub relations: Vec<PendingRelation>,
}

impl ModelFile {
    pub fn declares_domains(&self) -> bool {
        !self.domains.is_empty()
    }

    pub fn uses_file(&self, name: &str) -> bool {
        self.uses.iter().any(|u| u.name == name)
    }

    pub fn is_resolved(&self) -> bool {
        self.relations.is_empty()
    }
}

/// Entity carrying an unresolved reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationOwner {
    Class(ClassId),
    Property(PropertyId),
}

/// What a pending reference must resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Class,
    Domain,
    /// Class whose properties an alias copies.
    Alias,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRelation {
    pub owner: RelationOwner,
    pub kind: RelationKind,
    pub reference: Reference,
}
