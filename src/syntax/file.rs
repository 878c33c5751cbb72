use std::path::PathBuf;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Span;

/// An unresolved named reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: SmolStr,
    pub span: Span,
}

impl Reference {
    pub fn new(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// One model file as declared in source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    /// Logical name from the `file` declaration.
    pub name: SmolStr,
    pub path: PathBuf,
    pub uses: Vec<Reference>,
    pub aliases: Vec<FileAliasDecl>,
    pub domains: Vec<DomainDecl>,
    pub classes: Vec<ClassDecl>,
    pub endpoints: Vec<EndpointDecl>,
}

impl ParsedFile {
    pub fn declares_domains(&self) -> bool {
        !self.domains.is_empty()
    }

    pub fn uses_file(&self, name: &str) -> bool {
        self.uses.iter().any(|u| u.name == name)
    }
}

/// `alias from <file> { class ...; endpoint ...; }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAliasDecl {
    pub file: Reference,
    pub classes: Vec<Reference>,
    pub endpoints: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDecl {
    pub name: SmolStr,
    pub span: Span,
    pub label: Option<String>,
    pub length: Option<u32>,
    pub autogenerated_key: bool,
    /// Target language -> (type name, annotations).
    pub targets: IndexMap<SmolStr, (String, Vec<String>)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDecl {
    pub name: SmolStr,
    pub span: Span,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub extends: Option<Reference>,
    pub abstract_: bool,
    pub reference: bool,
    pub persistent: bool,
    pub properties: Vec<PropertyDecl>,
    pub values: Vec<ValueRow>,
}

/// A static value row: `Admin { Code = "ADM" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueRow {
    pub name: SmolStr,
    pub values: IndexMap<SmolStr, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointDecl {
    pub name: SmolStr,
    pub span: Span,
    pub method: Option<SmolStr>,
    pub route: Option<String>,
    pub description: Option<String>,
    pub params: Vec<PropertyDecl>,
    pub returns: Option<PropertyDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    /// Declared name; associations without `as` and aliases have none.
    pub name: Option<SmolStr>,
    pub span: Span,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub primary_key: bool,
    pub required: bool,
    pub default_value: Option<String>,
    pub kind: PropertyDeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDeclKind {
    Field {
        domain: Reference,
    },
    Association {
        class: Reference,
        role: Option<SmolStr>,
    },
    Composition {
        class: Reference,
        kind: Reference,
    },
    Alias(AliasDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDecl {
    pub class: Reference,
    pub include: Vec<Reference>,
    pub exclude: Vec<Reference>,
    pub list_domain: Option<Reference>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}
