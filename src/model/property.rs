use smol_str::SmolStr;

use super::{ClassId, DomainId, EndpointId, PropertyId};
use crate::base::Span;
use crate::syntax::Reference;

/// The entity a property belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyOwner {
    Class(ClassId),
    Endpoint(EndpointId),
}

/// A class property or endpoint parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Declared name. Associations declared without `as` are named once resolved.
    pub name: SmolStr,
    pub span: Span,
    pub owner: PropertyOwner,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub primary_key: bool,
    pub required: bool,
    pub default_value: Option<String>,
    /// List domain inherited from a list-form alias.
    pub list_domain: Option<DomainId>,
    /// Property this one was copied from by alias expansion.
    pub origin: Option<PropertyId>,
    pub kind: PropertyKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// A plain field typed by a domain.
    Regular { domain: Option<DomainId> },
    /// A reference to another class through its primary key.
    Association {
        association: Option<ClassId>,
        role: Option<SmolStr>,
    },
    /// An embedded class wrapped by a collection domain.
    Composition {
        composition: Option<ClassId>,
        kind: Option<DomainId>,
    },
    /// Copies properties of another class. Never survives resolution.
    Alias {
        class: Option<ClassId>,
        include: Vec<Reference>,
        exclude: Vec<Reference>,
        list_domain: Option<DomainId>,
        prefix: Option<String>,
        suffix: Option<String>,
    },
}

impl Property {
    pub fn is_alias(&self) -> bool {
        matches!(self.kind, PropertyKind::Alias { .. })
    }

    pub fn domain(&self) -> Option<DomainId> {
        match self.kind {
            PropertyKind::Regular { domain } => domain,
            _ => None,
        }
    }

    /// Kind of the property, as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            PropertyKind::Regular { .. } => "field",
            PropertyKind::Association { .. } => "association",
            PropertyKind::Composition { .. } => "composition",
            PropertyKind::Alias { .. } => "alias",
        }
    }
}
