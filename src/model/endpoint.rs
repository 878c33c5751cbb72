use smol_str::SmolStr;

use super::PropertyId;
use crate::base::Span;

/// A service endpoint: ordered params and an optional return property.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub name: SmolStr,
    pub span: Span,
    pub method: Option<SmolStr>,
    pub route: Option<String>,
    pub description: Option<String>,
    pub params: Vec<PropertyId>,
    pub returns: Option<PropertyId>,
}
