use smol_str::SmolStr;

use super::{ClassId, PropertyId};
use crate::base::Span;
use crate::syntax::ValueRow;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Class {
    pub name: SmolStr,
    pub span: Span,
    pub label: Option<String>,
    pub comment: Option<String>,
    pub extends: Option<ClassId>,
    pub properties: Vec<PropertyId>,
    /// Static rows of a reference class.
    pub values: Vec<ValueRow>,
    pub abstract_: bool,
    pub reference: bool,
    pub persistent: bool,
}
