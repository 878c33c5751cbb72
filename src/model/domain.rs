use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Span;

/// A named value type shared by every file of the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Domain {
    pub name: SmolStr,
    pub span: Span,
    pub label: Option<String>,
    pub length: Option<u32>,
    /// The domain types an auto-generated key.
    pub autogenerated_key: bool,
    /// Per target language representation, keyed by target name (`csharp`, `ts`, ...).
    pub targets: IndexMap<SmolStr, DomainTarget>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomainTarget {
    pub type_name: String,
    pub annotations: Vec<String>,
}

impl Domain {
    pub fn target(&self, name: &str) -> Option<&DomainTarget> {
        self.targets.get(name)
    }
}
