use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::{
    Class, ClassId, Domain, DomainId, Endpoint, EndpointId, ModelFile, Property, PropertyId,
};

/// Append-only storage for every entity of every loaded file version.
///
/// Handles stay valid for the arena's lifetime, except for entities created
/// after a [`Checkpoint`] that is later rolled back.
#[derive(Clone, Debug, Default)]
pub struct ModelArena {
    classes: Vec<Class>,
    domains: Vec<Domain>,
    endpoints: Vec<Endpoint>,
    properties: Vec<Property>,
}

/// Arena lengths at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    classes: usize,
    domains: usize,
    endpoints: usize,
    properties: usize,
}

impl ModelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_class(&mut self, class: Class) -> ClassId {
        self.classes.push(class);
        ClassId::from_index(self.classes.len() - 1)
    }

    pub fn alloc_domain(&mut self, domain: Domain) -> DomainId {
        self.domains.push(domain);
        DomainId::from_index(self.domains.len() - 1)
    }

    pub fn alloc_endpoint(&mut self, endpoint: Endpoint) -> EndpointId {
        self.endpoints.push(endpoint);
        EndpointId::from_index(self.endpoints.len() - 1)
    }

    pub fn alloc_property(&mut self, property: Property) -> PropertyId {
        self.properties.push(property);
        PropertyId::from_index(self.properties.len() - 1)
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.index()]
    }

    pub fn domain(&self, id: DomainId) -> &Domain {
        &self.domains[id.index()]
    }

    pub fn endpoint(&self, id: EndpointId) -> &Endpoint {
        &self.endpoints[id.index()]
    }

    pub fn endpoint_mut(&mut self, id: EndpointId) -> &mut Endpoint {
        &mut self.endpoints[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.index()]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut Property {
        &mut self.properties[id.index()]
    }

    /// Properties of a class, in declaration order.
    pub fn class_properties(&self, id: ClassId) -> impl Iterator<Item = &Property> + '_ {
        self.class(id).properties.iter().map(|&p| self.property(p))
    }

    /// Primary-key properties of a class, in declaration order.
    pub fn primary_keys(&self, id: ClassId) -> impl Iterator<Item = PropertyId> + '_ {
        self.class(id)
            .properties
            .iter()
            .copied()
            .filter(|&p| self.property(p).primary_key)
    }

    pub fn primary_key(&self, id: ClassId) -> Option<PropertyId> {
        self.primary_keys(id).next()
    }

    /// Find a property of a class by name.
    pub fn find_property(&self, class: ClassId, name: &str) -> Option<PropertyId> {
        self.class(class)
            .properties
            .iter()
            .copied()
            .find(|&p| self.property(p).name == name)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            classes: self.classes.len(),
            domains: self.domains.len(),
            endpoints: self.endpoints.len(),
            properties: self.properties.len(),
        }
    }

    /// Drop every entity allocated since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.classes.truncate(checkpoint.classes);
        self.domains.truncate(checkpoint.domains);
        self.endpoints.truncate(checkpoint.endpoints);
        self.properties.truncate(checkpoint.properties);
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.domains.len() + self.endpoints.len() + self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The committed, fully resolved model.
///
/// Only batches that resolved without errors ever reach it; this is what
/// watchers are handed.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub(crate) arena: ModelArena,
    pub(crate) files: IndexMap<SmolStr, ModelFile>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &ModelArena {
        &self.arena
    }

    pub fn file(&self, name: &str) -> Option<&ModelFile> {
        self.files.get(name)
    }

    /// Committed files in first-commit order.
    pub fn files(&self) -> impl Iterator<Item = &ModelFile> + '_ {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn class(&self, id: ClassId) -> &Class {
        self.arena.class(id)
    }

    pub fn domain(&self, id: DomainId) -> &Domain {
        self.arena.domain(id)
    }

    pub fn endpoint(&self, id: EndpointId) -> &Endpoint {
        self.arena.endpoint(id)
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        self.arena.property(id)
    }

    /// Every class of every committed file, each once even if aliased into several files.
    pub fn classes(&self) -> Vec<ClassId> {
        let mut seen = FxHashSet::default();
        self.files
            .values()
            .flat_map(|f| f.classes.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// The global domain namespace. Last declaration wins on duplicate names.
    pub fn domains(&self) -> FxHashMap<SmolStr, DomainId> {
        self.files
            .values()
            .flat_map(|f| f.domains.iter().copied())
            .map(|id| (self.arena.domain(id).name.clone(), id))
            .collect()
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes()
            .into_iter()
            .find(|&id| self.arena.class(id).name == name)
    }

    pub fn find_domain(&self, name: &str) -> Option<DomainId> {
        self.domains().get(name).copied()
    }

    /// Names of the properties of a class, in order.
    pub fn property_names(&self, class: ClassId) -> Vec<&str> {
        self.arena
            .class_properties(class)
            .map(|p| p.name.as_str())
            .collect()
    }
}
