//! Relationship resolution for one instantiated file.
//!
//! Runs in five phases over the staged entities:
//!
//! 1. class lookup table (dependencies, then own classes)
//! 2. direct relations: `extends`, domains, associations, compositions
//! 3. property alias expansion, multi-pass, then naming of associations whose
//!    target key came from an alias
//! 4. file-level aliases
//! 5. primary-key cardinality
//!
//! Phases 2 to 4 collect [`ResolveError`]s and keep going. Phase 5 is fatal.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::Span;
use crate::error::{ErrorContext, ResolveError, ResolveErrorKind, StoreError};
use crate::model::{
    ClassId, DomainId, ModelArena, ModelFile, Property, PropertyId, PropertyKind, PropertyOwner,
    RelationKind, RelationOwner,
};
use crate::syntax::Reference;

/// Resolve every pending relation of `file` in place.
///
/// `dependencies` are the files named by `file.uses`, already resolved.
/// Returns the soft errors; an empty list means the file is fully resolved.
pub(crate) fn resolve_file(
    arena: &mut ModelArena,
    file: &mut ModelFile,
    dependencies: &[&ModelFile],
    domains: &FxHashMap<SmolStr, DomainId>,
    allow_composite_primary_key: bool,
) -> Result<Vec<ResolveError>, StoreError> {
    let mut resolver = Resolver {
        arena,
        file,
        dependencies,
        domains,
        classes: FxHashMap::default(),
        keyed_later: Vec::new(),
        errors: Vec::new(),
    };

    resolver.build_class_table();
    let aliases = resolver.resolve_relations();
    resolver.expand_aliases(aliases);
    resolver.name_keyed_associations();
    resolver.expand_file_aliases();
    if !allow_composite_primary_key {
        resolver.check_primary_keys()?;
    }

    tracing::trace!(
        file = %resolver.file.name,
        errors = resolver.errors.len(),
        "resolved file"
    );
    Ok(resolver.errors)
}

/// Owner of a relation, with the property variant when it is a property.
#[derive(Clone, Copy, Debug)]
enum Owner {
    Class(ClassId),
    Regular(PropertyId),
    Association(PropertyId),
    Composition(PropertyId),
    Alias(PropertyId),
}

struct Resolver<'r> {
    arena: &'r mut ModelArena,
    file: &'r mut ModelFile,
    dependencies: &'r [&'r ModelFile],
    domains: &'r FxHashMap<SmolStr, DomainId>,
    classes: FxHashMap<SmolStr, ClassId>,
    /// Associations whose target has no plain key field yet.
    keyed_later: Vec<(PropertyId, Reference)>,
    errors: Vec<ResolveError>,
}

/// What an alias copies, once its target class is known.
enum Selection {
    Ready(Vec<PropertyId>),
    /// Depends on an alias of the target that is not expanded yet.
    Deferred,
    /// Names an unknown property; errors were reported.
    Invalid,
}

impl Resolver<'_> {
    // =========================================================================
    // PHASE 1: class table
    // =========================================================================

    fn build_class_table(&mut self) {
        for dependency in self.dependencies {
            for &id in &dependency.classes {
                self.classes.insert(self.arena.class(id).name.clone(), id);
            }
        }
        for &id in &self.file.classes {
            let name = self.arena.class(id).name.clone();
            if let Some(previous) = self.classes.insert(name.clone(), id) {
                if previous != id {
                    tracing::warn!(
                        file = %self.file.name,
                        class = %name,
                        "class shadows a class of the same name from a dependency"
                    );
                }
            }
        }
    }

    // =========================================================================
    // PHASE 2: direct relations
    // =========================================================================

    /// Resolve every non-alias relation. Returns the alias relations for phase 3.
    fn resolve_relations(&mut self) -> Vec<(PropertyId, Reference)> {
        let relations = std::mem::take(&mut self.file.relations);
        let mut aliases = Vec::new();

        for relation in relations {
            let owner = match relation.owner {
                RelationOwner::Class(class) => Owner::Class(class),
                RelationOwner::Property(id) => match self.arena.property(id).kind {
                    PropertyKind::Regular { .. } => Owner::Regular(id),
                    PropertyKind::Association { .. } => Owner::Association(id),
                    PropertyKind::Composition { .. } => Owner::Composition(id),
                    PropertyKind::Alias { .. } => Owner::Alias(id),
                },
            };
            let reference = &relation.reference;

            match (owner, relation.kind) {
                (Owner::Class(class), RelationKind::Class) => {
                    self.resolve_extends(class, reference)
                }
                (Owner::Regular(id), RelationKind::Domain) => {
                    if let Some(domain) = self.domain(id, reference) {
                        if let PropertyKind::Regular { domain: slot } =
                            &mut self.arena.property_mut(id).kind
                        {
                            *slot = Some(domain);
                        }
                    }
                }
                (Owner::Association(id), RelationKind::Class) => {
                    self.resolve_association(id, reference)
                }
                (Owner::Composition(id), RelationKind::Class) => {
                    if let Some(class) = self.class(id, reference, "{composition}") {
                        if let PropertyKind::Composition { composition, .. } =
                            &mut self.arena.property_mut(id).kind
                        {
                            *composition = Some(class);
                        }
                    }
                }
                (Owner::Composition(id), RelationKind::Domain) => {
                    if let Some(domain) = self.domain(id, reference) {
                        if let PropertyKind::Composition { kind, .. } =
                            &mut self.arena.property_mut(id).kind
                        {
                            *kind = Some(domain);
                        }
                    }
                }
                (Owner::Alias(id), RelationKind::Domain) => {
                    if let Some(domain) = self.domain(id, reference) {
                        if let PropertyKind::Alias { list_domain, .. } =
                            &mut self.arena.property_mut(id).kind
                        {
                            *list_domain = Some(domain);
                        }
                    }
                }
                (Owner::Alias(id), RelationKind::Alias) => aliases.push((id, relation.reference)),
                (Owner::Class(_), RelationKind::Domain | RelationKind::Alias)
                | (Owner::Regular(_), RelationKind::Class | RelationKind::Alias)
                | (Owner::Association(_), RelationKind::Domain | RelationKind::Alias)
                | (Owner::Composition(_), RelationKind::Alias)
                | (Owner::Alias(_), RelationKind::Class) => {
                    let kind = relation.kind;
                    tracing::debug!(?owner, ?kind, "relation kind not used by its owner")
                }
            }
        }

        aliases
    }

    fn resolve_extends(&mut self, class: ClassId, reference: &Reference) {
        match self.classes.get(&reference.name).copied() {
            Some(parent) => self.arena.class_mut(class).extends = Some(parent),
            None => {
                let context = ErrorContext::file(self.file.name.clone())
                    .owner(self.arena.class(class).name.clone());
                self.error(
                    reference.span,
                    ResolveErrorKind::UnknownClass {
                        name: reference.name.clone(),
                    },
                    context,
                );
            }
        }
    }

    fn resolve_association(&mut self, id: PropertyId, reference: &Reference) {
        let Some(target) = self.class(id, reference, "{association}") else {
            return;
        };
        if let PropertyKind::Association { association, .. } =
            &mut self.arena.property_mut(id).kind
        {
            *association = Some(target);
        }

        match self.concrete_key(target) {
            Some(key) => self.name_association(id, target, key),
            None => self.keyed_later.push((id, reference.clone())),
        }
    }

    /// The target's primary key, unless it is missing or still an alias.
    fn concrete_key(&self, class: ClassId) -> Option<PropertyId> {
        self.arena
            .primary_key(class)
            .filter(|&key| !self.arena.property(key).is_alias())
    }

    /// Give an unnamed association its `{Target}{TargetKey}{Role}` name.
    fn name_association(&mut self, id: PropertyId, target: ClassId, key: PropertyId) {
        let property = self.arena.property(id);
        if !property.name.is_empty() {
            return;
        }
        let role = match &property.kind {
            PropertyKind::Association { role, .. } => role.clone(),
            _ => None,
        };
        let name = association_name(
            &self.arena.class(target).name,
            &self.arena.property(key).name,
            role.as_deref(),
        );
        self.arena.property_mut(id).name = name;
    }

    /// Associations left over by phase 2, once aliases are expanded.
    fn name_keyed_associations(&mut self) {
        for (id, reference) in std::mem::take(&mut self.keyed_later) {
            let PropertyKind::Association {
                association: Some(target),
                ..
            } = self.arena.property(id).kind
            else {
                continue;
            };
            match self.concrete_key(target) {
                Some(key) => self.name_association(id, target, key),
                None => {
                    let context = self.context(id, Some("{association}"));
                    self.error(
                        reference.span,
                        ResolveErrorKind::MissingPrimaryKey {
                            class: reference.name.clone(),
                        },
                        context,
                    );
                }
            }
        }
    }

    /// Class lookup with an error on miss.
    fn class(&mut self, id: PropertyId, reference: &Reference, member: &str) -> Option<ClassId> {
        let found = self.classes.get(&reference.name).copied();
        if found.is_none() {
            let context = self.context(id, Some(member));
            self.error(
                reference.span,
                ResolveErrorKind::UnknownClass {
                    name: reference.name.clone(),
                },
                context,
            );
        }
        found
    }

    /// Domain lookup in the global table, with an error on miss.
    fn domain(&mut self, id: PropertyId, reference: &Reference) -> Option<DomainId> {
        let found = self.domains.get(&reference.name).copied();
        if found.is_none() {
            let context = self.context(id, None);
            self.error(
                reference.span,
                ResolveErrorKind::UnknownDomain {
                    name: reference.name.clone(),
                },
                context,
            );
        }
        found
    }

    // =========================================================================
    // PHASE 3: property aliases
    // =========================================================================

    fn expand_aliases(&mut self, mut remaining: Vec<(PropertyId, Reference)>) {
        while !remaining.is_empty() {
            let before = remaining.len();
            let mut deferred = Vec::new();

            for (alias, reference) in remaining {
                let Some(target) = self.alias_target(alias, &reference) else {
                    self.splice(alias, Vec::new());
                    continue;
                };
                match self.select(alias, target) {
                    Selection::Ready(selected) => self.expand_alias(alias, selected),
                    Selection::Deferred => deferred.push((alias, reference)),
                    Selection::Invalid => self.splice(alias, Vec::new()),
                }
            }

            if deferred.len() == before {
                for (alias, reference) in deferred {
                    let context = self.context(alias, Some("{alias}"));
                    self.error(
                        reference.span,
                        ResolveErrorKind::CircularAlias {
                            class: reference.name.clone(),
                        },
                        context,
                    );
                }
                return;
            }
            remaining = deferred;
        }
    }

    fn alias_target(&mut self, alias: PropertyId, reference: &Reference) -> Option<ClassId> {
        if let PropertyKind::Alias {
            class: Some(target),
            ..
        } = self.arena.property(alias).kind
        {
            return Some(target);
        }
        let target = self.class(alias, reference, "{alias}")?;
        if let PropertyKind::Alias { class, .. } = &mut self.arena.property_mut(alias).kind {
            *class = Some(target);
        }
        Some(target)
    }

    fn has_aliases(&self, class: ClassId) -> bool {
        self.arena.class_properties(class).any(Property::is_alias)
    }

    /// Include wins over exclude. A name missing from a target that still has
    /// aliases may appear once they expand, so it defers rather than fails.
    fn select(&mut self, alias: PropertyId, target: ClassId) -> Selection {
        let PropertyKind::Alias {
            include, exclude, ..
        } = &self.arena.property(alias).kind
        else {
            return Selection::Invalid;
        };
        let (include, exclude) = (include.clone(), exclude.clone());

        let missing: Vec<&Reference> = include
            .iter()
            .chain(&exclude)
            .filter(|name| self.arena.find_property(target, &name.name).is_none())
            .collect();
        if !missing.is_empty() {
            if self.has_aliases(target) {
                return Selection::Deferred;
            }
            let context = self.context(alias, Some("{alias}"));
            for name in missing {
                self.error(
                    name.span,
                    ResolveErrorKind::UnknownAliasedProperty {
                        class: self.arena.class(target).name.clone(),
                        property: name.name.clone(),
                    },
                    context.clone(),
                );
            }
            return Selection::Invalid;
        }

        let selected: Vec<PropertyId> = if include.is_empty() {
            self.arena
                .class(target)
                .properties
                .iter()
                .copied()
                .filter(|&p| !exclude.iter().any(|e| e.name == self.arena.property(p).name))
                .collect()
        } else {
            include
                .iter()
                .filter_map(|name| self.arena.find_property(target, &name.name))
                .collect()
        };

        if selected.iter().any(|&p| self.arena.property(p).is_alias()) {
            Selection::Deferred
        } else {
            Selection::Ready(selected)
        }
    }

    fn expand_alias(&mut self, alias: PropertyId, selected: Vec<PropertyId>) {
        let template = self.arena.property(alias).clone();
        let PropertyKind::Alias {
            list_domain,
            prefix,
            suffix,
            ..
        } = &template.kind
        else {
            return;
        };

        let clones = selected
            .into_iter()
            .map(|source| {
                let clone = alias_clone(
                    &template,
                    source,
                    self.arena.property(source),
                    *list_domain,
                    prefix.as_deref(),
                    suffix.as_deref(),
                );
                self.arena.alloc_property(clone)
            })
            .collect();
        self.splice(alias, clones);
    }

    /// Replace `alias` in its owner's list with `clones`, keeping their order.
    fn splice(&mut self, alias: PropertyId, clones: Vec<PropertyId>) {
        let owner = self.arena.property(alias).owner;
        match owner {
            PropertyOwner::Class(class) => {
                let properties = &mut self.arena.class_mut(class).properties;
                if let Some(index) = properties.iter().position(|&p| p == alias) {
                    properties.splice(index..=index, clones);
                }
            }
            PropertyOwner::Endpoint(endpoint) => {
                let endpoint = self.arena.endpoint_mut(endpoint);
                if endpoint.returns == Some(alias) {
                    endpoint.returns = clones.first().copied();
                } else if let Some(index) = endpoint.params.iter().position(|&p| p == alias) {
                    endpoint.params.splice(index..=index, clones);
                }
            }
        }
    }

    // =========================================================================
    // PHASE 4: file aliases
    // =========================================================================

    fn expand_file_aliases(&mut self) {
        let dependencies = self.dependencies;
        let aliases = self.file.aliases.clone();

        for alias in &aliases {
            let context = ErrorContext::file(self.file.name.clone()).member("{alias}");
            let Some(source) = dependencies.iter().find(|d| d.name == alias.file.name) else {
                self.error(
                    alias.file.span,
                    ResolveErrorKind::UnknownAliasFile {
                        file: alias.file.name.clone(),
                    },
                    context,
                );
                continue;
            };

            for reference in &alias.classes {
                let found = source
                    .classes
                    .iter()
                    .copied()
                    .find(|&c| self.arena.class(c).name == reference.name);
                match found {
                    Some(class) => {
                        let present = self
                            .file
                            .classes
                            .iter()
                            .any(|&c| self.arena.class(c).name == reference.name);
                        if !present {
                            self.file.classes.push(class);
                        }
                    }
                    None => self.error(
                        reference.span,
                        ResolveErrorKind::UnknownAliasClass {
                            file: alias.file.name.clone(),
                            class: reference.name.clone(),
                        },
                        context.clone(),
                    ),
                }
            }

            for reference in &alias.endpoints {
                let found = source
                    .endpoints
                    .iter()
                    .copied()
                    .find(|&e| self.arena.endpoint(e).name == reference.name);
                match found {
                    Some(endpoint) => {
                        let present = self
                            .file
                            .endpoints
                            .iter()
                            .any(|&e| self.arena.endpoint(e).name == reference.name);
                        if !present {
                            self.file.endpoints.push(endpoint);
                        }
                    }
                    None => self.error(
                        reference.span,
                        ResolveErrorKind::UnknownAliasEndpoint {
                            file: alias.file.name.clone(),
                            endpoint: reference.name.clone(),
                        },
                        context.clone(),
                    ),
                }
            }
        }
    }

    // =========================================================================
    // PHASE 5: primary keys
    // =========================================================================

    fn check_primary_keys(&self) -> Result<(), StoreError> {
        for &class in &self.file.classes {
            let keys: Vec<SmolStr> = self
                .arena
                .primary_keys(class)
                .map(|p| self.arena.property(p).name.clone())
                .collect();
            if keys.len() > 1 {
                return Err(StoreError::MultiplePrimaryKeys {
                    file: self.file.name.clone(),
                    class: self.arena.class(class).name.clone(),
                    keys,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// `file/owner/member` for a property; `member` defaults to the property name.
    fn context(&self, id: PropertyId, member: Option<&str>) -> ErrorContext {
        let property = self.arena.property(id);
        let owner = match property.owner {
            PropertyOwner::Class(class) => self.arena.class(class).name.clone(),
            PropertyOwner::Endpoint(endpoint) => self.arena.endpoint(endpoint).name.clone(),
        };
        let member = member.map_or_else(|| property.name.clone(), SmolStr::new);
        ErrorContext::file(self.file.name.clone())
            .owner(owner)
            .member(member)
    }

    fn error(&mut self, span: Span, kind: ResolveErrorKind, context: ErrorContext) {
        self.errors
            .push(ResolveError::new(self.file.path.clone(), span, kind, context));
    }
}

/// Name of an association declared without one: `{Target}{TargetKey}{Role}`.
fn association_name(target: &str, key: &str, role: Option<&str>) -> SmolStr {
    SmolStr::from(format!("{target}{key}{}", role.unwrap_or_default()))
}

/// Copy of `source` standing where `alias` was declared.
fn alias_clone(
    alias: &Property,
    origin: PropertyId,
    source: &Property,
    list_domain: Option<DomainId>,
    prefix: Option<&str>,
    suffix: Option<&str>,
) -> Property {
    Property {
        name: SmolStr::from(format!(
            "{}{}{}",
            prefix.unwrap_or_default(),
            source.name,
            suffix.unwrap_or_default()
        )),
        span: alias.span,
        owner: alias.owner,
        label: alias.label.clone().or_else(|| source.label.clone()),
        comment: alias.comment.clone().or_else(|| source.comment.clone()),
        primary_key: alias.primary_key,
        required: alias.required || source.required,
        default_value: alias
            .default_value
            .clone()
            .or_else(|| source.default_value.clone()),
        list_domain,
        origin: Some(origin),
        kind: source.kind.clone(),
    }
}
