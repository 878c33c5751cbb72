//! Lowering a [`ParsedFile`] into arena entities.
//!
//! Every named reference becomes a [`PendingRelation`]; nothing is looked up
//! here. Each batch instantiates its affected files afresh, so a retry never
//! sees the half-resolved state of an aborted attempt.

use crate::model::{
    Class, ClassId, Domain, DomainId, DomainTarget, Endpoint, EndpointId, ModelArena, ModelFile,
    PendingRelation, Property, PropertyId, PropertyKind, PropertyOwner, RelationKind, RelationOwner,
};
use crate::syntax::{
    ClassDecl, DomainDecl, EndpointDecl, ParsedFile, PropertyDecl, PropertyDeclKind, Reference,
};

pub(crate) fn instantiate(arena: &mut ModelArena, source: &ParsedFile) -> ModelFile {
    let mut lowering = Lowering {
        arena,
        relations: Vec::new(),
    };

    let domains = source.domains.iter().map(|d| lowering.domain(d)).collect();
    let classes = source.classes.iter().map(|c| lowering.class(c)).collect();
    let endpoints = source.endpoints.iter().map(|e| lowering.endpoint(e)).collect();

    ModelFile {
        name: source.name.clone(),
        path: source.path.clone(),
        uses: source.uses.clone(),
        classes,
        domains,
        endpoints,
        aliases: source.aliases.clone(),
        relations: lowering.relations,
    }
}

struct Lowering<'a> {
    arena: &'a mut ModelArena,
    relations: Vec<PendingRelation>,
}

impl Lowering<'_> {
    fn relate(&mut self, owner: RelationOwner, kind: RelationKind, reference: &Reference) {
        self.relations.push(PendingRelation {
            owner,
            kind,
            reference: reference.clone(),
        });
    }

    fn domain(&mut self, decl: &DomainDecl) -> DomainId {
        self.arena.alloc_domain(Domain {
            name: decl.name.clone(),
            span: decl.span,
            label: decl.label.clone(),
            length: decl.length,
            autogenerated_key: decl.autogenerated_key,
            targets: decl
                .targets
                .iter()
                .map(|(target, (type_name, annotations))| {
                    (
                        target.clone(),
                        DomainTarget {
                            type_name: type_name.clone(),
                            annotations: annotations.clone(),
                        },
                    )
                })
                .collect(),
        })
    }

    fn class(&mut self, decl: &ClassDecl) -> ClassId {
        let id = self.arena.alloc_class(Class {
            name: decl.name.clone(),
            span: decl.span,
            label: decl.label.clone(),
            comment: decl.comment.clone(),
            extends: None,
            properties: Vec::new(),
            values: decl.values.clone(),
            abstract_: decl.abstract_,
            reference: decl.reference,
            persistent: decl.persistent,
        });
        if let Some(extends) = &decl.extends {
            self.relate(RelationOwner::Class(id), RelationKind::Class, extends);
        }

        let properties = decl
            .properties
            .iter()
            .map(|p| self.property(PropertyOwner::Class(id), p))
            .collect();
        self.arena.class_mut(id).properties = properties;
        id
    }

    fn endpoint(&mut self, decl: &EndpointDecl) -> EndpointId {
        let id = self.arena.alloc_endpoint(Endpoint {
            name: decl.name.clone(),
            span: decl.span,
            method: decl.method.clone(),
            route: decl.route.clone(),
            description: decl.description.clone(),
            params: Vec::new(),
            returns: None,
        });

        let owner = PropertyOwner::Endpoint(id);
        let params = decl
            .params
            .iter()
            .map(|p| self.property(owner, p))
            .collect();
        let returns = decl.returns.as_ref().map(|p| self.property(owner, p));

        let endpoint = self.arena.endpoint_mut(id);
        endpoint.params = params;
        endpoint.returns = returns;
        id
    }

    fn property(&mut self, owner: PropertyOwner, decl: &PropertyDecl) -> PropertyId {
        let kind = match &decl.kind {
            PropertyDeclKind::Field { .. } => PropertyKind::Regular { domain: None },
            PropertyDeclKind::Association { role, .. } => PropertyKind::Association {
                association: None,
                role: role.clone(),
            },
            PropertyDeclKind::Composition { .. } => PropertyKind::Composition {
                composition: None,
                kind: None,
            },
            PropertyDeclKind::Alias(alias) => PropertyKind::Alias {
                class: None,
                include: alias.include.clone(),
                exclude: alias.exclude.clone(),
                list_domain: None,
                prefix: alias.prefix.clone(),
                suffix: alias.suffix.clone(),
            },
        };

        let id = self.arena.alloc_property(Property {
            name: decl.name.clone().unwrap_or_default(),
            span: decl.span,
            owner,
            label: decl.label.clone(),
            comment: decl.comment.clone(),
            primary_key: decl.primary_key,
            required: decl.required,
            default_value: decl.default_value.clone(),
            list_domain: None,
            origin: None,
            kind,
        });

        let owner = RelationOwner::Property(id);
        match &decl.kind {
            PropertyDeclKind::Field { domain } => self.relate(owner, RelationKind::Domain, domain),
            PropertyDeclKind::Association { class, .. } => {
                self.relate(owner, RelationKind::Class, class)
            }
            PropertyDeclKind::Composition { class, kind } => {
                self.relate(owner, RelationKind::Class, class);
                self.relate(owner, RelationKind::Domain, kind);
            }
            PropertyDeclKind::Alias(alias) => {
                if let Some(list_domain) = &alias.list_domain {
                    self.relate(owner, RelationKind::Domain, list_domain);
                }
                self.relate(owner, RelationKind::Alias, &alias.class);
            }
        }
        id
    }
}
