//! Resolved model: entities, handles and the committed model graph.
//!
//! The object graph of a model is cyclic (a property points at its class, an
//! association points at another class, a class may extend a third). Entities
//! therefore live in an append-only [`ModelArena`] and refer to each other
//! through typed handles.
//!
//! ## Key Types
//!
//! - [`ClassId`], [`DomainId`], [`EndpointId`], [`PropertyId`] - stable handles
//! - [`Class`], [`Domain`], [`Endpoint`], [`Property`] - the entities
//! - [`ModelFile`] - handle lists and pending relations of one loaded file
//! - [`Model`] - arena plus the committed files, as seen by watchers

mod arena;
mod class;
mod domain;
mod endpoint;
mod file;
mod ids;
mod property;

pub use arena::{Checkpoint, Model, ModelArena};
pub use class::Class;
pub use domain::{Domain, DomainTarget};
pub use endpoint::Endpoint;
pub use file::{FileAlias, ModelFile, PendingRelation, RelationKind, RelationOwner};
pub use ids::{ClassId, DomainId, EndpointId, PropertyId};
pub use property::{Property, PropertyKind, PropertyOwner};
