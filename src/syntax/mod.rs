//! Syntax: structural file representation produced by the loader.
//!
//! A [`ParsedFile`] mirrors one model file declaration by declaration. Every
//! cross-entity reference is still a [`Reference`] (name + span); the store
//! turns these placeholders into pending relations when it instantiates the
//! file into the model arena.

pub mod file;

pub use file::{
    AliasDecl, ClassDecl, DomainDecl, EndpointDecl, FileAliasDecl, ParsedFile, PropertyDecl,
    PropertyDeclKind, Reference, ValueRow,
};
