//! Automatic name-keyed registration of types and callables into
//! hierarchical scopes.
//!
//! Declaring a variant is enough to make it discoverable by name: the
//! binder derives a canonical key from the declaration-site identifier,
//! registers it into the variant's own scope, and propagates the
//! registration up the structural ancestor chain. Plugin-style factories
//! fall out of this without a manual registration call per variant.
//!
//! # Mental model
//!
//! | Type | Role |
//! |------|------|
//! | [`ScopeConfig`] | Per-scope naming and collision policy, inherited by copy. |
//! | [`Scope`] | Ordered key→variant container plus the registration algorithm. |
//! | [`Variant`] | A registered value: payload, provenance, optional child scope. |
//! | [`binder::bind`] | Wires a declared variant into its ancestor chain. |
//! | [`DecoratorRegistry`] | Standalone scope driven directly from call sites. |
//!
//! # Example
//!
//! ```
//! use enroll::{DecoratorRegistry, Variant, VariantKind};
//!
//! let registry = DecoratorRegistry::new();
//! let greet = Variant::builder("Greeter", VariantKind::Type)
//! 	.payload("hello")
//! 	.build();
//! registry.register(&greet).unwrap();
//!
//! // Default lookup is case-insensitive.
//! assert!(registry.get("gReEtEr").unwrap().same_as(&greet));
//! ```
//!
//! Reimport detection keeps hot reloads from tripping collision errors: a
//! re-executed definition with the same identifier, qualified path, and
//! source origin but a different module identity silently replaces the old
//! one, everywhere it is registered. See [`reimport`].
//!
//! All registration is synchronous and single-threaded by design; internal
//! locks only satisfy shared ownership across the ancestor graph.

pub mod binder;
pub mod config;
pub mod decorator;
pub mod error;
pub mod format;
mod macros;
pub mod reimport;
pub mod scope;
pub mod variant;

pub use binder::{MethodDispatch, MethodTable, ScopeMethod, UserMethod, VariantDecl, bind};
pub use config::{NameTransform, ScopeConfig, ScopePatch};
pub use decorator::{DecoratorRegistry, Namespace, NamespaceEntry, Pending, VariantReg};
pub use error::RegistryError;
pub use format::{key_split, to_snake_case};
pub use reimport::is_reimport;
pub use scope::{AliasSpec, Fallback, Scope, ScopeSnapshot};
pub use variant::{ModuleId, Variant, VariantBuilder, VariantKind, VariantMeta, WeakVariant};

#[doc(hidden)]
pub use {inventory, paste};
