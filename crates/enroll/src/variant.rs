//! Registered values and their provenance metadata.
//!
//! A [`Variant`] is the unit of registration: a shared handle around an
//! opaque payload plus the [`VariantMeta`] provenance the reimport heuristic
//! compares. Hierarchy-bound variants additionally carry a child [`Scope`]
//! and weak links to their structural parents.
//!
//! Parent links are weak on purpose: a parent's scope holds its descendants
//! strongly, so a strong child→parent edge would close a reference cycle.
//! Hierarchy roots are expected to live in `static`s for the lifetime of the
//! program.

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::binder::redirect::MethodTable;
use crate::scope::Scope;

/// Broad kind of a registered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantKind {
	/// A type definition; may anchor a child scope.
	Type,
	/// A plain callable.
	Callable,
	/// A nested namespace registered by traversal.
	Namespace,
}

impl fmt::Display for VariantKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Type => write!(f, "type"),
			Self::Callable => write!(f, "callable"),
			Self::Namespace => write!(f, "namespace"),
		}
	}
}

/// Identity of one execution of an enclosing module.
///
/// Two loads of the same source file (hot reload, dynamic re-link) carry the
/// same `path` but distinct `epoch`s; two definitions evaluated in a single
/// load share both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId {
	path: String,
	epoch: u64,
}

impl ModuleId {
	pub fn new(path: impl Into<String>, epoch: u64) -> Self {
		Self {
			path: path.into(),
			epoch,
		}
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn epoch(&self) -> u64 {
		self.epoch
	}
}

/// Provenance metadata attached to every variant.
#[derive(Debug, Clone)]
pub struct VariantMeta {
	/// Broad kind; reimport equivalence never crosses kinds.
	pub kind: VariantKind,
	/// Simple identifier the canonical key is derived from.
	pub ident: Option<String>,
	/// Fully-qualified lexical path (disambiguates same-named siblings).
	pub qualified_path: Option<String>,
	/// Identity of the enclosing module execution.
	pub module: Option<ModuleId>,
	/// Declared source-file origin, compared lexically canonicalized.
	pub origin: Option<PathBuf>,
}

impl VariantMeta {
	/// Minimal metadata: a kind and nothing else.
	pub fn bare(kind: VariantKind) -> Self {
		Self {
			kind,
			ident: None,
			qualified_path: None,
			module: None,
			origin: None,
		}
	}
}

struct VariantInner {
	meta: VariantMeta,
	payload: Arc<dyn Any + Send + Sync>,
	scope: Option<Scope>,
	parents: Vec<WeakVariant>,
	methods: MethodTable,
}

/// Shared handle to a registered value.
///
/// Cloning is cheap; identity (not payload equality) is what registration
/// and rereferencing compare, via [`Variant::same_as`].
#[derive(Clone)]
pub struct Variant {
	inner: Arc<VariantInner>,
}

impl Variant {
	/// Starts a builder for a plain (non-hierarchy) variant.
	pub fn builder(ident: impl Into<String>, kind: VariantKind) -> VariantBuilder {
		let mut meta = VariantMeta::bare(kind);
		meta.ident = Some(ident.into());
		VariantBuilder {
			meta,
			payload: None,
		}
	}

	/// A variant with no identifier; registration must supply an explicit
	/// name or fail with `CannotDeriveName`.
	pub fn anonymous(kind: VariantKind, payload: impl Any + Send + Sync) -> Self {
		Self::from_parts(
			VariantMeta::bare(kind),
			Arc::new(payload),
			None,
			Vec::new(),
			MethodTable::default(),
		)
	}

	/// A `Namespace`-kind variant fronting `scope`, so path lookup descends
	/// through it.
	pub(crate) fn namespace(ident: impl Into<String>, origin: Option<PathBuf>, scope: Scope) -> Self {
		let mut meta = VariantMeta::bare(VariantKind::Namespace);
		meta.ident = Some(ident.into());
		meta.origin = origin;
		Self::from_parts(meta, Arc::new(()), Some(scope), Vec::new(), MethodTable::default())
	}

	pub(crate) fn from_parts(
		meta: VariantMeta,
		payload: Arc<dyn Any + Send + Sync>,
		scope: Option<Scope>,
		parents: Vec<WeakVariant>,
		methods: MethodTable,
	) -> Self {
		Self {
			inner: Arc::new(VariantInner {
				meta,
				payload,
				scope,
				parents,
				methods,
			}),
		}
	}

	pub fn meta(&self) -> &VariantMeta {
		&self.inner.meta
	}

	pub fn kind(&self) -> VariantKind {
		self.inner.meta.kind
	}

	pub fn ident(&self) -> Option<&str> {
		self.inner.meta.ident.as_deref()
	}

	/// The child scope, when this variant anchors one.
	pub fn scope(&self) -> Option<Scope> {
		self.inner.scope.clone()
	}

	/// Downcasts the payload to a concrete type.
	pub fn payload<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.inner.payload).downcast::<T>().ok()
	}

	/// Redirect method table captured at bind time.
	pub fn methods(&self) -> &MethodTable {
		&self.inner.methods
	}

	/// Structural parents that are still alive.
	pub fn parents(&self) -> Vec<Variant> {
		self.inner
			.parents
			.iter()
			.filter_map(WeakVariant::upgrade)
			.collect()
	}

	/// Identity comparison: two handles to the same registration.
	pub fn same_as(&self, other: &Variant) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	pub fn downgrade(&self) -> WeakVariant {
		WeakVariant(Arc::downgrade(&self.inner))
	}
}

impl fmt::Debug for Variant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Variant")
			.field("kind", &self.inner.meta.kind)
			.field("ident", &self.inner.meta.ident)
			.field("qualified_path", &self.inner.meta.qualified_path)
			.finish()
	}
}

/// Weak counterpart to [`Variant`], used for owner and parent back-links.
#[derive(Clone)]
pub struct WeakVariant(Weak<VariantInner>);

impl WeakVariant {
	pub fn upgrade(&self) -> Option<Variant> {
		self.0.upgrade().map(|inner| Variant { inner })
	}
}

/// Builder for plain variants; the hierarchy binder assembles its own parts.
pub struct VariantBuilder {
	meta: VariantMeta,
	payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl VariantBuilder {
	/// Sets the fully-qualified lexical path.
	pub fn qualified_path(mut self, path: impl Into<String>) -> Self {
		self.meta.qualified_path = Some(path.into());
		self
	}

	/// Sets the enclosing-module identity.
	pub fn module(mut self, path: impl Into<String>, epoch: u64) -> Self {
		self.meta.module = Some(ModuleId::new(path, epoch));
		self
	}

	/// Sets the source-file origin.
	pub fn origin(mut self, origin: impl Into<PathBuf>) -> Self {
		self.meta.origin = Some(origin.into());
		self
	}

	/// Sets the payload.
	pub fn payload(mut self, payload: impl Any + Send + Sync) -> Self {
		self.payload = Some(Arc::new(payload));
		self
	}

	pub fn build(self) -> Variant {
		Variant::from_parts(
			self.meta,
			self.payload.unwrap_or_else(|| Arc::new(())),
			None,
			Vec::new(),
			MethodTable::default(),
		)
	}
}
