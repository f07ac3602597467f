//! Wiring a declared variant into its structural ancestor chain.
//!
//! # Role
//!
//! [`bind`] is the explicit call site standing in for an implicit
//! "new variant declared" hook: it copies configuration from the nearest
//! ancestor scope, derives the variant's canonical name under the inherited
//! (pre-override) rules, builds the variant's own scope, and performs the
//! initial root registration. Declaration macros and link-time collection
//! (see [`crate::submit_variant!`]) drive it so that declaring a variant is
//! enough to make it discoverable by name.
//!
//! # Invariants
//!
//! - A variant's own canonical name is governed by its parent's
//!   configuration, never its own overrides.
//! - The first variant of a hierarchy (no ancestors, or `base`) starts a
//!   fresh configuration; a non-root variant whose ancestors carry no scope
//!   is an engine bug surfaced as `Internal`.
//! - A prebuilt scope is reused as-is: owner rebinds, stale references
//!   rewrite, and no re-registration happens.

pub mod redirect;

pub use redirect::{MethodDispatch, MethodTable, ScopeMethod, UserMethod};

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::config::{ScopeConfig, ScopePatch};
use crate::error::RegistryError;
use crate::format::reject_separators;
use crate::scope::{AliasSpec, Scope};
use crate::variant::{Variant, VariantMeta};

/// Everything a variant declaration site supplies.
pub struct VariantDecl {
	meta: VariantMeta,
	payload: Arc<dyn Any + Send + Sync>,
	ancestors: Vec<Variant>,
	prebuilt: Option<Scope>,
	name: Option<String>,
	aliases: AliasSpec,
	skip: bool,
	base: bool,
	overrides: ScopePatch,
	methods: Vec<(ScopeMethod, UserMethod)>,
}

impl VariantDecl {
	pub fn new(meta: VariantMeta) -> Self {
		Self {
			meta,
			payload: Arc::new(()),
			ancestors: Vec::new(),
			prebuilt: None,
			name: None,
			aliases: AliasSpec::None,
			skip: false,
			base: false,
			overrides: ScopePatch::new(),
			methods: Vec::new(),
		}
	}

	pub fn payload(mut self, payload: impl Any + Send + Sync) -> Self {
		self.payload = Arc::new(payload);
		self
	}

	/// Adds a structural ancestor; order decides which scope's
	/// configuration is "nearest".
	pub fn ancestor(mut self, ancestor: &Variant) -> Self {
		self.ancestors.push(ancestor.clone());
		self
	}

	/// Reuses an already-built scope (class-reconstruction path).
	pub fn prebuilt_scope(mut self, scope: Scope) -> Self {
		self.prebuilt = Some(scope);
		self
	}

	/// Explicit canonical name; skips derivation and its checks.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn aliases(mut self, aliases: impl Into<AliasSpec>) -> Self {
		self.aliases = aliases.into();
		self
	}

	/// Builds the scope but skips the root registration.
	pub fn skip(mut self) -> Self {
		self.skip = true;
		self
	}

	/// Marks the new scope as a hierarchy root: it never receives
	/// registrations propagated from descendants.
	pub fn base(mut self) -> Self {
		self.base = true;
		self
	}

	/// Declaration-site configuration overrides, applied after name
	/// derivation.
	pub fn overrides(mut self, patch: ScopePatch) -> Self {
		self.overrides = patch;
		self
	}

	/// Records a body-redefined mapping-contract method for redirect
	/// resolution.
	pub fn method(mut self, method: ScopeMethod, user: impl Any + Send + Sync) -> Self {
		let user: UserMethod = Arc::new(user);
		self.methods.push((method, user));
		self
	}
}

/// Binds a declared variant into the hierarchy and performs its root
/// registration (unless `skip`).
pub fn bind(decl: VariantDecl) -> Result<Variant, RegistryError> {
	let parents = decl.ancestors.iter().map(Variant::downgrade).collect();

	// Class-reconstruction path: the body already carries a scope. Reuse it,
	// rewrite references from the previous owner, rebind, and do not
	// re-register.
	if let Some(scope) = decl.prebuilt {
		let table = MethodTable::new(scope.config().redirect, decl.methods);
		let variant =
			Variant::from_parts(decl.meta, decl.payload, Some(scope.clone()), parents, table);
		if let Some(previous) = scope.owner() {
			if !previous.same_as(&variant) {
				let mut visited = FxHashSet::default();
				scope.rereference(&previous, &variant, &mut visited);
			}
		}
		scope.bind_owner(&variant);
		return Ok(variant);
	}

	let inherited = decl
		.ancestors
		.iter()
		.find_map(Variant::scope)
		.map(|scope| scope.config().clone());
	let inherited = match inherited {
		Some(config) => config,
		None if decl.ancestors.is_empty() || decl.base => ScopeConfig::default(),
		None => {
			return Err(RegistryError::Internal(
				"no ancestor configuration found for a non-root variant".to_string(),
			));
		}
	};

	// The variant's own name falls under the inherited, pre-override rules.
	let registry_name = match &decl.name {
		Some(explicit) => {
			reject_separators(explicit, "name")?;
			explicit.clone()
		}
		None => {
			let ident = decl
				.meta
				.ident
				.as_deref()
				.ok_or(RegistryError::CannotDeriveName { kind: decl.meta.kind })?;
			inherited.format(ident)?
		}
	};

	let config = inherited.patched(decl.overrides);
	let scope = Scope::new(config, Some(registry_name.clone()), decl.base);
	let table = MethodTable::new(scope.config().redirect, decl.methods);

	let variant = Variant::from_parts(decl.meta, decl.payload, Some(scope.clone()), parents, table);
	scope.bind_owner(&variant);
	tracing::debug!(name = %registry_name, base = decl.base, "bound variant scope");

	if !decl.skip {
		scope.register(&variant, Some(&registry_name), decl.aliases, true)?;
	}

	Ok(variant)
}
