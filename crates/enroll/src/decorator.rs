//! Standalone registries driven from call sites.
//!
//! A [`DecoratorRegistry`] wraps a free-standing [`Scope`] with no owner and
//! no ancestor chain: registration never propagates. It supports direct
//! registration, parametrized registration through [`Pending`], bulk
//! construction, a link-time inventory sweep, and traversal of explicit
//! [`Namespace`] manifests (the auditable stand-in for reflecting over a
//! loaded module).

use std::path::PathBuf;

use crate::config::ScopeConfig;
use crate::error::RegistryError;
use crate::reimport::normalize_path;
use crate::scope::{AliasSpec, Fallback, Scope};
use crate::variant::Variant;

/// Candidate entries of a namespace-like object, with an explicit origin
/// path instead of runtime reflection.
#[derive(Debug)]
pub struct Namespace {
	ident: String,
	origin: Option<PathBuf>,
	entries: Vec<(String, NamespaceEntry)>,
}

#[derive(Debug)]
pub enum NamespaceEntry {
	/// A plain value registered under its entry name.
	Item(Variant),
	/// A nested namespace, traversed only under `recursive` and only when
	/// its origin stays inside the parent's directory.
	Nested(Namespace),
}

impl Namespace {
	/// A namespace with no resolvable origin (a builtin). Registering it
	/// directly fails; nested, it is silently skipped.
	pub fn new(ident: impl Into<String>) -> Self {
		Self {
			ident: ident.into(),
			origin: None,
			entries: Vec::new(),
		}
	}

	pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
		self.origin = Some(origin.into());
		self
	}

	/// Adds a value entry under `name`.
	pub fn item(mut self, name: impl Into<String>, value: Variant) -> Self {
		self.entries.push((name.into(), NamespaceEntry::Item(value)));
		self
	}

	/// Adds a nested namespace, keyed by its own identifier.
	pub fn nested(mut self, namespace: Namespace) -> Self {
		self.entries
			.push((namespace.ident.clone(), NamespaceEntry::Nested(namespace)));
		self
	}

	pub fn ident(&self) -> &str {
		&self.ident
	}

	pub fn origin(&self) -> Option<&PathBuf> {
		self.origin.as_ref()
	}

	pub fn entries(&self) -> &[(String, NamespaceEntry)] {
		&self.entries
	}
}

/// Link-time registration wrapper; declare with [`crate::submit_variant!`]
/// and sweep in with [`DecoratorRegistry::extend_inventory`].
pub struct VariantReg(pub fn() -> Variant);

inventory::collect!(VariantReg);

/// A standalone scope usable without a hierarchy.
#[derive(Debug, Clone)]
pub struct DecoratorRegistry {
	scope: Scope,
}

impl Default for DecoratorRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl DecoratorRegistry {
	pub fn new() -> Self {
		Self::with_config(ScopeConfig::default())
	}

	pub fn with_config(config: ScopeConfig) -> Self {
		Self {
			scope: Scope::standalone(config),
		}
	}

	/// Bulk construction from an initial collection.
	pub fn seeded(
		config: ScopeConfig,
		values: impl IntoIterator<Item = Variant>,
	) -> Result<Self, RegistryError> {
		let registry = Self::with_config(config);
		for value in values {
			registry.register(&value)?;
		}
		Ok(registry)
	}

	/// Registers `value` under its derived name.
	pub fn register(&self, value: &Variant) -> Result<(), RegistryError> {
		self.scope.register(value, None, AliasSpec::None, true)
	}

	/// Registers `value` under an explicit key, skipping derivation.
	pub fn insert(&self, key: &str, value: &Variant) -> Result<(), RegistryError> {
		self.scope.register(value, Some(key), AliasSpec::None, true)
	}

	/// Parametrized registration: name and aliases supplied ahead of the
	/// value.
	pub fn with_opts(
		&self,
		name: Option<&str>,
		aliases: impl Into<AliasSpec>,
	) -> Pending<'_> {
		Pending {
			registry: self,
			name: name.map(str::to_string),
			aliases: aliases.into(),
		}
	}

	/// Registers every non-underscore entry of `namespace`.
	///
	/// Nested namespaces are traversed only when `recursive` is on and the
	/// nested origin directory stays inside the parent's origin directory,
	/// so traversal cannot escape into unrelated namespaces. Each traversed
	/// nested namespace lands in a child registry inheriting this one's
	/// configuration and registers under its entry name, reachable through
	/// path lookup.
	pub fn register_namespace(&self, namespace: &Namespace) -> Result<(), RegistryError> {
		let Some(origin) = &namespace.origin else {
			return Err(RegistryError::CannotRegisterBuiltin {
				ident: namespace.ident.clone(),
			});
		};
		let parent_dir = normalize_path(origin.parent().unwrap_or_else(|| origin.as_path()));

		for (name, entry) in &namespace.entries {
			if name.starts_with('_') {
				continue;
			}
			match entry {
				NamespaceEntry::Item(value) => {
					self.scope.register(value, Some(name), AliasSpec::None, true)?;
				}
				NamespaceEntry::Nested(sub) => {
					if !self.scope.config().recursive {
						continue;
					}
					// No origin means a builtin; skipped, not an error.
					let Some(sub_origin) = &sub.origin else {
						continue;
					};
					let sub_dir =
						normalize_path(sub_origin.parent().unwrap_or_else(|| sub_origin.as_path()));
					if !sub_dir.starts_with(&parent_dir) {
						tracing::debug!(
							namespace = %namespace.ident,
							nested = %sub.ident,
							"skipping nested namespace outside parent origin"
						);
						continue;
					}
					let child = DecoratorRegistry::with_config(self.scope.config().clone());
					child.register_namespace(sub)?;
					let nested =
						Variant::namespace(name.clone(), sub.origin.clone(), child.scope.clone());
					self.scope.register(&nested, Some(name), AliasSpec::None, true)?;
				}
			}
		}
		Ok(())
	}

	/// Sweeps every [`VariantReg`] submitted across the link graph into this
	/// registry. Returns how many registered.
	pub fn extend_inventory(&self) -> Result<usize, RegistryError> {
		let mut count = 0;
		for reg in inventory::iter::<VariantReg> {
			self.register(&(reg.0)())?;
			count += 1;
		}
		Ok(count)
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	// Mapping contract, delegated.

	pub fn get(&self, key: &str) -> Option<Variant> {
		self.scope.get(key)
	}

	pub fn get_or(&self, key: &str, fallback: impl Into<Fallback>) -> Option<Variant> {
		self.scope.get_or(key, fallback)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.scope.contains(key)
	}

	pub fn len(&self) -> usize {
		self.scope.len()
	}

	pub fn is_empty(&self) -> bool {
		self.scope.is_empty()
	}

	pub fn keys(&self) -> Vec<String> {
		self.scope.keys()
	}

	pub fn values(&self) -> Vec<Variant> {
		self.scope.values()
	}

	pub fn entries(&self) -> Vec<(String, Variant)> {
		self.scope.entries()
	}

	pub fn clear(&self) {
		self.scope.clear()
	}
}

/// A registration whose name/aliases arrived ahead of its value.
#[derive(Debug)]
pub struct Pending<'r> {
	registry: &'r DecoratorRegistry,
	name: Option<String>,
	aliases: AliasSpec,
}

impl Pending<'_> {
	/// Completes the registration with the pending value.
	pub fn apply(&self, value: &Variant) -> Result<(), RegistryError> {
		self.registry
			.scope
			.register(value, self.name.as_deref(), self.aliases.clone(), true)
	}

	/// Completes the registration with a namespace target. Aliases never
	/// combine with namespaces; the pending name is ignored because the
	/// namespace's entries register under their own names.
	pub fn apply_namespace(&self, namespace: &Namespace) -> Result<(), RegistryError> {
		if !matches!(self.aliases, AliasSpec::None) {
			return Err(RegistryError::ModuleAlias);
		}
		self.registry.register_namespace(namespace)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ScopePatch;
	use crate::variant::VariantKind;

	fn callable(ident: &str) -> Variant {
		Variant::builder(ident, VariantKind::Callable)
			.qualified_path(format!("demo::{ident}"))
			.module("demo", 0)
			.origin("/pkg/demo.rs")
			.payload(ident.to_string())
			.build()
	}

	#[test]
	fn direct_registration_derives_names() {
		let registry = DecoratorRegistry::new();
		registry.register(&callable("foo")).unwrap();
		registry.register(&callable("bar")).unwrap();

		assert_eq!(registry.keys(), vec!["foo", "bar"]);
		assert_eq!(registry.len(), 2);
		assert!(registry.contains("foo"));
	}

	#[test]
	fn parametrized_registration_applies_pending_options() {
		let registry = DecoratorRegistry::new();
		registry
			.with_opts(Some("o2"), ["air"])
			.apply(&callable("oxygen"))
			.unwrap();

		assert_eq!(registry.keys(), vec!["o2", "air"]);
		assert!(registry.get("air").unwrap().same_as(&registry.get("o2").unwrap()));
	}

	#[test]
	fn seeded_bulk_construction() {
		let registry = DecoratorRegistry::seeded(
			ScopeConfig::default(),
			[callable("foo"), callable("bar")],
		)
		.unwrap();
		assert_eq!(registry.keys(), vec!["foo", "bar"]);
	}

	#[test]
	fn insert_uses_explicit_key() {
		let registry = DecoratorRegistry::new();
		registry.insert("renamed", &callable("foo")).unwrap();
		assert_eq!(registry.keys(), vec!["renamed"]);
	}

	#[test]
	fn duplicate_registration_collides() {
		let registry = DecoratorRegistry::new();
		registry.register(&callable("foo")).unwrap();
		let err = registry.register(&callable("foo")).unwrap_err();
		assert!(matches!(err, RegistryError::KeyCollision { .. }));
	}

	#[test]
	fn anonymous_value_cannot_derive_name() {
		let registry = DecoratorRegistry::new();
		let bare = Variant::anonymous(VariantKind::Callable, ());
		let err = registry.register(&bare).unwrap_err();
		assert!(matches!(err, RegistryError::CannotDeriveName { .. }));
	}

	#[test]
	fn namespace_traversal_registers_public_entries() {
		let namespace = Namespace::new("toolbox")
			.with_origin("/pkg/toolbox/mod.rs")
			.item("hammer", callable("hammer"))
			.item("_private", callable("hidden"))
			.item("saw", callable("saw"));

		let registry = DecoratorRegistry::new();
		registry.register_namespace(&namespace).unwrap();
		assert_eq!(registry.keys(), vec!["hammer", "saw"]);
	}

	#[test]
	fn namespace_without_origin_is_builtin() {
		let registry = DecoratorRegistry::new();
		let err = registry.register_namespace(&Namespace::new("sys")).unwrap_err();
		assert!(matches!(err, RegistryError::CannotRegisterBuiltin { .. }));
	}

	#[test]
	fn aliases_never_combine_with_namespace_targets() {
		let registry = DecoratorRegistry::new();
		let namespace = Namespace::new("toolbox").with_origin("/pkg/toolbox/mod.rs");
		let err = registry
			.with_opts(None, ["tb"])
			.apply_namespace(&namespace)
			.unwrap_err();
		assert!(matches!(err, RegistryError::ModuleAlias));
	}

	#[test]
	fn nested_namespaces_register_under_child_registries() {
		let nested = Namespace::new("drills")
			.with_origin("/pkg/toolbox/drills/mod.rs")
			.item("auger", callable("auger"));
		let namespace = Namespace::new("toolbox")
			.with_origin("/pkg/toolbox/mod.rs")
			.item("hammer", callable("hammer"))
			.nested(nested);

		let registry = DecoratorRegistry::new();
		registry.register_namespace(&namespace).unwrap();

		assert_eq!(registry.keys(), vec!["hammer", "drills"]);
		// Path lookup descends into the nested registry.
		assert!(registry.get("drills.auger").is_some());
		assert!(registry.get("drills/auger").is_some());
	}

	#[test]
	fn nested_traversal_respects_recursive_flag() {
		let nested = Namespace::new("drills")
			.with_origin("/pkg/toolbox/drills/mod.rs")
			.item("auger", callable("auger"));
		let namespace = Namespace::new("toolbox")
			.with_origin("/pkg/toolbox/mod.rs")
			.nested(nested);

		let registry = DecoratorRegistry::with_config(
			ScopeConfig::default().patched(ScopePatch::new().recursive(false)),
		);
		registry.register_namespace(&namespace).unwrap();
		assert!(registry.is_empty());
	}

	#[test]
	fn nested_traversal_cannot_escape_parent_origin() {
		let foreign = Namespace::new("elsewhere")
			.with_origin("/other/elsewhere/mod.rs")
			.item("stray", callable("stray"));
		let namespace = Namespace::new("toolbox")
			.with_origin("/pkg/toolbox/mod.rs")
			.nested(foreign);

		let registry = DecoratorRegistry::new();
		registry.register_namespace(&namespace).unwrap();
		assert!(registry.is_empty());
	}

	#[test]
	fn origin_less_nested_namespace_is_skipped_silently() {
		let namespace = Namespace::new("toolbox")
			.with_origin("/pkg/toolbox/mod.rs")
			.nested(Namespace::new("builtin_child"))
			.item("hammer", callable("hammer"));

		let registry = DecoratorRegistry::new();
		registry.register_namespace(&namespace).unwrap();
		assert_eq!(registry.keys(), vec!["hammer"]);
	}

	#[test]
	fn clear_preserves_registry_identity() {
		let registry = DecoratorRegistry::new();
		registry.register(&callable("foo")).unwrap();
		let scope_before = registry.scope().clone();
		registry.clear();
		assert!(registry.is_empty());
		assert!(scope_before.same_scope(registry.scope()));
		// The emptied registry accepts the key again.
		registry.register(&callable("foo")).unwrap();
	}
}
