//! Hierarchical key→variant containers.
//!
//! # Mental model
//!
//! | Type | Role |
//! |------|------|
//! | [`Scope`] | Insertion-ordered mapping plus the registration algorithm. |
//! | [`AliasSpec`] | Zero/one/many aliases accompanying a registration. |
//! | [`Fallback`] | Default for [`Scope::get_or`]: another key, or a value. |
//!
//! A scope is created once, at variant-declaration time, with a config copied
//! from its nearest structural ancestor; it is mutated incrementally as
//! descendants declare themselves and lives as long as its owning variant.
//! The `base` flag marks a hierarchy root that must never receive
//! registrations propagated up from descendants; it is permanent.
//!
//! Reads and writes lock per operation; no lock is held across a propagation
//! hop into another scope. Concurrent mutation is unsupported and must be
//! serialized by the caller.

mod register;
#[cfg(test)]
mod tests;

pub use register::AliasSpec;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::ScopeConfig;
use crate::format::key_split;
use crate::variant::{Variant, WeakVariant};

pub(crate) struct ScopeShared {
	config: ScopeConfig,
	name: Option<String>,
	base: bool,
	state: RwLock<ScopeState>,
}

#[derive(Default)]
struct ScopeState {
	entries: IndexMap<String, Variant>,
	owner: Option<WeakVariant>,
}

/// One registry container plus its configuration.
#[derive(Clone)]
pub struct Scope {
	shared: Arc<ScopeShared>,
}

/// Default for [`Scope::get_or`].
#[derive(Clone, Debug)]
pub enum Fallback {
	/// Resolve this key instead, recursively.
	Key(String),
	/// Return this variant as-is.
	Value(Variant),
}

impl From<&str> for Fallback {
	fn from(key: &str) -> Self {
		Self::Key(key.to_string())
	}
}

impl From<String> for Fallback {
	fn from(key: String) -> Self {
		Self::Key(key)
	}
}

impl From<Variant> for Fallback {
	fn from(value: Variant) -> Self {
		Self::Value(value)
	}
}

/// Serializable point-in-time view of a scope, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeSnapshot {
	pub name: Option<String>,
	pub base: bool,
	pub keys: Vec<String>,
}

impl Scope {
	/// Creates a scope with its own (already copied) configuration.
	pub fn new(config: ScopeConfig, name: Option<String>, base: bool) -> Self {
		Self {
			shared: Arc::new(ScopeShared {
				config,
				name,
				base,
				state: RwLock::new(ScopeState::default()),
			}),
		}
	}

	/// A free-standing scope: no name, not a hierarchy root.
	pub fn standalone(config: ScopeConfig) -> Self {
		Self::new(config, None, false)
	}

	pub fn config(&self) -> &ScopeConfig {
		&self.shared.config
	}

	/// This scope's own canonical key in its parent, if any.
	pub fn name(&self) -> Option<&str> {
		self.shared.name.as_deref()
	}

	/// True for hierarchy roots that never receive propagated registrations.
	pub fn is_base(&self) -> bool {
		self.shared.base
	}

	/// The variant this scope belongs to, while it is alive.
	pub fn owner(&self) -> Option<Variant> {
		self.shared.state.read().owner.as_ref().and_then(WeakVariant::upgrade)
	}

	pub(crate) fn bind_owner(&self, owner: &Variant) {
		self.shared.state.write().owner = Some(owner.downgrade());
	}

	/// Rebinds the owner back-reference, but only away from `old`.
	pub(crate) fn rebind_owner_from(&self, old: &Variant, new: &Variant) {
		let mut state = self.shared.state.write();
		let current = state.owner.as_ref().and_then(WeakVariant::upgrade);
		if current.is_some_and(|owner| owner.same_as(old)) {
			state.owner = Some(new.downgrade());
		}
	}

	/// Identity of the backing allocation, for visited-set guards.
	pub(crate) fn ptr_id(&self) -> usize {
		Arc::as_ptr(&self.shared) as usize
	}

	/// True when both handles refer to one scope.
	pub fn same_scope(&self, other: &Scope) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}

	/// Number of keys registered directly in this scope.
	pub fn len(&self) -> usize {
		self.shared.state.read().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Resolves `key`, splitting on `.`/`/` and descending through child
	/// scopes. Each segment folds per the configuration of the scope being
	/// indexed at that level. `None` at the first unresolved segment.
	pub fn get(&self, key: &str) -> Option<Variant> {
		let mut segments = key_split(key).into_iter();
		let mut current = self.get_segment(segments.next()?)?;
		for segment in segments {
			current = current.scope()?.get_segment(segment)?;
		}
		Some(current)
	}

	fn get_segment(&self, segment: &str) -> Option<Variant> {
		let key = self.shared.config.fold(segment);
		self.shared.state.read().entries.get(&key).cloned()
	}

	/// Full-path membership test.
	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Resolves `key`, falling back to another key (resolved recursively) or
	/// a ready value.
	pub fn get_or(&self, key: &str, fallback: impl Into<Fallback>) -> Option<Variant> {
		self.get(key).or_else(|| match fallback.into() {
			Fallback::Key(other) => self.get(&other),
			Fallback::Value(value) => Some(value),
		})
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> Vec<String> {
		self.shared.state.read().entries.keys().cloned().collect()
	}

	/// Values in insertion order; a variant reachable under several keys
	/// enumerates once per key.
	pub fn values(&self) -> Vec<Variant> {
		self.shared.state.read().entries.values().cloned().collect()
	}

	/// Key/value pairs in insertion order.
	pub fn entries(&self) -> Vec<(String, Variant)> {
		self.shared
			.state
			.read()
			.entries
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Empties the mapping. Scope identity, config, name, and owner are
	/// preserved.
	pub fn clear(&self) {
		self.shared.state.write().entries.clear();
	}

	/// Suggests the closest registered key, for did-you-mean diagnostics.
	pub fn closest_key(&self, key: &str) -> Option<String> {
		let folded = self.shared.config.fold(key);
		self.keys()
			.into_iter()
			.min_by_key(|k| strsim::levenshtein(&folded, k))
			.filter(|k| strsim::levenshtein(&folded, k) <= 3)
	}

	pub fn snapshot(&self) -> ScopeSnapshot {
		ScopeSnapshot {
			name: self.shared.name.clone(),
			base: self.shared.base,
			keys: self.keys(),
		}
	}

	pub(crate) fn label(&self) -> String {
		self.shared.name.clone().unwrap_or_else(|| "scope".to_string())
	}
}

impl fmt::Debug for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scope")
			.field("name", &self.shared.name)
			.field("base", &self.shared.base)
			.field("keys", &self.keys())
			.finish()
	}
}
