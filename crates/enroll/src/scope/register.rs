//! The registration, propagation, and rereference algorithm.
//!
//! # Invariants
//!
//! - Keys are unique per scope unless `overwrite` is on.
//! - Keys never contain `.` or `/` (reserved for addressed lookup).
//! - Validation completes for every key before the first write; a failed
//!   registration leaves the scope untouched.
//! - A key re-registration is legal only under `overwrite`, or when the new
//!   value is reimport-equivalent to the existing one — then every key
//!   pointing at the old value is rewritten, transitively up the ancestor
//!   chain, and the old value's scope owner is rebound exactly once.

use rustc_hash::FxHashSet;

use crate::error::RegistryError;
use crate::format::reject_separators;
use crate::reimport::is_reimport;
use crate::variant::{Variant, WeakVariant};

use super::Scope;

/// Aliases accompanying a registration: none, one, or many.
///
/// Aliases are not subject to the formatting pipeline; only the
/// path-separator rule applies to them.
#[derive(Clone, Debug, Default)]
pub enum AliasSpec {
	#[default]
	None,
	One(String),
	Many(Vec<String>),
}

impl AliasSpec {
	pub fn into_vec(self) -> Vec<String> {
		match self {
			Self::None => Vec::new(),
			Self::One(alias) => vec![alias],
			Self::Many(aliases) => aliases,
		}
	}
}

impl From<&str> for AliasSpec {
	fn from(alias: &str) -> Self {
		Self::One(alias.to_string())
	}
}

impl From<String> for AliasSpec {
	fn from(alias: String) -> Self {
		Self::One(alias)
	}
}

impl From<Vec<String>> for AliasSpec {
	fn from(aliases: Vec<String>) -> Self {
		Self::Many(aliases)
	}
}

impl From<&[&str]> for AliasSpec {
	fn from(aliases: &[&str]) -> Self {
		Self::Many(aliases.iter().map(|a| a.to_string()).collect())
	}
}

impl<const N: usize> From<[&str; N]> for AliasSpec {
	fn from(aliases: [&str; N]) -> Self {
		Self::Many(aliases.iter().map(|a| a.to_string()).collect())
	}
}

impl Scope {
	/// Registers `value` into this scope, subject to configuration.
	///
	/// With no explicit `name`, the canonical key derives from the value's
	/// own identifier under this scope's formatting rules. An explicit name
	/// skips derivation entirely; only the path-separator rule applies.
	///
	/// `root` is true on the initial declaration hop: propagation to the
	/// immediate parents is then unconditional, while further forwarding
	/// requires `recursive` on both sides of each hop.
	pub fn register(
		&self,
		value: &Variant,
		name: Option<&str>,
		aliases: impl Into<AliasSpec>,
		root: bool,
	) -> Result<(), RegistryError> {
		let canonical = match name {
			Some(explicit) => {
				reject_separators(explicit, "name")?;
				explicit.to_string()
			}
			None => {
				let ident = value
					.ident()
					.ok_or(RegistryError::CannotDeriveName { kind: value.kind() })?;
				let derived = self.config().format(ident)?;
				// A custom transform could smuggle a separator in.
				reject_separators(&derived, "name")?;
				derived
			}
		};

		// Normalize aliases: duplicates collide, the canonical key joins the
		// set when absent so canonical and alias registration share one path.
		let alias_list = aliases.into().into_vec();
		let mut seen = FxHashSet::default();
		for alias in &alias_list {
			reject_separators(alias, "alias")?;
			if !seen.insert(alias.clone()) {
				return Err(RegistryError::KeyCollision {
					key: alias.clone(),
					scope: self.label(),
				});
			}
		}
		let mut keys = alias_list;
		if !seen.contains(&canonical) {
			keys.insert(0, canonical.clone());
		}

		// Validate every key before writing any.
		let mut reimported: Vec<Variant> = Vec::new();
		{
			let state = self.shared.state.read();
			for key in &keys {
				let Some(existing) = state.entries.get(key) else {
					continue;
				};
				if existing.same_as(value) || self.config().overwrite {
					continue;
				}
				if is_reimport(existing.meta(), value.meta()) {
					if !reimported.iter().any(|old| old.same_as(existing)) {
						reimported.push(existing.clone());
					}
				} else {
					return Err(RegistryError::KeyCollision {
						key: key.clone(),
						scope: self.label(),
					});
				}
			}
		}

		for old in &reimported {
			tracing::debug!(
				scope = %self.label(),
				key = %canonical,
				"reimport detected, rewriting stale references"
			);
			let mut visited = FxHashSet::default();
			if let Some(old_scope) = old.scope() {
				old_scope.rereference(old, value, &mut visited);
				old_scope.rebind_owner_from(old, value);
			}
			self.rereference(old, value, &mut visited);
		}

		// Self-registration: a scope's owning variant is written into its own
		// mapping only when register_self is on; propagation still happens.
		{
			let mut state = self.shared.state.write();
			let is_self = state
				.owner
				.as_ref()
				.and_then(WeakVariant::upgrade)
				.is_some_and(|owner| owner.same_as(value));
			if !is_self || self.config().register_self {
				for key in &keys {
					state.entries.insert(key.clone(), value.clone());
				}
			}
		}
		tracing::trace!(scope = %self.label(), key = %canonical, root, "registered");

		// Propagate to ancestors. The root hop is unconditional; past it,
		// both the forwarding scope and the receiving scope must be
		// recursive. Base scopes never receive propagated registrations.
		// Each ancestor re-applies its own collision policy independently.
		if root || self.config().recursive {
			let Some(owner) = self.owner() else {
				return Ok(());
			};
			for parent in owner.parents() {
				let Some(parent_scope) = parent.scope() else {
					continue;
				};
				if parent_scope.is_base() {
					continue;
				}
				if root || parent_scope.config().recursive {
					tracing::trace!(
						from = %self.label(),
						to = %parent_scope.label(),
						key = %canonical,
						"propagating registration"
					);
					parent_scope.register(value, Some(&canonical), keys.clone(), false)?;
				}
			}
		}

		Ok(())
	}

	/// Rewrites every key currently mapped to `old` so it maps to `new`, in
	/// this scope and transitively in every ancestor scope. The visited set
	/// guards against revisiting a scope through converging ancestor paths.
	pub(crate) fn rereference(&self, old: &Variant, new: &Variant, visited: &mut FxHashSet<usize>) {
		if !visited.insert(self.ptr_id()) {
			return;
		}
		{
			let mut state = self.shared.state.write();
			for value in state.entries.values_mut() {
				if value.same_as(old) {
					*value = new.clone();
				}
			}
		}
		let Some(owner) = self.owner() else {
			return;
		};
		for parent in owner.parents() {
			let Some(parent_scope) = parent.scope() else {
				continue;
			};
			if parent_scope.is_base() {
				continue;
			}
			parent_scope.rereference(old, new, visited);
		}
	}
}
