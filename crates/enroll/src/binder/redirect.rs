//! Redirect dispatch for mapping-contract method names.
//!
//! A variant body may redefine a method whose name the scope's mapping
//! contract also uses. A single overloaded name cannot serve both, so the
//! ambiguity is resolved by two explicitly named operations: type-level
//! resolution and instance-level resolution. With `redirect` on, a redefined
//! name dispatches to the scope implementation at type level and to the user
//! closure at instance level; with `redirect` off the user closure wins at
//! both levels.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

/// The fixed method-name set subject to redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeMethod {
	Lookup,
	Size,
	Contains,
	Iter,
	Keys,
	Values,
	Items,
	GetOr,
	Clear,
}

impl ScopeMethod {
	pub const ALL: [ScopeMethod; 9] = [
		Self::Lookup,
		Self::Size,
		Self::Contains,
		Self::Iter,
		Self::Keys,
		Self::Values,
		Self::Items,
		Self::GetOr,
		Self::Clear,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::Lookup => "lookup",
			Self::Size => "size",
			Self::Contains => "contains",
			Self::Iter => "iter",
			Self::Keys => "keys",
			Self::Values => "values",
			Self::Items => "items",
			Self::GetOr => "get_or",
			Self::Clear => "clear",
		}
	}
}

impl fmt::Display for ScopeMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Opaque handle to a body-defined method. The engine resolves which side
/// dispatch lands on; invoking the handle is the embedder's concern.
pub type UserMethod = Arc<dyn Any + Send + Sync>;

/// Where an invocation of a mapping-contract method name lands.
#[derive(Clone)]
pub enum MethodDispatch {
	/// The scope's own implementation.
	Scope,
	/// The body-defined method.
	User(UserMethod),
}

impl fmt::Debug for MethodDispatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scope => f.write_str("MethodDispatch::Scope"),
			Self::User(_) => f.write_str("MethodDispatch::User(..)"),
		}
	}
}

/// Body-redefined mapping-contract methods captured at bind time.
#[derive(Clone, Default)]
pub struct MethodTable {
	redirect: bool,
	overrides: HashMap<ScopeMethod, UserMethod>,
}

impl MethodTable {
	pub(crate) fn new(redirect: bool, overrides: Vec<(ScopeMethod, UserMethod)>) -> Self {
		Self {
			redirect,
			overrides: overrides.into_iter().collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.overrides.is_empty()
	}

	pub fn has_override(&self, method: ScopeMethod) -> bool {
		self.overrides.contains_key(&method)
	}

	/// Resolution for an invocation at the type level.
	pub fn resolve_type_level(&self, method: ScopeMethod) -> MethodDispatch {
		match self.overrides.get(&method) {
			Some(user) if !self.redirect => MethodDispatch::User(Arc::clone(user)),
			_ => MethodDispatch::Scope,
		}
	}

	/// Resolution for an invocation on an instance.
	pub fn resolve_instance(&self, method: ScopeMethod) -> MethodDispatch {
		match self.overrides.get(&method) {
			Some(user) => MethodDispatch::User(Arc::clone(user)),
			None => MethodDispatch::Scope,
		}
	}
}

impl fmt::Debug for MethodTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<&'static str> = self.overrides.keys().map(|m| m.name()).collect();
		names.sort_unstable();
		f.debug_struct("MethodTable")
			.field("redirect", &self.redirect)
			.field("overrides", &names)
			.finish()
	}
}
