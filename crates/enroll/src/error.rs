//! Error taxonomy for registration failures.
//!
//! Every error is raised synchronously at the violating call site; nothing is
//! retried. A lookup miss is `None`, not an error, so callers can fall back to
//! defaults without matching on failure variants.

use crate::variant::VariantKind;

/// Failure raised by registration, binding, or namespace traversal.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
	/// A raw identifier, explicit name, or alias failed a formatting rule.
	#[error("invalid name {name:?}: {reason}")]
	InvalidName { name: String, reason: String },

	/// No explicit name was supplied and the value exposes no identifier.
	#[error("cannot derive a name from a bare {kind} value")]
	CannotDeriveName { kind: VariantKind },

	/// The key is taken, overwrite is off, and the values are not
	/// reimport-equivalent.
	#[error("{key:?} already registered in {scope}")]
	KeyCollision { key: String, scope: String },

	/// A namespace traversal target has no resolvable source origin.
	#[error("cannot register builtin namespace {ident:?} (no source origin)")]
	CannotRegisterBuiltin { ident: String },

	/// Aliases were supplied alongside a namespace target.
	#[error("aliases cannot accompany a namespace target")]
	ModuleAlias,

	/// Engine invariant violation. Seeing this is a bug in `enroll`, never
	/// an expected caller-facing failure.
	#[error("internal invariant violated: {0}")]
	Internal(String),
}

impl RegistryError {
	pub(crate) fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidName {
			name: name.into(),
			reason: reason.into(),
		}
	}
}
