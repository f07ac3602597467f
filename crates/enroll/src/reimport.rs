//! Reimport detection.
//!
//! # Role
//!
//! Decides whether two same-named registration candidates are one logical
//! definition re-executed (hot reload) rather than a genuine naming
//! collision. All rules must hold, evaluated in order, short-circuiting to
//! "genuine collision":
//!
//! | rule | effect |
//! |------|--------|
//! | kind | both types, or both callables; never cross-kind |
//! | identifier | identical simple identifier |
//! | qualified path | identical fully-qualified lexical path |
//! | module identity | **different**; same module means two definitions in one pass |
//! | origin | both resolvable, lexically canonicalized, identical |
//!
//! Definition line numbers are deliberately excluded so source edits that
//! shift positions across reloads still count as the same definition. An
//! unresolvable origin on either side fails safe to "not a reimport".

use std::path::{Component, Path, PathBuf};

use crate::variant::VariantMeta;

/// Returns true when `incoming` is a re-execution of `existing`.
pub fn is_reimport(existing: &VariantMeta, incoming: &VariantMeta) -> bool {
	if existing.kind != incoming.kind {
		return false;
	}

	match (&existing.ident, &incoming.ident) {
		(Some(a), Some(b)) if a == b => {}
		_ => return false,
	}

	match (&existing.qualified_path, &incoming.qualified_path) {
		(Some(a), Some(b)) if a == b => {}
		_ => return false,
	}

	match (&existing.module, &incoming.module) {
		(Some(a), Some(b)) if a != b => {}
		_ => return false,
	}

	match (&existing.origin, &incoming.origin) {
		(Some(a), Some(b)) => normalize_path(a) == normalize_path(b),
		_ => false,
	}
}

/// Lexically canonicalizes a path: drops `.`, resolves `..` against
/// preceding components, never touches the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !out.pop() {
					out.push(component);
				}
			}
			other => out.push(other),
		}
	}
	out
}
