//! Key derivation from raw identifiers.
//!
//! # Role
//!
//! This module implements the fixed formatting pipeline that turns a raw
//! identifier (`"OxygenSensor"`) into a canonical lookup key (`"oxygen"`),
//! and the path splitter used by addressed lookup.
//!
//! Pipeline order is load-bearing: pattern check, prefix check+strip, suffix
//! check+strip, snake_case, hyphen, custom transform, case fold. The custom
//! transform runs last before folding so user rewrites see the mechanical
//! passes' output.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ScopeConfig;
use crate::error::RegistryError;

static SNAKE_PASS_BOUNDARY: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").unwrap());
static SNAKE_PASS_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new("__([A-Z])").unwrap());
static SNAKE_PASS_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").unwrap());

/// Converts `PascalCase`/`camelCase` to `snake_case`.
///
/// Three boundary-insertion passes: split before an upper-then-lower run,
/// collapse the double underscore that pass one leaves behind an existing
/// `_`, then split a lower-or-digit/upper boundary. Already-snaked input
/// passes through unchanged.
pub fn to_snake_case(name: &str) -> String {
	let name = SNAKE_PASS_BOUNDARY.replace_all(name, "${1}_${2}");
	let name = SNAKE_PASS_COLLAPSE.replace_all(&name, "_${1}");
	let name = SNAKE_PASS_TAIL.replace_all(&name, "${1}_${2}");
	name.to_lowercase()
}

/// Splits an addressed key into lookup segments.
///
/// `.` and `/` are interchangeable separators: `"a.b"` and `"a/b"` resolve
/// identically.
pub fn key_split(key: &str) -> Vec<&str> {
	key.split(['.', '/']).collect()
}

/// Returns an error if `key` contains a reserved path separator.
pub(crate) fn reject_separators(key: &str, what: &str) -> Result<(), RegistryError> {
	if key.contains(['.', '/']) {
		return Err(RegistryError::invalid_name(
			key,
			format!("{what} cannot contain \".\" or \"/\""),
		));
	}
	Ok(())
}

/// Derives the canonical key for `raw` under `config`.
///
/// Fails with [`RegistryError::InvalidName`] when `raw` misses the configured
/// pattern, prefix, or suffix. Empty prefix/suffix are always-satisfied
/// no-ops.
pub fn format(config: &ScopeConfig, raw: &str) -> Result<String, RegistryError> {
	if let Some(pattern) = &config.pattern {
		if !pattern.is_match(raw) {
			return Err(RegistryError::invalid_name(
				raw,
				format!("must match pattern {:?}", pattern.as_str()),
			));
		}
	}

	let mut name = raw;

	if !name.starts_with(config.prefix.as_str()) {
		return Err(RegistryError::invalid_name(
			raw,
			format!("must start with {:?}", config.prefix),
		));
	}
	if config.strip_prefix && !config.prefix.is_empty() {
		name = &name[config.prefix.len()..];
	}

	if !name.ends_with(config.suffix.as_str()) {
		return Err(RegistryError::invalid_name(
			raw,
			format!("must end with {:?}", config.suffix),
		));
	}
	if config.strip_suffix && !config.suffix.is_empty() {
		name = &name[..name.len() - config.suffix.len()];
	}

	let mut name = if config.snake_case {
		to_snake_case(name)
	} else {
		name.to_string()
	};

	if config.hyphen {
		name = name.replace('_', "-");
	}

	if let Some(transform) = &config.transform {
		name = transform(&name);
	}

	Ok(config.fold(&name))
}
