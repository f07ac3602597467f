//! Per-scope naming and collision configuration.
//!
//! Every scope owns exactly one [`ScopeConfig`], copied (never shared) from
//! the nearest ancestor scope at creation time and then locally overridden
//! through a [`ScopePatch`]. A variant's own canonical name is derived under
//! its parent's configuration, so the copy happens before the patch applies.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::format;

/// User-supplied rewrite applied after the mechanical formatting passes.
pub type NameTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Naming and collision policy for one scope.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
	/// Keep key case as-is; lookups stop folding too.
	pub case_sensitive: bool,
	/// Raw identifiers must start with this (empty = no-op).
	pub prefix: String,
	/// Remove the matched prefix from the derived key.
	pub strip_prefix: bool,
	/// Raw identifiers must end with this (empty = no-op).
	pub suffix: String,
	/// Remove the matched suffix from the derived key.
	pub strip_suffix: bool,
	/// Anchored validation pattern raw identifiers must fully match.
	#[serde(with = "pattern_serde")]
	pub pattern: Option<Regex>,
	/// Convert `PascalCase`/`camelCase` identifiers to `snake_case`.
	pub snake_case: bool,
	/// Replace underscores with hyphens.
	pub hyphen: bool,
	/// Arbitrary rewrite, applied last before case folding.
	#[serde(skip)]
	pub transform: Option<NameTransform>,
	/// Write a scope's owning variant into its own mapping.
	pub register_self: bool,
	/// Forward registrations past the immediate parent when the parent
	/// agrees.
	pub recursive: bool,
	/// Let a new registration displace an existing key.
	pub overwrite: bool,
	/// Split type-level vs instance-level dispatch for mapping-contract
	/// methods the variant body redefines.
	pub redirect: bool,
}

impl Default for ScopeConfig {
	fn default() -> Self {
		Self {
			case_sensitive: false,
			prefix: String::new(),
			strip_prefix: true,
			suffix: String::new(),
			strip_suffix: true,
			pattern: None,
			snake_case: false,
			hyphen: false,
			transform: None,
			register_self: false,
			recursive: true,
			overwrite: false,
			redirect: true,
		}
	}
}

impl fmt::Debug for ScopeConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopeConfig")
			.field("case_sensitive", &self.case_sensitive)
			.field("prefix", &self.prefix)
			.field("strip_prefix", &self.strip_prefix)
			.field("suffix", &self.suffix)
			.field("strip_suffix", &self.strip_suffix)
			.field("pattern", &self.pattern.as_ref().map(Regex::as_str))
			.field("snake_case", &self.snake_case)
			.field("hyphen", &self.hyphen)
			.field("transform", &self.transform.as_ref().map(|_| ".."))
			.field("register_self", &self.register_self)
			.field("recursive", &self.recursive)
			.field("overwrite", &self.overwrite)
			.field("redirect", &self.redirect)
			.finish()
	}
}

impl ScopeConfig {
	/// Derives the canonical key for `raw` under this configuration.
	pub fn format(&self, raw: &str) -> Result<String, RegistryError> {
		format::format(self, raw)
	}

	/// Folds a lookup key segment per `case_sensitive`.
	pub fn fold(&self, key: &str) -> String {
		if self.case_sensitive {
			key.to_string()
		} else {
			key.to_lowercase()
		}
	}

	/// Returns a copy with `patch` applied.
	pub fn patched(&self, patch: ScopePatch) -> Self {
		let mut config = self.clone();
		patch.apply(&mut config);
		config
	}
}

/// Declaration-site overrides for an inherited [`ScopeConfig`].
///
/// Unset fields leave the inherited value untouched.
#[derive(Clone, Default)]
pub struct ScopePatch {
	case_sensitive: Option<bool>,
	prefix: Option<String>,
	strip_prefix: Option<bool>,
	suffix: Option<String>,
	strip_suffix: Option<bool>,
	pattern: Option<Option<Regex>>,
	snake_case: Option<bool>,
	hyphen: Option<bool>,
	transform: Option<Option<NameTransform>>,
	register_self: Option<bool>,
	recursive: Option<bool>,
	overwrite: Option<bool>,
	redirect: Option<bool>,
}

macro_rules! patch_setter {
	($field:ident, bool) => {
		pub fn $field(mut self, value: bool) -> Self {
			self.$field = Some(value);
			self
		}
	};
	($field:ident, str) => {
		pub fn $field(mut self, value: impl Into<String>) -> Self {
			self.$field = Some(value.into());
			self
		}
	};
}

impl ScopePatch {
	pub fn new() -> Self {
		Self::default()
	}

	patch_setter!(case_sensitive, bool);
	patch_setter!(prefix, str);
	patch_setter!(strip_prefix, bool);
	patch_setter!(suffix, str);
	patch_setter!(strip_suffix, bool);
	patch_setter!(snake_case, bool);
	patch_setter!(hyphen, bool);
	patch_setter!(register_self, bool);
	patch_setter!(recursive, bool);
	patch_setter!(overwrite, bool);
	patch_setter!(redirect, bool);

	/// Sets the validation pattern, anchored to a full match.
	pub fn pattern(mut self, source: &str) -> Result<Self, regex::Error> {
		let anchored = Regex::new(&format!("^(?:{source})$"))?;
		self.pattern = Some(Some(anchored));
		Ok(self)
	}

	/// Clears an inherited validation pattern.
	pub fn clear_pattern(mut self) -> Self {
		self.pattern = Some(None);
		self
	}

	/// Sets the custom name transform.
	pub fn transform(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
		self.transform = Some(Some(Arc::new(f)));
		self
	}

	/// Clears an inherited transform.
	pub fn clear_transform(mut self) -> Self {
		self.transform = Some(None);
		self
	}

	/// Applies set fields onto `config` in place.
	pub fn apply(self, config: &mut ScopeConfig) {
		if let Some(v) = self.case_sensitive {
			config.case_sensitive = v;
		}
		if let Some(v) = self.prefix {
			config.prefix = v;
		}
		if let Some(v) = self.strip_prefix {
			config.strip_prefix = v;
		}
		if let Some(v) = self.suffix {
			config.suffix = v;
		}
		if let Some(v) = self.strip_suffix {
			config.strip_suffix = v;
		}
		if let Some(v) = self.pattern {
			config.pattern = v;
		}
		if let Some(v) = self.snake_case {
			config.snake_case = v;
		}
		if let Some(v) = self.hyphen {
			config.hyphen = v;
		}
		if let Some(v) = self.transform {
			config.transform = v;
		}
		if let Some(v) = self.register_self {
			config.register_self = v;
		}
		if let Some(v) = self.recursive {
			config.recursive = v;
		}
		if let Some(v) = self.overwrite {
			config.overwrite = v;
		}
		if let Some(v) = self.redirect {
			config.redirect = v;
		}
	}
}

mod pattern_serde {
	use regex::Regex;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(pattern: &Option<Regex>, ser: S) -> Result<S::Ok, S::Error> {
		pattern.as_ref().map(Regex::as_str).serialize(ser)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Regex>, D::Error> {
		Option::<String>::deserialize(de)?
			.map(|source| Regex::new(&source).map_err(serde::de::Error::custom))
			.transpose()
	}
}
