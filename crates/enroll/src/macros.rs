//! Declaration macros.
//!
//! These are the explicit call sites standing in for an implicit
//! "new variant declared" hook: [`variant!`] stamps a value with its
//! declaration-site provenance, and [`submit_variant!`] additionally submits
//! it for link-time collection so any registry can sweep it in with
//! [`crate::DecoratorRegistry::extend_inventory`].

/// Builds a [`crate::Variant`] capturing declaration-site provenance:
/// qualified path, enclosing module identity, and source file.
///
/// The optional `epoch` distinguishes re-executions of the same module
/// (hot reload); it defaults to `0`.
///
/// ```
/// use enroll::VariantKind;
///
/// fn double(x: i64) -> i64 {
/// 	x * 2
/// }
///
/// let v = enroll::variant!(double, VariantKind::Callable, double as fn(i64) -> i64);
/// assert_eq!(v.ident(), Some("double"));
/// ```
#[macro_export]
macro_rules! variant {
	($ident:ident, $kind:expr, $payload:expr) => {
		$crate::variant!($ident, $kind, $payload, epoch: 0)
	};
	($ident:ident, $kind:expr, $payload:expr, epoch: $epoch:expr) => {
		$crate::Variant::builder(stringify!($ident), $kind)
			.qualified_path(concat!(module_path!(), "::", stringify!($ident)))
			.module(module_path!(), $epoch)
			.origin(file!())
			.payload($payload)
			.build()
	};
}

/// Declares a variant for link-time collection.
///
/// Expands to a constructor function plus an `inventory` submission, so the
/// declaration alone makes the variant discoverable by name once a registry
/// sweeps the inventory.
#[macro_export]
macro_rules! submit_variant {
	($ident:ident, $kind:expr, $payload:expr) => {
		$crate::paste::paste! {
			fn [<__enroll_submit_ $ident>]() -> $crate::Variant {
				$crate::variant!($ident, $kind, $payload)
			}

			$crate::inventory::submit! {
				$crate::VariantReg([<__enroll_submit_ $ident>])
			}
		}
	};
}
