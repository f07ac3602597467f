use crate::binder::{VariantDecl, bind};
use crate::config::{ScopeConfig, ScopePatch};
use crate::error::RegistryError;
use crate::scope::{AliasSpec, Scope};
use crate::variant::{ModuleId, Variant, VariantKind, VariantMeta};

fn type_meta(ident: &str, module: &str, epoch: u64) -> VariantMeta {
	VariantMeta {
		kind: VariantKind::Type,
		ident: Some(ident.to_string()),
		qualified_path: Some(format!("{module}::{ident}")),
		module: Some(ModuleId::new(module, epoch)),
		origin: Some(format!("/src/{module}.rs").into()),
	}
}

fn declare(ident: &str, ancestors: &[&Variant], patch: ScopePatch) -> Result<Variant, RegistryError> {
	let mut decl = VariantDecl::new(type_meta(ident, "mons", 0)).overrides(patch);
	for ancestor in ancestors {
		decl = decl.ancestor(ancestor);
	}
	bind(decl)
}

/// Pokemon ← {Charmander, Pikachu ← SurfingPikachu}, root configured by
/// `patch`, children inheriting.
fn construct_chain(patch: ScopePatch) -> (Variant, Variant, Variant, Variant) {
	let pokemon = declare("Pokemon", &[], patch).unwrap();
	let charmander = declare("Charmander", &[&pokemon], ScopePatch::new()).unwrap();
	let pikachu = declare("Pikachu", &[&pokemon], ScopePatch::new()).unwrap();
	let surfing = declare("SurfingPikachu", &[&pikachu], ScopePatch::new()).unwrap();
	(pokemon, charmander, pikachu, surfing)
}

fn scope_of(variant: &Variant) -> Scope {
	variant.scope().unwrap()
}

#[test]
fn defaults_register_whole_chain() {
	let (pokemon, _, pikachu, surfing) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);

	assert_eq!(root.keys(), vec!["charmander", "pikachu", "surfingpikachu"]);
	assert_eq!(root.len(), 3);
	assert_eq!(scope_of(&pikachu).keys(), vec!["surfingpikachu"]);
	assert!(scope_of(&surfing).is_empty());

	let values = root.values();
	assert!(values[2].same_as(&surfing));
	let entries = root.entries();
	assert_eq!(entries[1].0, "pikachu");
	assert!(entries[1].1.same_as(&pikachu));
}

#[test]
fn default_lookup_is_case_insensitive() {
	let (pokemon, charmander, _, _) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);

	assert!(root.get("cHaRmAnDer").unwrap().same_as(&charmander));
	assert!(root.contains("CHARMANDER"));
}

#[test]
fn case_sensitive_keeps_exact_keys() {
	let (pokemon, charmander, _, _) =
		construct_chain(ScopePatch::new().case_sensitive(true));
	let root = scope_of(&pokemon);

	assert_eq!(root.keys(), vec!["Charmander", "Pikachu", "SurfingPikachu"]);
	assert!(root.get("Charmander").unwrap().same_as(&charmander));
	assert!(root.get("CHARMANDER").is_none());
}

#[test]
fn snake_case_applies_to_derived_keys() {
	let (pokemon, ..) = construct_chain(ScopePatch::new().snake_case(true));
	assert_eq!(
		scope_of(&pokemon).keys(),
		vec!["charmander", "pikachu", "surfing_pikachu"]
	);
}

#[test]
fn register_self_writes_owner_into_own_scope() {
	let (pokemon, ..) = construct_chain(ScopePatch::new().register_self(true));
	assert_eq!(
		scope_of(&pokemon).keys(),
		vec!["pokemon", "charmander", "pikachu", "surfingpikachu"]
	);
	assert!(scope_of(&pokemon).get("pokemon").unwrap().same_as(&pokemon));
}

#[test]
fn non_recursive_scopes_keep_registrations_one_hop() {
	let (pokemon, charmander, pikachu, surfing) =
		construct_chain(ScopePatch::new().recursive(false));
	let root = scope_of(&pokemon);

	// The root hop into the immediate parent is unconditional; forwarding
	// past it is not.
	assert_eq!(root.keys(), vec!["charmander", "pikachu"]);
	assert!(scope_of(&charmander).is_empty());
	assert_eq!(scope_of(&pikachu).keys(), vec!["surfingpikachu"]);
	assert!(scope_of(&surfing).is_empty());

	// The grandchild is still reachable through an addressed key.
	assert!(root.contains("pikachu.surfingpikachu"));
}

#[test]
fn forwarding_requires_recursive_on_both_sides() {
	// A recursive, B not: C lands in B (root hop) but never reaches A.
	let a = declare("Alpha", &[], ScopePatch::new()).unwrap();
	let b = declare("Beta", &[&a], ScopePatch::new().recursive(false)).unwrap();
	let c = declare("Gamma", &[&b], ScopePatch::new()).unwrap();

	assert_eq!(scope_of(&a).keys(), vec!["beta"]);
	assert_eq!(scope_of(&b).keys(), vec!["gamma"]);
	assert!(scope_of(&c).is_empty());
}

#[test]
fn base_scopes_never_receive_propagation() {
	let sentinel = bind(
		VariantDecl::new(type_meta("Sentinel", "mons", 0))
			.base()
			.skip(),
	)
	.unwrap();
	let pokemon = declare("Pokemon", &[&sentinel], ScopePatch::new()).unwrap();
	let _charmander = declare("Charmander", &[&pokemon], ScopePatch::new()).unwrap();

	assert!(scope_of(&sentinel).is_empty());
	assert_eq!(scope_of(&pokemon).keys(), vec!["charmander"]);
}

#[test]
fn aliases_resolve_and_enumerate_alongside_canonical() {
	let sensor = declare("Sensor", &[], ScopePatch::new()).unwrap();
	let oxygen = bind(
		VariantDecl::new(type_meta("Oxygen", "mons", 0))
			.ancestor(&sensor)
			.aliases(["o2", "air"]),
	)
	.unwrap();
	let scope = scope_of(&sensor);

	assert_eq!(scope.keys(), vec!["oxygen", "o2", "air"]);
	let canonical = scope.get("oxygen").unwrap();
	assert!(canonical.same_as(&oxygen));
	assert!(scope.get("o2").unwrap().same_as(&canonical));
	assert!(scope.get("air").unwrap().same_as(&canonical));
}

#[test]
fn duplicate_aliases_collide_without_writing() {
	let scope = Scope::standalone(ScopeConfig::default());
	let v = Variant::builder("Oxygen", VariantKind::Type).build();
	let err = scope
		.register(&v, None, ["o2", "o2"], true)
		.unwrap_err();
	assert!(matches!(err, RegistryError::KeyCollision { .. }));
	assert!(scope.is_empty());
}

#[test]
fn separator_keys_are_rejected() {
	let scope = Scope::standalone(ScopeConfig::default());
	let v = Variant::builder("Oxygen", VariantKind::Type).build();

	let err = scope.register(&v, Some("a.b"), AliasSpec::None, true).unwrap_err();
	assert!(matches!(err, RegistryError::InvalidName { .. }));

	let err = scope.register(&v, None, ["bad/alias"], true).unwrap_err();
	assert!(matches!(err, RegistryError::InvalidName { .. }));
	assert!(scope.is_empty());
}

#[test]
fn failed_registration_writes_nothing() {
	let scope = Scope::standalone(ScopeConfig::default());
	let first = Variant::builder("Oxygen", VariantKind::Type).build();
	scope.register(&first, None, AliasSpec::None, true).unwrap();

	// Fresh alias plus colliding canonical: neither lands.
	let second = Variant::builder("Oxygen", VariantKind::Type).build();
	let err = scope.register(&second, None, ["fresh"], true).unwrap_err();
	assert!(matches!(err, RegistryError::KeyCollision { .. }));
	assert_eq!(scope.keys(), vec!["oxygen"]);
	assert!(scope.get("oxygen").unwrap().same_as(&first));
}

#[test]
fn explicit_name_skips_derivation_rules() {
	let sensor = declare("Sensor", &[], ScopePatch::new().suffix("Sensor")).unwrap();
	// "o2" satisfies no suffix rule; the explicit name bypasses them.
	let oxygen = bind(
		VariantDecl::new(type_meta("OxygenSensor", "mons", 0))
			.ancestor(&sensor)
			.name("o2"),
	)
	.unwrap();
	assert_eq!(scope_of(&sensor).keys(), vec!["o2"]);
	assert!(scope_of(&sensor).get("o2").unwrap().same_as(&oxygen));
}

#[test]
fn suffix_rule_governs_derived_names() {
	let sensor = declare("Sensor", &[], ScopePatch::new().suffix("Sensor")).unwrap();
	declare("OxygenSensor", &[&sensor], ScopePatch::new()).unwrap();
	assert_eq!(scope_of(&sensor).keys(), vec!["oxygen"]);

	let err = declare("Temperature", &[&sensor], ScopePatch::new()).unwrap_err();
	assert!(matches!(err, RegistryError::InvalidName { .. }));
}

#[test]
fn overwrite_allows_replacement() {
	let scope = Scope::standalone(
		ScopeConfig::default().patched(ScopePatch::new().overwrite(true)),
	);
	let first = Variant::builder("Oxygen", VariantKind::Type).build();
	let second = Variant::builder("Oxygen", VariantKind::Type).build();
	scope.register(&first, None, AliasSpec::None, true).unwrap();
	scope.register(&second, None, AliasSpec::None, true).unwrap();

	assert_eq!(scope.len(), 1);
	assert!(scope.get("oxygen").unwrap().same_as(&second));
}

#[test]
fn path_lookup_matches_chained_lookup() {
	let (pokemon, _, _, surfing) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);

	let dotted = root.get("pikachu.surfingpikachu").unwrap();
	let slashed = root.get("pikachu/surfingpikachu").unwrap();
	let chained = root
		.get("pikachu")
		.and_then(|p| p.scope())
		.and_then(|s| s.get("surfingpikachu"))
		.unwrap();

	assert!(dotted.same_as(&surfing));
	assert!(slashed.same_as(&dotted));
	assert!(chained.same_as(&dotted));
}

#[test]
fn path_lookup_folds_per_level_config() {
	let root = declare("Root", &[], ScopePatch::new()).unwrap();
	let strict = declare(
		"Strict",
		&[&root],
		ScopePatch::new().case_sensitive(true),
	)
	.unwrap();
	declare("LeafNode", &[&strict], ScopePatch::new()).unwrap();

	// First segment folds under the root's insensitive config, second under
	// the strict child's.
	assert!(scope_of(&root).get("STRICT.LeafNode").is_some());
	assert!(scope_of(&root).get("strict.leafnode").is_none());
}

#[test]
fn missing_segment_resolves_to_none() {
	let (pokemon, ..) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);

	assert!(root.get("missingno").is_none());
	assert!(root.get("charmander.tail").is_none());
	assert!(root.get("pikachu.surfingpikachu.deeper").is_none());
}

#[test]
fn get_or_falls_back_to_key_or_value() {
	let (pokemon, charmander, _, _) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);
	let spare = Variant::builder("Spare", VariantKind::Type).build();

	assert!(root.get_or("missingno", "charmander").unwrap().same_as(&charmander));
	assert!(root.get_or("missingno", spare.clone()).unwrap().same_as(&spare));
	assert!(root.get_or("missingno", "alsomissing").is_none());
	assert!(root.get_or("charmander", "pikachu").unwrap().same_as(&charmander));
}

#[test]
fn closest_key_suggests_near_misses() {
	let (pokemon, ..) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);

	assert_eq!(root.closest_key("pikchu").as_deref(), Some("pikachu"));
	assert_eq!(root.closest_key("entirely-unrelated"), None);
}

#[test]
fn clear_empties_but_preserves_identity() {
	let (pokemon, ..) = construct_chain(ScopePatch::new());
	let root = scope_of(&pokemon);
	let before = root.clone();

	root.clear();
	assert!(root.is_empty());
	assert!(before.same_scope(&root));
	assert!(root.owner().unwrap().same_as(&pokemon));
}

#[test]
fn owner_back_reference_points_at_the_variant() {
	let (pokemon, _, pikachu, _) = construct_chain(ScopePatch::new());
	assert!(scope_of(&pokemon).owner().unwrap().same_as(&pokemon));
	assert!(scope_of(&pikachu).owner().unwrap().same_as(&pikachu));
}

#[test]
fn reimport_replaces_instead_of_colliding() {
	let sensor = declare("Sensor", &[], ScopePatch::new()).unwrap();
	let old = bind(
		VariantDecl::new(type_meta("Oxygen", "sensors", 0))
			.ancestor(&sensor)
			.aliases(["o2"]),
	)
	.unwrap();

	// Same definition re-executed under a new module identity.
	let new = bind(
		VariantDecl::new(type_meta("Oxygen", "sensors", 1))
			.ancestor(&sensor)
			.aliases(["o2"]),
	)
	.unwrap();

	let scope = scope_of(&sensor);
	assert_eq!(scope.keys(), vec!["oxygen", "o2"]);
	assert!(scope.get("oxygen").unwrap().same_as(&new));
	assert!(scope.get("o2").unwrap().same_as(&new));
	assert!(!scope.get("oxygen").unwrap().same_as(&old));
}

#[test]
fn reimport_rewrites_every_ancestor_transitively() {
	let grand = declare("Grand", &[], ScopePatch::new()).unwrap();
	let parent = declare("Parent", &[&grand], ScopePatch::new()).unwrap();
	let _old = bind(
		VariantDecl::new(type_meta("Leaf", "leafmod", 0)).ancestor(&parent),
	)
	.unwrap();
	let new = bind(
		VariantDecl::new(type_meta("Leaf", "leafmod", 1)).ancestor(&parent),
	)
	.unwrap();

	assert!(scope_of(&parent).get("leaf").unwrap().same_as(&new));
	assert!(scope_of(&grand).get("leaf").unwrap().same_as(&new));
}

#[test]
fn reimport_rebinds_owner_once() {
	let sensor = declare("Sensor", &[], ScopePatch::new()).unwrap();
	let old = bind(VariantDecl::new(type_meta("Oxygen", "sensors", 0)).ancestor(&sensor)).unwrap();
	let old_scope = scope_of(&old);

	let new = bind(VariantDecl::new(type_meta("Oxygen", "sensors", 1)).ancestor(&sensor)).unwrap();

	// The superseded definition's scope now answers to the replacement.
	assert!(old_scope.owner().unwrap().same_as(&new));
	// The replacement's own scope is untouched.
	assert!(scope_of(&new).owner().unwrap().same_as(&new));
}

#[test]
fn same_module_redefinition_is_a_genuine_collision() {
	let sensor = declare("Sensor", &[], ScopePatch::new()).unwrap();
	bind(VariantDecl::new(type_meta("Oxygen", "sensors", 0)).ancestor(&sensor)).unwrap();

	let err = bind(VariantDecl::new(type_meta("Oxygen", "sensors", 0)).ancestor(&sensor))
		.unwrap_err();
	assert!(matches!(err, RegistryError::KeyCollision { .. }));
}

#[test]
fn distinct_source_files_collide() {
	let sensor = declare("Sensor", &[], ScopePatch::new()).unwrap();
	bind(VariantDecl::new(type_meta("Oxygen", "sensors", 0)).ancestor(&sensor)).unwrap();

	let mut other = type_meta("Oxygen", "sensors", 1);
	other.origin = Some("/src/elsewhere.rs".into());
	let err = bind(VariantDecl::new(other).ancestor(&sensor)).unwrap_err();
	assert!(matches!(err, RegistryError::KeyCollision { .. }));
}

#[test]
fn registering_the_same_handle_twice_is_idempotent() {
	let scope = Scope::standalone(ScopeConfig::default());
	let v = Variant::builder("Oxygen", VariantKind::Type).build();
	scope.register(&v, None, AliasSpec::None, true).unwrap();
	scope.register(&v, None, AliasSpec::None, true).unwrap();
	assert_eq!(scope.len(), 1);
}

#[test]
fn snapshot_reflects_live_keys() {
	let (pokemon, ..) = construct_chain(ScopePatch::new());
	let snapshot = scope_of(&pokemon).snapshot();
	assert_eq!(snapshot.name.as_deref(), Some("pokemon"));
	assert!(!snapshot.base);
	assert_eq!(snapshot.keys, vec!["charmander", "pikachu", "surfingpikachu"]);
}
