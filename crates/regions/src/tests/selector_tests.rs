use super::*;

fn catalog() -> RegionCatalog {
    RegionCatalog::bundled().expect("bundled catalog")
}

fn all_triples(catalog: &RegionCatalog) -> Vec<(String, String, String)> {
    catalog
        .regions()
        .iter()
        .flat_map(|region| {
            region.sub_regions.iter().flat_map(move |sub| {
                sub.wards
                    .iter()
                    .map(move |ward| (region.name.clone(), sub.name.clone(), ward.clone()))
            })
        })
        .collect()
}

fn assert_consistent(catalog: &RegionCatalog, state: &SelectionState) {
    assert_eq!(state.sub_region_enabled(), !state.region().is_empty());
    assert_eq!(state.ward_enabled(), !state.sub_region().is_empty());
    if !state.sub_region().is_empty() {
        assert!(catalog.sub_region(state.region(), state.sub_region()).is_some());
        assert!(state
            .sub_region_options()
            .iter()
            .any(|name| name == state.sub_region()));
    }
    if !state.ward().is_empty() {
        assert!(catalog.contains(state.region(), state.sub_region(), state.ward()));
    }
}

#[test]
fn user_edit_sequence_holds_invariants_for_every_catalog_triple() {
    let catalog = catalog();
    for (region, sub_region, ward) in all_triples(&catalog) {
        let mut state = SelectionState::new();
        state.select_region(&catalog, &region, SelectMode::UserEdit);
        assert_consistent(&catalog, &state);
        state.select_sub_region(&catalog, &sub_region, SelectMode::UserEdit);
        assert_consistent(&catalog, &state);
        assert!(state.select_ward(&ward));
        assert_consistent(&catalog, &state);
        assert!(state.is_complete());
    }
}

#[test]
fn prefill_sequence_matches_user_edit_sequence() {
    let catalog = catalog();
    for (region, sub_region, ward) in all_triples(&catalog) {
        let mut edited = SelectionState::new();
        edited.select_region(&catalog, &region, SelectMode::UserEdit);
        edited.select_sub_region(&catalog, &sub_region, SelectMode::UserEdit);
        edited.select_ward(&ward);

        let mut prefilled = SelectionState::new();
        prefilled.select_region(&catalog, &region, SelectMode::Prefill);
        prefilled.select_sub_region(&catalog, &sub_region, SelectMode::Prefill);
        prefilled.select_ward(&ward);

        assert_eq!(edited, prefilled);
    }
}

#[test]
fn unknown_region_disables_all_dependents() {
    let catalog = catalog();
    for mode in [SelectMode::UserEdit, SelectMode::Prefill] {
        let mut state = SelectionState::new();
        state.select_region(&catalog, "Nairobi", SelectMode::UserEdit);
        state.select_sub_region(&catalog, "Westlands", SelectMode::UserEdit);
        state.select_ward("Karura");

        state.select_region(&catalog, "Atlantis", mode);
        assert!(state.sub_region_options().is_empty());
        assert!(!state.sub_region_enabled());
        assert!(!state.ward_enabled());
        assert_eq!(state.ward(), "");
    }
}

#[test]
fn empty_region_resets_everything() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Lamu", SelectMode::UserEdit);
    state.select_region(&catalog, "", SelectMode::UserEdit);
    assert_eq!(state, SelectionState::new());
}

#[test]
fn user_edit_region_change_clears_descendants() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Nairobi", SelectMode::UserEdit);
    state.select_sub_region(&catalog, "Langata", SelectMode::UserEdit);
    state.select_ward("Karen");

    state.select_region(&catalog, "Nairobi", SelectMode::UserEdit);
    assert_eq!(state.sub_region(), "");
    assert_eq!(state.ward(), "");
    assert!(state.ward_options().is_empty());
    assert!(!state.ward_enabled());
    assert_eq!(state.sub_region_options().len(), 4);
}

#[test]
fn prefill_region_keeps_descendants_that_still_resolve() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Nairobi", SelectMode::UserEdit);
    state.select_sub_region(&catalog, "Langata", SelectMode::UserEdit);
    state.select_ward("Karen");

    state.select_region(&catalog, "Nairobi", SelectMode::Prefill);
    assert_eq!(state.sub_region(), "Langata");
    assert_eq!(state.ward(), "Karen");

    state.select_region(&catalog, "Lamu", SelectMode::Prefill);
    assert_eq!(state.region(), "Lamu");
    assert_eq!(state.sub_region(), "");
    assert_eq!(state.ward(), "");
    assert_consistent(&catalog, &state);
}

#[test]
fn prefill_sub_region_keeps_ward_only_when_it_belongs() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Kiambu", SelectMode::UserEdit);
    state.select_sub_region(&catalog, "Ruiru", SelectMode::UserEdit);
    state.select_ward("Mwiki");

    state.select_sub_region(&catalog, "Ruiru", SelectMode::Prefill);
    assert_eq!(state.ward(), "Mwiki");

    state.select_sub_region(&catalog, "Kiambaa", SelectMode::Prefill);
    assert_eq!(state.ward(), "");
    assert!(state.ward_enabled());
    assert_consistent(&catalog, &state);
}

#[test]
fn unknown_sub_region_disables_ward() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Meru", SelectMode::UserEdit);
    state.select_sub_region(&catalog, "Westlands", SelectMode::UserEdit);
    assert_eq!(state.sub_region(), "");
    assert!(!state.ward_enabled());
    assert!(state.ward_options().is_empty());
    assert!(state.sub_region_enabled());
}

#[test]
fn ward_outside_options_is_rejected() {
    let catalog = catalog();
    let mut state = SelectionState::new();
    state.select_region(&catalog, "Meru", SelectMode::UserEdit);
    state.select_sub_region(&catalog, "Tigania West", SelectMode::UserEdit);
    assert!(!state.select_ward("Parklands"));
    assert_eq!(state.ward(), "");
    assert!(state.select_ward("Kianjai "));
    assert_eq!(state.ward(), "Kianjai");
}

#[test]
fn restore_drops_components_that_no_longer_resolve() {
    let catalog = catalog();
    let full = SelectionState::restore(
        &catalog,
        &Location {
            county: "Lamu".into(),
            constituency: "Lamu West".into(),
            ward: "Hongwe".into(),
        },
    );
    assert_eq!(full.location().to_string(), "Hongwe, Lamu West, Lamu");

    let stale = SelectionState::restore(
        &catalog,
        &Location {
            county: "Lamu".into(),
            constituency: "Westlands".into(),
            ward: "Parklands".into(),
        },
    );
    assert_eq!(stale.region(), "Lamu");
    assert_eq!(stale.sub_region(), "");
    assert_eq!(stale.ward(), "");
}
