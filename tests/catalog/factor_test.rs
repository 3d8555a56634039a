use plan_catalog::common::traits::RecordCollection;
use plan_catalog::loader::{commit_factors, parse_factors};
use std::collections::BTreeMap;

use plan_catalog::{ActuarialFactor, Catalog, CatalogError, FactorCache, FactorInput, FactorKind};

use crate::utils::{ISSUER, factor_workbook, seeded_catalog};

#[test]
fn test_group_size_clamps_to_max_key() {
    let catalog = seeded_catalog();
    let at_max = catalog.lookup(&FactorInput::GroupSize(50), ISSUER, 2024).unwrap();
    let above = catalog.lookup(&FactorInput::GroupSize(75), ISSUER, 2024).unwrap();
    assert_eq!(above, at_max);
    assert_eq!(above, 0.9);
    assert_eq!(catalog.lookup(&FactorInput::GroupSize(0), ISSUER, 2024).unwrap(), 1.0);

    let record = catalog.factor_record(FactorKind::GroupSize, ISSUER, 2024).unwrap();
    assert_eq!(record.max_integer_factor_key, Some(50));
}

#[test]
fn test_participation_rounds_and_floors() {
    let catalog = seeded_catalog();
    let rounded = catalog.lookup(&FactorInput::ParticipationRate(97.4), ISSUER, 2024).unwrap();
    let exact = catalog.lookup(&FactorInput::ParticipationRate(97.0), ISSUER, 2024).unwrap();
    assert_eq!(rounded, exact);
    assert_eq!(rounded, 0.95);

    let zero = catalog.lookup(&FactorInput::ParticipationRate(0.0), ISSUER, 2024).unwrap();
    let one = catalog.lookup(&FactorInput::ParticipationRate(1.0), ISSUER, 2024).unwrap();
    assert_eq!(zero, one);
    assert_eq!(zero, 1.1);
}

#[test]
fn test_sic_code_falls_back_to_default() {
    let catalog = seeded_catalog();
    assert_eq!(catalog.lookup(&FactorInput::SicCode("0111"), ISSUER, 2024).unwrap(), 1.2);
    assert_eq!(catalog.lookup(&FactorInput::SicCode("9999"), ISSUER, 2024).unwrap(), 1.0);
}

#[test]
fn test_composite_tier_names() {
    let catalog = seeded_catalog();
    assert_eq!(catalog.composite_tier_factor(ISSUER, 2024, "Employee + Spouse").unwrap(), 2.0);
    assert_eq!(catalog.composite_tier_factor(ISSUER, 2024, "family").unwrap(), 3.0);
    // Missing composite tier records default instead of failing
    assert_eq!(catalog.composite_tier_factor("99999", 2024, "Family").unwrap(), 1.0);
}

#[test]
fn test_missing_record_is_a_lookup_miss() {
    let catalog = seeded_catalog();
    let err = catalog.lookup(&FactorInput::SicCode("0111"), ISSUER, 2023).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::LookupMiss { factor: FactorKind::SicCode, year: 2023, .. }
    ));
    assert!(err.is_client_error());
}

#[test]
fn test_reloading_identical_factors_creates_nothing() {
    let mut catalog = seeded_catalog();
    let before = catalog.factors().count();
    let report = commit_factors(&mut catalog, parse_factors(&factor_workbook(), "factors"));
    assert_eq!(report.written, 0);
    assert_eq!(report.skipped, 4);
    assert_eq!(catalog.factors().count(), before);
}

fn sic_table(value: f64) -> ActuarialFactor {
    ActuarialFactor::new(
        FactorKind::SicCode,
        ISSUER,
        2024,
        1.0,
        None,
        BTreeMap::from([("0111".to_string(), value)]),
    )
}

#[test]
fn test_reingesting_an_earlier_table_makes_it_current() {
    let mut catalog = Catalog::new();
    assert!(catalog.upsert_factor(sic_table(0.9)).1);
    assert!(catalog.upsert_factor(sic_table(1.2)).1);
    let (id, created) = catalog.upsert_factor(sic_table(0.9));
    assert!(created);

    let current = catalog.factor_record(FactorKind::SicCode, ISSUER, 2024).unwrap();
    assert_eq!(current.id, id);
    assert_eq!(catalog.lookup(&FactorInput::SicCode("0111"), ISSUER, 2024).unwrap(), 0.9);
    assert_eq!(catalog.factors().count(), 1);

    let cache = FactorCache::build(&catalog, None);
    assert_eq!(cache.cached_lookup(&FactorInput::SicCode("0111"), ISSUER, 2024).unwrap(), 0.9);

    // The current table again is a no-op
    assert_eq!(catalog.upsert_factor(sic_table(0.9)), (id, false));
}

#[test]
fn test_cached_lookup_matches_catalog() {
    let catalog = seeded_catalog();
    let cache = FactorCache::build(&catalog, None);
    assert_eq!(cache.len(), 4);
    assert!(!cache.is_stale());

    let inputs = [
        FactorInput::GroupSize(3),
        FactorInput::GroupSize(120),
        FactorInput::ParticipationRate(96.6),
        FactorInput::SicCode("0111"),
        FactorInput::CompositeTier("Employee + Spouse"),
    ];
    for input in &inputs {
        assert_eq!(
            cache.cached_lookup(input, ISSUER, 2024).unwrap(),
            catalog.lookup(input, ISSUER, 2024).unwrap()
        );
    }
    assert!(cache.cached_lookup(&FactorInput::GroupSize(3), "99999", 2024).is_err());
}
