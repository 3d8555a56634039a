use plan_catalog::BenefitMarketKind;
use plan_catalog::parser::{NodeParser, QhpDocument};

use crate::utils::{dental_document, health_document, plan, qhp_document, variance, xml};

#[test]
fn test_parse_health_document() {
    let root = xml(&health_document());
    let document = QhpDocument::parse_document(&root).unwrap();

    assert!(document.failures.is_empty());
    assert_eq!(document.packages.len(), 1);
    let package = &document.packages[0];
    assert_eq!(package.header.issuer_id, "12345");
    assert_eq!(package.header.state_postal_code, "MA");
    assert_eq!(package.header.benefit_market_kind(), BenefitMarketKind::Shop);
    assert_eq!(package.benefits.len(), 1);
    assert!(package.benefits[0].is_ehb);

    assert_eq!(package.plans.len(), 2);
    let bronze = &package.plans[0];
    assert_eq!(bronze.attributes.standard_component_id, "12345MA0010001");
    assert_eq!(bronze.attributes.metal_level, "bronze");
    assert_eq!(bronze.attributes.service_area_id.as_deref(), Some("MAS001"));
    assert_eq!(bronze.variances.len(), 3);
    assert!(bronze.variances[0].is_base_row());
    assert!(!bronze.variances[1].is_base_row());
    assert_eq!(bronze.variances[1].metal_level, "bronze");
}

#[test]
fn test_dental_flag_from_header() {
    let root = xml(&dental_document());
    let document = QhpDocument::parse_document(&root).unwrap();
    let package = &document.packages[0];
    assert!(package.header.dental_only);
    assert!(package.is_dental(&package.plans[0]));
}

#[test]
fn test_malformed_variance_does_not_drop_plan() {
    let broken = "<costShareVariance><planMarketingName>No Id</planMarketingName></costShareVariance>".to_string();
    let document = qhp_document(false, &[plan("12345MA0010003", "Silver", "MAS001", "Individual", &[
        variance("12345MA0010003-01", "Silver", "Silver"),
        broken,
    ])]);
    let root = xml(&document);
    let parsed = QhpDocument::parse_document(&root).unwrap();

    let plan = &parsed.packages[0].plans[0];
    assert_eq!(plan.variances.len(), 1);
    assert_eq!(plan.failures.len(), 1);
    assert!(plan.failures[0].path.ends_with("costShareVariance[1]/planId"));
}

#[test]
fn test_missing_plan_attributes_is_reported() {
    let document = qhp_document(false, &["<plans><costShareVariancesList/></plans>".to_string()]);
    let root = xml(&document);
    let parsed = QhpDocument::parse_document(&root).unwrap();

    let package = &parsed.packages[0];
    assert!(package.plans.is_empty());
    assert_eq!(package.failures.len(), 1);
    assert!(package.failures[0].path.ends_with("planAttributes"));
}

#[test]
fn test_wrong_root_is_rejected() {
    let root = xml("<qhpApplicationRateGroupVO/>");
    let err = QhpDocument::parse_document(&root).unwrap_err();
    assert_eq!(err.path, "qhpApplicationRateGroupVO");
}

#[test]
fn test_to_record_nests_children() {
    let root = xml(&health_document());
    let document = QhpDocument::parse_document(&root).unwrap();
    let record = document.to_record();

    let plans = &record["packages"][0]["plans"];
    assert_eq!(plans[0]["attributes"]["standard_component_id"], "12345MA0010001");
    assert_eq!(plans[0]["variances"][1]["plan_id"], "12345MA0010001-01");
}
