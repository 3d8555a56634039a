use plan_catalog::parser::{normalize_age_label, parse_rate_groups};

use crate::utils::{date, rate_document, xml};

#[test]
fn test_parse_rate_document() {
    let root = xml(&rate_document());
    let groups = parse_rate_groups(&root).unwrap();
    assert_eq!(groups.len(), 1);

    let group = &groups[0];
    assert_eq!(group.header.issuer_id, "12345");
    assert!(group.failures.is_empty());
    assert_eq!(group.items.len(), 14);

    let first = &group.items[0];
    assert_eq!(first.age_label, "0-14");
    assert_eq!(first.age, 14);
    assert_eq!(first.effective_date, date(2024, 1, 1));
    assert_eq!(first.expiration_date, date(2024, 3, 31));

    // US and compact date formats
    assert_eq!(group.items[1].effective_date, date(2024, 4, 1));
    assert_eq!(group.items[10].effective_date, date(2024, 1, 1));
    assert_eq!(group.items[10].rating_area_labels.as_slice(), ["Rating Area 1"]);
    assert_eq!(group.items[12].rating_area_labels.as_slice(), ["R-MA001", "R-MA002"]);
}

#[test]
fn test_age_label_normalization() {
    assert_eq!(normalize_age_label("0-14"), Ok(14));
    assert_eq!(normalize_age_label(" 21 "), Ok(21));
    assert_eq!(normalize_age_label("64 and over"), Ok(64));
    assert!(normalize_age_label("Couple+1 child").is_err());
}

#[test]
fn test_inverted_period_is_a_row_failure() {
    let root = xml(
        "<qhpApplicationRateGroupVO><items>\
           <qhpApplicationRateItemVO><planId>12345MA0010001</planId><rateAreaId>R-MA001</rateAreaId>\
             <ageNumber>21</ageNumber><effectiveDate>2024-06-01</effectiveDate>\
             <expirationDate>2024-01-01</expirationDate><primaryEnrollee>100</primaryEnrollee>\
           </qhpApplicationRateItemVO>\
         </items></qhpApplicationRateGroupVO>",
    );
    let groups = parse_rate_groups(&root).unwrap();
    assert!(groups[0].items.is_empty());
    assert_eq!(groups[0].failures.len(), 1);
    assert!(groups[0].failures[0].path.ends_with("expirationDate"));
}
