use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plan_catalog::loader::{
    commit_county_zips, commit_factors, commit_rating_areas, commit_service_areas,
    parse_county_zips, parse_factors, parse_rating_areas, parse_service_areas,
};
use plan_catalog::{Catalog, GridSheet, GridWorkbook, IngestConfig, ParquetWorkbook, Result, XmlNode};

/// Issuer used by every fixture
pub const ISSUER: &str = "12345";

/// Region directory name used by the file system fixtures
pub const REGION: &str = "ma";

#[must_use]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Parse an XML fixture
#[must_use]
pub fn xml(document: &str) -> XmlNode {
    XmlNode::parse_str(document).unwrap()
}

/// Ingestion settings for tests: two workers, no progress bars
#[must_use]
pub fn test_config() -> IngestConfig {
    IngestConfig {
        parallel_files: true,
        worker_threads: 2,
        show_progress: false,
        ..IngestConfig::default()
    }
}

#[must_use]
pub fn county_workbook() -> GridWorkbook {
    GridWorkbook::new().with_sheet(GridSheet::from_rows("counties", [
        vec!["County Name", "Zip Code", "State"],
        vec!["Hampden", "01001", "MA"],
        vec!["Hampden", "1022", "MA"],
        vec!["Suffolk", "02108", "MA"],
        vec!["Worcester", "01501.0", "MA"],
    ]))
}

#[must_use]
pub fn rating_area_workbook() -> GridWorkbook {
    GridWorkbook::new().with_sheet(GridSheet::from_rows("rating_areas", [
        vec!["Plan Year", "County Name", "Zip Code", "State", "Rating Area ID"],
        vec!["2024", "Hampden", "01001", "MA", "R-MA001"],
        vec!["2024", "Hampden", "01022", "MA", "R-MA001"],
        vec!["2024", "Suffolk", "02108", "MA", "R-MA002"],
        vec!["2024", "Worcester", "01501", "MA", "R-MA003"],
    ]))
}

#[must_use]
pub fn service_area_workbook() -> GridWorkbook {
    GridWorkbook::new().with_sheet(GridSheet::from_rows("service_areas", [
        vec![
            "Plan Year",
            "HIOS Issuer ID",
            "Service Area ID",
            "Service Area Name",
            "Entire State",
            "County Name",
            "Partial County",
            "Zip Codes",
            "State Code",
        ],
        vec!["2024", ISSUER, "MAS001", "Western MA", "No", "Hampden - MA013", "Yes", "01001", ""],
        vec!["2024", ISSUER, "MAS001", "Western MA", "No", "Hampden - MA013", "Yes", "01022", ""],
        vec!["2024", ISSUER, "MAS002", "Statewide", "Yes", "", "", "", "MA"],
    ]))
}

/// One issuer's factor tables for 2024
///
/// * group size: 1.0 below 10 employees, 0.9 from 10 up to the 50 ceiling
/// * participation: 0.95 at 97%, 1.1 at 1%
/// * SIC: 1.2 for 0111, 1.0 otherwise
/// * composite tier: 1.0 / 2.0 / 3.0
#[must_use]
pub fn factor_workbook() -> GridWorkbook {
    let mut group_size = vec![
        vec!["Factor Key".to_string(), ISSUER.to_string()],
        vec!["Plan Year".to_string(), "2024".to_string()],
        vec!["Default".to_string(), "1.0".to_string()],
    ];
    group_size.extend((1..=50).map(|size: i64| {
        let value = if size >= 10 { "0.9" } else { "1.0" };
        vec![size.to_string(), value.to_string()]
    }));

    GridWorkbook::new()
        .with_sheet(GridSheet::from_rows("GroupSize", group_size))
        .with_sheet(GridSheet::from_rows("ParticipationRate", [
            vec!["Factor Key", ISSUER],
            vec!["Plan Year", "2024"],
            vec!["Default", "1.0"],
            vec!["1", "1.1"],
            vec!["97", "0.95"],
        ]))
        .with_sheet(GridSheet::from_rows("SicCode", [
            vec!["Factor Key", ISSUER],
            vec!["Plan Year", "2024"],
            vec!["Default", "1.0"],
            vec!["0111", "1.2"],
        ]))
        .with_sheet(GridSheet::from_rows("CompositeTier", [
            vec!["Factor Key", ISSUER],
            vec!["Plan Year", "2024"],
            vec!["Default", "1.0"],
            vec!["Employee", "1.0"],
            vec!["Employee + Spouse", "2.0"],
            vec!["Family", "3.0"],
        ]))
}

#[must_use]
pub fn metadata_workbook() -> GridWorkbook {
    GridWorkbook::new().with_sheet(GridSheet::from_rows("health", [
        vec![
            "HIOS Plan ID",
            "Plan Year",
            "Product Package Kinds",
            "HSA Eligible",
            "Standard Plan",
            "Network Information",
            "Provider Directory URL",
            "Rx Formulary URL",
        ],
        vec![
            "12345MA0010001",
            "2024",
            "Metal Level, Single Issuer",
            "Yes",
            "Yes",
            "Broad network",
            "https://example.com/providers",
            "https://example.com/formulary",
        ],
    ]))
}

/// A cost share variance element
#[must_use]
pub fn variance(plan_id: &str, name: &str, metal: &str) -> String {
    format!(
        "<costShareVariance>\
           <planId>{plan_id}</planId>\
           <planMarketingName>{name}</planMarketingName>\
           <metalLevel>{metal}</metalLevel>\
           <moopList>\
             <moop><name>Maximum Out of Pocket for Medical and Drug EHB Benefits (Total)</name>\
               <inNetworkTier1IndividualAmount>$7,000</inNetworkTier1IndividualAmount>\
               <inNetworkTier1FamilyAmount>$14,000</inNetworkTier1FamilyAmount></moop>\
           </moopList>\
           <planDeductibleList>\
             <planDeductible><deductibleType>Combined Medical and Drug EHB Deductible</deductibleType>\
               <inNetworkTier1Individual>$2,000</inNetworkTier1Individual>\
               <inNetworkTier1Family>$4,000</inNetworkTier1Family></planDeductible>\
           </planDeductibleList>\
           <serviceVisitList>\
             <serviceVisit><visitType>Primary Care Visit to Treat an Injury or Illness</visitType>\
               <copayInNetworkTier1>$25 Copay after deductible</copayInNetworkTier1>\
               <coInsuranceInNetworkTier1>20% Coinsurance after deductible</coInsuranceInNetworkTier1></serviceVisit>\
             <serviceVisit><visitType>Major Dental Care - Adult</visitType>\
               <coInsuranceInNetworkTier1>50%</coInsuranceInNetworkTier1></serviceVisit>\
           </serviceVisitList>\
           <sbc><havingBabyDeductible>$2,000</havingBabyDeductible>\
             <havingBabyCoPayment>$10</havingBabyCoPayment></sbc>\
         </costShareVariance>"
    )
}

/// A plan element with its attributes and variances
#[must_use]
pub fn plan(id: &str, metal: &str, service_area: &str, market: &str, variances: &[String]) -> String {
    format!(
        "<plans>\
           <planAttributes>\
             <standardComponentID>{id}</standardComponentID>\
             <planMarketingName>{id} Plan</planMarketingName>\
             <serviceAreaID>{service_area}</serviceAreaID>\
             <planType>HMO</planType>\
             <metalLevel>{metal}</metalLevel>\
             <marketCoverage>{market}</marketCoverage>\
             <ehbPercentPremium>99.5</ehbPercentPremium>\
             <planEffectiveDate>2024-01-01</planEffectiveDate>\
           </planAttributes>\
           <costShareVariancesList>{}</costShareVariancesList>\
         </plans>",
        variances.concat()
    )
}

/// A plan and benefit template with one package
#[must_use]
pub fn qhp_document(dental: bool, plans: &[String]) -> String {
    let dental_flag = if dental { "Yes" } else { "No" };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <planBenefitTemplateVO>\
           <packagesList><packages>\
             <header>\
               <issuerId><cellValue>{ISSUER}</cellValue></issuerId>\
               <statePostalCode>ma</statePostalCode>\
               <marketCoverage>SHOP (Small Group)</marketCoverage>\
               <dentalPlanOnlyInd>{dental_flag}</dentalPlanOnlyInd>\
             </header>\
             <plansList>{}</plansList>\
             <benefitsList><benefits><benefitTypeCode>Primary Care Visit</benefitTypeCode>\
               <isEHB>Yes</isEHB><isBenefitCovered>Covered</isBenefitCovered></benefits></benefitsList>\
           </packages></packagesList>\
         </planBenefitTemplateVO>",
        plans.concat()
    )
}

/// Health template: a SHOP bronze plan (base row plus two variants) and an
/// individual-market gold plan
#[must_use]
pub fn health_document() -> String {
    qhp_document(false, &[
        plan("12345MA0010001", "Expanded Bronze", "MAS001", "SHOP (Small Group)", &[
            variance("12345MA0010001-00", "Bay State Bronze", "Expanded Bronze"),
            variance("12345MA0010001-01", "Bay State Bronze", "Expanded Bronze"),
            variance("12345MA0010001-04", "Bay State Bronze CSR", "Expanded Bronze"),
        ]),
        plan("12345MA0010002", "Gold", "MAS002", "Individual", &[variance(
            "12345MA0010002-01",
            "Bay State Gold",
            "Gold",
        )]),
    ])
}

/// Dental template with one stand-alone dental plan
#[must_use]
pub fn dental_document() -> String {
    qhp_document(true, &[plan("12345MA0020001", "High", "MAS002", "Individual", &[variance(
        "12345MA0020001-01",
        "Bay State Dental",
        "High",
    )])])
}

fn rate_item(plan_id: &str, area: &str, age: &str, from: &str, to: &str, premium: f64) -> String {
    format!(
        "<qhpApplicationRateItemVO>\
           <planId>{plan_id}</planId><rateAreaId>{area}</rateAreaId><ageNumber>{age}</ageNumber>\
           <effectiveDate>{from}</effectiveDate><expirationDate>{to}</expirationDate>\
           <primaryEnrollee>{premium}</primaryEnrollee>\
         </qhpApplicationRateItemVO>"
    )
}

/// Rate template for the fixture plans
///
/// The bronze plan has a first-quarter table and a table for the rest of
/// the year in R-MA001; the gold plan uses the `Rating Area N` label.
#[must_use]
pub fn rate_document() -> String {
    let mut items = Vec::new();
    for (age, q1, rest) in [("0-14", 150.0, 165.0), ("15", 160.0, 176.0), ("21", 250.0, 275.0), ("40", 300.0, 330.0), ("64 and over", 700.0, 770.0)] {
        items.push(rate_item("12345MA0010001", "R-MA001", age, "2024-01-01", "2024-03-31", q1));
        items.push(rate_item("12345MA0010001", "R-MA001", age, "04/01/2024", "12/31/2024", rest));
    }
    for (age, premium) in [("21", 400.0), ("40", 450.0)] {
        items.push(rate_item("12345MA0010002", "Rating Area 1", age, "20240101", "20241231", premium));
    }
    for (age, premium) in [("0-20", 30.0), ("21", 40.0)] {
        items.push(rate_item("12345MA0020001", "R-MA001, R-MA002", age, "2024-01-01", "2024-12-31", premium));
    }
    format!(
        "<?xml version=\"1.0\"?>\
         <qhpApplicationRateGroupVO>\
           <header><issuerId>{ISSUER}</issuerId><statePostalCode>MA</statePostalCode></header>\
           <items>{}</items>\
         </qhpApplicationRateGroupVO>",
        items.concat()
    )
}

/// Catalog with geography and factors loaded from the grid fixtures
#[must_use]
pub fn seeded_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    commit_county_zips(&mut catalog, parse_county_zips(&county_workbook(), "counties").unwrap());
    commit_rating_areas(&mut catalog, parse_rating_areas(&rating_area_workbook(), "rating_areas").unwrap());
    commit_factors(&mut catalog, parse_factors(&factor_workbook(), "factors"));
    commit_service_areas(&mut catalog, parse_service_areas(&service_area_workbook(), "service_areas").unwrap());
    catalog
}

/// Write a complete region below `root` and return the region directory
pub fn write_region(root: &Path) -> Result<PathBuf> {
    let region = root.join(REGION);
    ParquetWorkbook::write(&region.join("counties").join("counties.workbook"), &county_workbook())?;
    ParquetWorkbook::write(&region.join("rating_areas").join("rating_areas.workbook"), &rating_area_workbook())?;
    ParquetWorkbook::write(&region.join("factors").join("factors.workbook"), &factor_workbook())?;
    ParquetWorkbook::write(&region.join("service_areas").join("service_areas.workbook"), &service_area_workbook())?;
    ParquetWorkbook::write(&region.join("metadata").join("plan_metadata.workbook"), &metadata_workbook())?;

    fs::create_dir_all(region.join("plans"))?;
    fs::write(region.join("plans").join("health.xml"), health_document())?;
    fs::write(region.join("plans").join("dental.xml"), dental_document())?;
    fs::create_dir_all(region.join("rates"))?;
    fs::write(region.join("rates").join("rates.xml"), rate_document())?;
    Ok(region)
}
