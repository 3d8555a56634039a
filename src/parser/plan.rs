//! Plan nodes: plan attributes, cost-share variances and their nested
//! deductible, maximum out of pocket, service visit and SBC fragments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::models::CoverageExample;
use crate::parser::{NodeParser, parse_all, parse_items};
use crate::reader::Fragment;
use crate::utils::dates::parse_date;
use crate::utils::sanitize::{normalize_metal_level, parse_flag, parse_number};

/// Variant suffix of the non-sellable base row
pub const BASE_ROW_VARIANT: &str = "00";

/// Plan-level attributes shared by all cost-share variances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAttributes {
    /// Fourteen character plan id
    pub standard_component_id: String,
    pub plan_marketing_name: String,
    pub hios_product_id: Option<String>,
    pub network_id: Option<String>,
    /// Issuer service area code the plan is offered in
    pub service_area_id: Option<String>,
    pub formulary_id: Option<String>,
    /// HMO, PPO, POS, EPO or indemnity
    pub plan_type: String,
    /// Normalized metal level
    pub metal_level: String,
    /// Share of premium attributable to essential health benefits
    pub ehb_percent_premium: Option<f64>,
    pub plan_effective_date: NaiveDate,
    pub plan_expiration_date: Option<NaiveDate>,
    pub market_coverage: Option<String>,
    pub dental_only: bool,
    pub hsa_eligible: bool,
}

impl NodeParser for PlanAttributes {
    const ELEMENT: &'static str = "planAttributes";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let effective = fragment.required_text("planEffectiveDate")?;
        let plan_effective_date = parse_date(&effective).ok_or_else(|| {
            fragment.field_error("planEffectiveDate", format!("unrecognized date '{effective}'"))
        })?;

        Ok(Self {
            standard_component_id: fragment.required_text("standardComponentID")?,
            plan_marketing_name: fragment.text("planMarketingName"),
            hios_product_id: fragment.opt_text("hiosProductID"),
            network_id: fragment.opt_text("networkID"),
            service_area_id: fragment.opt_text("serviceAreaID"),
            formulary_id: fragment.opt_text("formularyID"),
            plan_type: fragment.text("planType"),
            metal_level: normalize_metal_level(&fragment.text("metalLevel")),
            ehb_percent_premium: parse_number(
                fragment
                    .raw("ehbPercentPremium")
                    .or_else(|| fragment.raw("ehbPercentTotalPremium")),
            ),
            plan_effective_date,
            plan_expiration_date: fragment
                .opt_text("planExpirationDate")
                .and_then(|raw| parse_date(&raw)),
            market_coverage: fragment.opt_text("marketCoverage"),
            dental_only: parse_flag(fragment.raw("dentalOnlyPlan")),
            hsa_eligible: parse_flag(fragment.raw("isHSAEligible")),
        })
    }
}

/// Maximum out of pocket of one kind (medical, drug, total)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moop {
    pub name: String,
    pub in_network_individual: Option<String>,
    pub in_network_family: Option<String>,
    pub combined_individual: Option<String>,
}

impl NodeParser for Moop {
    const ELEMENT: &'static str = "moop";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            name: fragment.text("name"),
            in_network_individual: fragment.opt_text("inNetworkTier1IndividualAmount"),
            in_network_family: fragment.opt_text("inNetworkTier1FamilyAmount"),
            combined_individual: fragment.opt_text("combinedInOutNetworkIndividualAmount"),
        })
    }
}

/// Deductible of one kind (medical, drug, combined)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDeductible {
    pub deductible_type: String,
    pub in_network_individual: Option<String>,
    pub in_network_family: Option<String>,
    pub coinsurance_in_network: Option<String>,
}

impl NodeParser for PlanDeductible {
    const ELEMENT: &'static str = "planDeductible";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            deductible_type: fragment.text("deductibleType"),
            in_network_individual: fragment.opt_text("inNetworkTier1Individual"),
            in_network_family: fragment.opt_text("inNetworkTier1Family"),
            coinsurance_in_network: fragment.opt_text("coinsuranceInNetworkTier1"),
        })
    }
}

/// Copay and coinsurance of one visit type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceVisit {
    pub visit_type: String,
    pub copay_in_network: Option<String>,
    pub coinsurance_in_network: Option<String>,
}

impl NodeParser for ServiceVisit {
    const ELEMENT: &'static str = "serviceVisit";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            visit_type: fragment.required_text("visitType")?,
            copay_in_network: fragment.opt_text("copayInNetworkTier1"),
            coinsurance_in_network: fragment.opt_text("coInsuranceInNetworkTier1"),
        })
    }
}

/// Summary of benefits and coverage scenarios
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbc {
    pub having_baby: CoverageExample,
    pub having_diabetes: CoverageExample,
    pub simple_fracture: CoverageExample,
}

impl NodeParser for Sbc {
    const ELEMENT: &'static str = "sbc";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let scenario = |prefix: &str| CoverageExample {
            deductible: fragment.opt_text(&format!("{prefix}Deductible")),
            copayment: fragment.opt_text(&format!("{prefix}CoPayment")),
            coinsurance: fragment.opt_text(&format!("{prefix}CoInsurance")),
            limit: fragment.opt_text(&format!("{prefix}Limit")),
        };
        Ok(Self {
            having_baby: scenario("havingBaby"),
            having_diabetes: scenario("havingDiabetes"),
            simple_fracture: scenario("simpleFracture"),
        })
    }
}

/// One cost-sharing-reduction variant of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShareVariance {
    /// Combined plan and variant id, `12345MA0010001-01`
    pub plan_id: String,
    /// Marketing name, falling back to the variant marketing name
    pub plan_marketing_name: String,
    /// Normalized metal level
    pub metal_level: String,
    pub csr_variation_type: Option<String>,
    pub issuer_actuarial_value: Option<String>,
    pub moops: Vec<Moop>,
    pub deductibles: Vec<PlanDeductible>,
    pub service_visits: Vec<ServiceVisit>,
    pub sbc: Option<Sbc>,
}

impl CostShareVariance {
    /// Base plan id and variant suffix
    #[must_use]
    pub fn split_plan_id(&self) -> (&str, Option<&str>) {
        match self.plan_id.split_once('-') {
            Some((base, variant)) => (base, Some(variant)),
            None => (self.plan_id.as_str(), None),
        }
    }

    /// Whether this is the non-sellable `-00` base row
    #[must_use]
    pub fn is_base_row(&self) -> bool {
        self.split_plan_id().1 == Some(BASE_ROW_VARIANT)
    }

    /// Combined deductible, or the first one listed
    #[must_use]
    pub fn deductible(&self) -> Option<&PlanDeductible> {
        self.deductibles
            .iter()
            .find(|d| d.deductible_type.contains("Combined"))
            .or_else(|| self.deductibles.first())
    }

    /// Total maximum out of pocket, or the first one listed
    #[must_use]
    pub fn moop(&self) -> Option<&Moop> {
        self.moops
            .iter()
            .find(|m| m.name.contains("(Total)"))
            .or_else(|| self.moops.first())
    }

    /// Service visit by visit type name
    #[must_use]
    pub fn visit(&self, visit_type: &str) -> Option<&ServiceVisit> {
        self.service_visits
            .iter()
            .find(|visit| visit.visit_type.eq_ignore_ascii_case(visit_type))
    }
}

impl NodeParser for CostShareVariance {
    const ELEMENT: &'static str = "costShareVariance";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let plan_id = fragment.required_text("planId")?;

        let moops: Vec<Moop> = parse_all(fragment, "moopList")?;
        if moops.is_empty() {
            return Err(fragment.field_error("moopList", "maximum out of pocket list is missing"));
        }
        let deductibles: Vec<PlanDeductible> = parse_all(fragment, "planDeductibleList")?;
        if deductibles.is_empty() {
            return Err(fragment.field_error("planDeductibleList", "deductible list is missing"));
        }

        Ok(Self {
            plan_id,
            plan_marketing_name: fragment.text_any(&["planMarketingName", "planVariantMarketingName"]),
            metal_level: normalize_metal_level(&fragment.text("metalLevel")),
            csr_variation_type: fragment.opt_text("csrVariationType"),
            issuer_actuarial_value: fragment.opt_text("issuerActuarialValue"),
            moops,
            deductibles,
            service_visits: parse_all(fragment, "serviceVisitList")?,
            sbc: fragment.nested(Sbc::ELEMENT).map(|sbc| Sbc::parse(&sbc)).transpose()?,
        })
    }
}

/// A plan with its variances
///
/// A malformed variance is recorded in `failures` and does not affect the
/// other variances of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub attributes: PlanAttributes,
    pub variances: Vec<CostShareVariance>,
    pub failures: Vec<ParseError>,
}

impl NodeParser for PlanRecord {
    const ELEMENT: &'static str = "plans";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let attributes = fragment
            .nested(PlanAttributes::ELEMENT)
            .ok_or_else(|| fragment.field_error(PlanAttributes::ELEMENT, "plan attributes are missing"))?;
        let attributes = PlanAttributes::parse(&attributes)?;
        let (variances, failures) = parse_items(fragment, "costShareVariancesList");
        Ok(Self {
            attributes,
            variances,
            failures,
        })
    }
}
