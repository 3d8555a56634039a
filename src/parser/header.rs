//! Package header node

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::models::BenefitMarketKind;
use crate::parser::NodeParser;
use crate::reader::Fragment;
use crate::utils::sanitize::parse_flag;

/// Issuer-level header of a plan and benefit template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageHeader {
    /// Submission id
    pub application_id: Option<String>,
    /// Five digit issuer HIOS id
    pub issuer_id: String,
    /// Two letter state code
    pub state_postal_code: String,
    /// Market coverage text, e.g. `SHOP (Small Group)`
    pub market_coverage: String,
    /// Whether every plan in the template is a stand-alone dental plan
    pub dental_only: bool,
    /// Issuer tax id
    pub tin: Option<String>,
}

impl PackageHeader {
    /// Market derived from the coverage text
    #[must_use]
    pub fn benefit_market_kind(&self) -> BenefitMarketKind {
        BenefitMarketKind::from_market_coverage(&self.market_coverage)
    }
}

impl NodeParser for PackageHeader {
    const ELEMENT: &'static str = "header";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            application_id: fragment.opt_text("applicationId"),
            issuer_id: fragment.required_text("issuerId")?,
            state_postal_code: fragment.text("statePostalCode").to_uppercase(),
            market_coverage: fragment.text("marketCoverage"),
            dental_only: parse_flag(fragment.raw("dentalPlanOnlyInd")),
            tin: fragment.opt_text("tin"),
        })
    }
}
