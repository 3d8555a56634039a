//! Benefit node

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::parser::NodeParser;
use crate::reader::Fragment;
use crate::utils::sanitize::parse_flag;

/// One benefit row of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    /// Benefit name
    pub benefit_type_code: String,
    /// Whether the benefit is an essential health benefit
    pub is_ehb: bool,
    /// Whether the benefit is covered
    pub is_benefit_covered: bool,
    /// Quantity limit, if any
    pub quantity_limit: Option<String>,
    /// Unit of the quantity limit
    pub unit_limit: Option<String>,
    /// Free-text exclusions
    pub exclusion: Option<String>,
}

impl NodeParser for Benefit {
    const ELEMENT: &'static str = "benefits";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            benefit_type_code: fragment.required_text("benefitTypeCode")?,
            is_ehb: parse_flag(fragment.raw("isEHB")),
            is_benefit_covered: fragment
                .text("isBenefitCovered")
                .eq_ignore_ascii_case("covered")
                || parse_flag(fragment.raw("isBenefitCovered")),
            quantity_limit: fragment.opt_text("quantityLimit"),
            unit_limit: fragment.opt_text("unitLimit"),
            exclusion: fragment.opt_text("exclusion"),
        })
    }
}
