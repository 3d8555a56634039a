//! Rate template nodes
//!
//! A rate group lists one item per (plan, rating areas, period, age) with
//! the primary enrollee premium. Age labels are normalized to a single
//! representative age at parse time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ParseError;
use crate::parser::{NodeParser, parse_items};
use crate::reader::{Fragment, XmlNode};
use crate::utils::dates::{DateRange, parse_date};
use crate::utils::sanitize::{parse_number, split_list};

/// Map an age label to its representative age
///
/// Numeric labels pass through, bucket labels map to their upper bound
/// (`0-14` is 14) and open-ended labels to their lower bound (`64 and over`
/// is 64).
pub fn normalize_age_label(label: &str) -> Result<u32, String> {
    let label = label.trim();
    if let Ok(age) = label.parse::<u32>() {
        return Ok(age);
    }
    if let Some((_, upper)) = label.split_once('-') {
        return upper
            .trim()
            .parse()
            .map_err(|_| format!("unrecognized age bucket '{label}'"));
    }
    let lower = label.to_lowercase();
    if let Some(age) = lower.strip_suffix("and over") {
        return age
            .trim()
            .parse()
            .map_err(|_| format!("unrecognized age bucket '{label}'"));
    }
    Err(format!("unrecognized age label '{label}'"))
}

/// Issuer-level header of a rate template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateHeader {
    pub issuer_id: String,
    pub state_postal_code: Option<String>,
    pub application_id: Option<String>,
    pub last_modified: Option<String>,
}

impl NodeParser for RateHeader {
    const ELEMENT: &'static str = "header";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            issuer_id: fragment.text("issuerId"),
            state_postal_code: fragment.opt_text("statePostalCode"),
            application_id: fragment.opt_text("applicationId"),
            last_modified: fragment.opt_text("lastModifiedDate"),
        })
    }
}

/// One rate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateItem {
    /// Fourteen character plan id
    pub plan_id: String,
    /// Rating area codes or labels the row applies to
    pub rating_area_labels: SmallVec<[String; 2]>,
    /// Age label as published
    pub age_label: String,
    /// Representative age
    pub age: u32,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    /// Monthly premium of the primary enrollee
    pub primary_enrollee: f64,
    /// Monthly premium of a tobacco-using primary enrollee
    pub primary_enrollee_tobacco: Option<f64>,
}

impl RateItem {
    /// Effective period of the row
    #[must_use]
    pub fn effective_period(&self) -> Option<DateRange> {
        DateRange::new(self.effective_date, self.expiration_date)
    }
}

fn required_date(fragment: &Fragment<'_>, field: &str) -> Result<NaiveDate, ParseError> {
    let raw = fragment.required_text(field)?;
    parse_date(&raw).ok_or_else(|| fragment.field_error(field, format!("unrecognized date '{raw}'")))
}

impl NodeParser for RateItem {
    const ELEMENT: &'static str = "qhpApplicationRateItemVO";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let plan_id = fragment.required_text("planId")?;

        let rating_area_labels: SmallVec<[String; 2]> =
            split_list(fragment.raw("rateAreaId")).into_iter().collect();
        if rating_area_labels.is_empty() {
            return Err(fragment.field_error("rateAreaId", "rating area is missing"));
        }

        let age_label = fragment.required_text("ageNumber")?;
        let age = normalize_age_label(&age_label).map_err(|e| fragment.field_error("ageNumber", e))?;

        let effective_date = required_date(fragment, "effectiveDate")?;
        let expiration_date = required_date(fragment, "expirationDate")?;
        if expiration_date < effective_date {
            return Err(fragment.field_error(
                "expirationDate",
                format!("expiration {expiration_date} precedes effective date {effective_date}"),
            ));
        }

        let primary_enrollee = parse_number(fragment.raw("primaryEnrollee"))
            .ok_or_else(|| fragment.field_error("primaryEnrollee", "premium is missing or not a number"))?;

        Ok(Self {
            plan_id,
            rating_area_labels,
            age_label,
            age,
            effective_date,
            expiration_date,
            primary_enrollee,
            primary_enrollee_tobacco: parse_number(
                fragment
                    .raw("primaryEnrolleeTobacco")
                    .or_else(|| fragment.raw("tobacco")),
            ),
        })
    }
}

/// A rate group: header plus rate rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateGroup {
    pub header: RateHeader,
    pub items: Vec<RateItem>,
    /// Rows that failed to parse
    pub failures: Vec<ParseError>,
}

impl NodeParser for RateGroup {
    const ELEMENT: &'static str = "qhpApplicationRateGroupVO";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        let header = match fragment.nested(RateHeader::ELEMENT) {
            Some(header) => RateHeader::parse(&header)?,
            None => RateHeader::default(),
        };
        let (items, failures) = parse_items(fragment, "items");
        Ok(Self {
            header,
            items,
            failures,
        })
    }
}

/// Parse every rate group of a document
///
/// The root is either a single group or a list element wrapping groups.
pub fn parse_rate_groups(root: &XmlNode) -> Result<Vec<RateGroup>, ParseError> {
    let fragment = Fragment::root(root);
    if fragment.name().eq_ignore_ascii_case(RateGroup::ELEMENT) {
        return Ok(vec![RateGroup::parse(&fragment)?]);
    }
    let groups = fragment.items("", RateGroup::ELEMENT);
    if groups.is_empty() {
        return Err(fragment.error(format!(
            "expected {} elements, found '{}'",
            RateGroup::ELEMENT,
            fragment.name()
        )));
    }
    groups.iter().map(RateGroup::parse).collect()
}
