//! Quote request inputs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::types::RecordId;

/// Inputs of one price computation
///
/// Group inputs are optional. An absent input leaves its factor at 1.0;
/// group inputs are ignored for products outside the SHOP market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Rating area of the applicant
    pub rating_area_id: RecordId,
    /// Coverage start date
    pub effective_date: NaiveDate,
    /// Age of the primary enrollee
    pub age: u32,
    /// Number of employees in the group
    pub group_size: Option<i64>,
    /// Participation as a percentage on a 0-100 scale
    pub participation_rate: Option<f64>,
    /// SIC code of the employer
    pub sic_code: Option<String>,
    /// Composite rating tier name
    pub composite_tier: Option<String>,
}

impl QuoteRequest {
    /// Request for an individual with no group inputs
    #[must_use]
    pub fn new(rating_area_id: RecordId, effective_date: NaiveDate, age: u32) -> Self {
        Self {
            rating_area_id,
            effective_date,
            age,
            group_size: None,
            participation_rate: None,
            sic_code: None,
            composite_tier: None,
        }
    }

    /// Add employer group inputs
    #[must_use]
    pub fn with_group(
        mut self,
        group_size: i64,
        participation_rate: f64,
        sic_code: impl Into<String>,
    ) -> Self {
        self.group_size = Some(group_size);
        self.participation_rate = Some(participation_rate);
        self.sic_code = Some(sic_code.into());
        self
    }

    /// Add a composite rating tier
    #[must_use]
    pub fn with_composite_tier(mut self, tier: impl Into<String>) -> Self {
        self.composite_tier = Some(tier.into());
        self
    }
}
