//! Package nodes: a plan and benefit template document and its packages

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::parser::{Benefit, NodeParser, PackageHeader, PlanRecord, parse_items};
use crate::reader::{Fragment, XmlNode};

/// One package: an issuer header, its plans and its benefits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub header: PackageHeader,
    pub plans: Vec<PlanRecord>,
    pub benefits: Vec<Benefit>,
    /// Plans and benefits that failed to parse
    pub failures: Vec<ParseError>,
}

impl PackageRecord {
    /// Parse a package, taking the header from the document when the
    /// package has none of its own
    pub fn parse_with_header(
        fragment: &Fragment<'_>,
        document_header: Option<&PackageHeader>,
    ) -> Result<Self, ParseError> {
        let header = match fragment.nested(PackageHeader::ELEMENT) {
            Some(header) => PackageHeader::parse(&header)?,
            None => document_header
                .cloned()
                .ok_or_else(|| fragment.field_error(PackageHeader::ELEMENT, "package header is missing"))?,
        };

        let (plans, mut failures) = parse_items::<PlanRecord>(fragment, "plansList");
        let (benefits, benefit_failures) = parse_items::<Benefit>(fragment, "benefitsList");
        failures.extend(benefit_failures);

        Ok(Self {
            header,
            plans,
            benefits,
            failures,
        })
    }

    /// Whether the package holds stand-alone dental plans
    #[must_use]
    pub fn is_dental(&self, plan: &PlanRecord) -> bool {
        self.header.dental_only || plan.attributes.dental_only
    }
}

impl NodeParser for PackageRecord {
    const ELEMENT: &'static str = "packages";

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        Self::parse_with_header(fragment, None)
    }
}

/// A whole plan and benefit template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QhpDocument {
    pub packages: Vec<PackageRecord>,
    /// Packages that failed to parse
    pub failures: Vec<ParseError>,
}

impl QhpDocument {
    /// Root element name of plan and benefit templates
    pub const ROOT: &'static str = "planBenefitTemplateVO";

    /// Parse a document root
    pub fn parse_document(root: &XmlNode) -> Result<Self, ParseError> {
        Self::parse(&Fragment::root(root))
    }
}

impl NodeParser for QhpDocument {
    const ELEMENT: &'static str = Self::ROOT;

    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError> {
        if !fragment.name().eq_ignore_ascii_case(Self::ROOT) {
            return Err(fragment.error(format!(
                "expected a {} document, found '{}'",
                Self::ROOT,
                fragment.name()
            )));
        }
        let document_header = fragment
            .nested(PackageHeader::ELEMENT)
            .map(|header| PackageHeader::parse(&header))
            .transpose()?;

        let mut packages = Vec::new();
        let mut failures = Vec::new();
        for package in fragment.items("packagesList", PackageRecord::ELEMENT) {
            match PackageRecord::parse_with_header(&package, document_header.as_ref()) {
                Ok(record) => packages.push(record),
                Err(e) => failures.push(e),
            }
        }
        Ok(Self { packages, failures })
    }
}
