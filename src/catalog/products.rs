//! Product catalog queries

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::common::traits::RecordCollection;
use crate::models::{Product, ProductKind, RecordId};
use crate::utils::dates::DateRange;

impl Catalog {
    /// Products of a kind offered in any of the service areas during a period
    #[must_use]
    pub fn find_products(
        &self,
        kind: ProductKind,
        service_area_ids: &BTreeSet<RecordId>,
        period: &DateRange,
    ) -> Vec<&Product> {
        self.products.find(|product| {
            product.kind() == kind
                && product
                    .service_area_id
                    .is_some_and(|id| service_area_ids.contains(&id))
                && product.application_period.overlaps(period)
        })
    }

    /// Product with an identity key whose application period lies in a year
    #[must_use]
    pub fn find_product(
        &self,
        hios_base_id: &str,
        csr_variant_id: Option<&str>,
        year: &DateRange,
    ) -> Option<&Product> {
        self.products
            .find_first(|product| product.has_identity(hios_base_id, csr_variant_id, year))
    }

    /// Products sharing a base plan id whose application period lies in a year
    #[must_use]
    pub fn product_ids_for_plan(&self, hios_base_id: &str, year: &DateRange) -> Vec<RecordId> {
        self.products.ids_where(|product| {
            product.hios_base_id == hios_base_id && product.application_period.is_subset_of(year)
        })
    }
}
