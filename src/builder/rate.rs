//! Rate builder
//!
//! Rate rows are grouped into premium tables keyed by
//! `(plan id, rating area, effective period)`, one premium per age. Each
//! run fully replaces the premium tables of the plans and years it touches:
//! all tables are cleared first, then the new tables are attached. Running
//! the builder twice with the same input leaves the same tables in place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use rustc_hash::FxHashMap;

use crate::builder::BuildReport;
use crate::catalog::{Catalog, RatingAreaIndex};
use crate::common::traits::RecordCollection;
use crate::error::{CatalogError, RowFailure};
use crate::models::{PremiumTable, RecordId};
use crate::parser::RateGroup;
use crate::utils::dates::DateRange;

/// Rate groups parsed from one source file
pub type RateSource = (String, Vec<RateGroup>);

/// Premium table identity
type TableKey = (String, RecordId, DateRange);

/// Ages and costs of one table, plus the file that supplied them
struct TableRows {
    source: String,
    costs: BTreeMap<u32, f64>,
}

/// Replace the premium tables of every plan and year in the sources
pub fn build_rates(catalog: &mut Catalog, sources: &[RateSource]) -> BuildReport {
    let mut report = BuildReport::default();
    let mut indexes: FxHashMap<i32, RatingAreaIndex> = FxHashMap::default();
    let mut tables: BTreeMap<TableKey, TableRows> = BTreeMap::new();
    let mut touched: BTreeSet<(String, i32)> = BTreeSet::new();

    for (source, groups) in sources {
        for group in groups {
            report.add_parse_failures(source, &group.failures);
            let header_state = group.header.state_postal_code.as_deref();
            for item in &group.items {
                let Some(period) = item.effective_period() else {
                    report.failures.push(RowFailure::new(
                        source.clone(),
                        item.plan_id.clone(),
                        CatalogError::validation("expiration date precedes effective date"),
                    ));
                    continue;
                };
                let year = item.effective_date.year();
                let index = indexes
                    .entry(year)
                    .or_insert_with(|| catalog.rating_area_index(year));
                touched.insert((item.plan_id.clone(), year));
                let state = header_state.or_else(|| plan_state(&item.plan_id));

                for label in &item.rating_area_labels {
                    let Some(area_id) = index.resolve_in(label, state) else {
                        report.failures.push(RowFailure::new(
                            source.clone(),
                            item.plan_id.clone(),
                            CatalogError::validation(format!("unknown rating area '{label}' in {year}")),
                        ));
                        continue;
                    };
                    let rows = tables
                        .entry((item.plan_id.clone(), area_id, period))
                        .or_insert_with(|| TableRows {
                            source: source.clone(),
                            costs: BTreeMap::new(),
                        });
                    if rows.costs.insert(item.age, item.primary_enrollee).is_some() {
                        log::debug!(
                            "{source}: duplicate age {} for {} {label} {period}, keeping the last",
                            item.age,
                            item.plan_id
                        );
                    }
                }
            }
        }
    }

    // Plan ids resolve to products once per (plan, year)
    let mut products: FxHashMap<(String, i32), Vec<RecordId>> = FxHashMap::default();
    for (plan_id, year) in &touched {
        let ids = DateRange::calendar_year(*year)
            .map(|range| catalog.product_ids_for_plan(plan_id, &range))
            .unwrap_or_default();
        for id in &ids {
            if let Some(product) = catalog.products_mut().get_mut(*id) {
                product.clear_premium_tables();
            }
        }
        products.insert((plan_id.clone(), *year), ids);
    }

    for ((plan_id, area_id, period), rows) in tables {
        let ids = products
            .get(&(plan_id.clone(), period.year()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        if ids.is_empty() {
            report.failures.push(RowFailure::new(
                rows.source,
                plan_id.clone(),
                CatalogError::validation(format!("no product for plan {plan_id} in {}", period.year())),
            ));
            continue;
        }
        let table = match PremiumTable::new(period, area_id, &rows.costs) {
            Ok(table) => table,
            Err(e) => {
                report
                    .failures
                    .push(RowFailure::new(rows.source, plan_id, e));
                continue;
            }
        };
        for id in ids {
            let Some(product) = catalog.products_mut().get_mut(*id) else {
                continue;
            };
            match product.add_premium_table(table.clone()) {
                Ok(()) => report.created += 1,
                Err(e) => report
                    .failures
                    .push(RowFailure::new(rows.source.clone(), product.hios_id(), e)),
            }
        }
    }

    report.updated = products.values().map(Vec::len).sum();
    report
}

/// State code embedded in a plan id (`12345MA0010001` is `MA`)
fn plan_state(plan_id: &str) -> Option<&str> {
    plan_id
        .get(5..7)
        .filter(|state| state.chars().all(|c| c.is_ascii_alphabetic()))
}
