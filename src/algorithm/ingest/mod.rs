//! Region ingestion
//!
//! A region is ingested by six stages run strictly in order:
//! county/zip, rating areas, actuarial factors, service areas, plans and
//! rates. Later stages read what earlier ones wrote. Within a stage the
//! source files are parsed in parallel (when enabled) and committed to the
//! catalog sequentially in path order.
//!
//! Record-level failures are collected on the stage report. Infrastructure
//! failures (a file that cannot be read) stop the run with
//! [`CatalogError::StageFailed`]; stages that already ran stay committed,
//! and every stage is safe to re-run.

pub mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::builder::{BuildReport, PlanBuilder, build_rates};
use crate::catalog::Catalog;
use crate::config::IngestConfig;
use crate::error::util::validate_directory;
use crate::error::{CatalogError, ParseError, Result, RowFailure};
use crate::loader::{
    self, LoadReport, Parsed, PlanMetadataMaps, commit_county_zips, commit_factors,
    commit_rating_areas, commit_service_areas,
};
use crate::parser::{QhpDocument, RateGroup, parse_rate_groups};
use crate::reader::{DocumentSource, Workbook, XmlNode};
use crate::utils::logging::{
    create_stage_progress_bar, finish_progress_bar, log_region_start, log_row_failures,
    log_stage_complete, log_stage_start,
};
use crate::utils::paths::{WORKBOOK_EXTENSION, XML_EXTENSION, find_stage_sources, source_name};

pub use report::{IngestSummary, Stage, StageReport};

/// Ingest every stage of a region
///
/// # Arguments
/// * `root` - Directory holding one sub-directory per region
/// * `region` - Region directory name
/// * `source` - Reader for workbooks and XML documents
/// * `config` - Ingestion settings
/// * `catalog` - Catalog to write into
///
/// # Returns
/// A summary with one report per stage, or the error of the first stage
/// that could not run to completion
pub fn ingest_region(
    root: &Path,
    region: &str,
    source: &dyn DocumentSource,
    config: &IngestConfig,
    catalog: &mut Catalog,
) -> Result<IngestSummary> {
    let region_root = root.join(region);
    validate_directory(&region_root, "region ingestion")?;
    log_region_start(region, &region_root);
    log::info!("{config}");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads.max(1))
        .build()
        .map_err(|e| CatalogError::Other(anyhow::anyhow!("failed to build worker pool: {e}")))?;

    let run = StageRun {
        region_root: &region_root,
        source,
        config,
        pool: &pool,
    };

    let start = Instant::now();
    let mut stages = Vec::with_capacity(Stage::ALL.len());
    for (step, stage) in Stage::ALL.into_iter().enumerate() {
        log_stage_start(step + 1, Stage::ALL.len(), stage);
        let stage_start = Instant::now();

        let mut report = run.execute(stage, catalog).map_err(|e| {
            log::error!("Stage '{stage}' failed: {e}");
            CatalogError::StageFailed {
                stage: stage.name(),
                source: Box::new(e),
            }
        })?;

        report.elapsed = stage_start.elapsed();
        log_row_failures(stage.name(), &report.failures);
        log_stage_complete(&report);
        stages.push(report);
    }

    let summary = IngestSummary {
        region: region.to_string(),
        stages,
        elapsed: start.elapsed(),
    };
    log::info!("{summary}");
    log::info!("{}", catalog.stats());
    Ok(summary)
}

/// Shared context of the stages of one run
struct StageRun<'a> {
    region_root: &'a Path,
    source: &'a dyn DocumentSource,
    config: &'a IngestConfig,
    pool: &'a rayon::ThreadPool,
}

impl StageRun<'_> {
    fn execute(&self, stage: Stage, catalog: &mut Catalog) -> Result<StageReport> {
        let dirs = &self.config.stage_dirs;
        match stage {
            Stage::CountyZips => self.workbook_stage(
                stage,
                &dirs.counties,
                catalog,
                loader::parse_county_zips,
                commit_county_zips,
            ),
            Stage::RatingAreas => self.workbook_stage(
                stage,
                &dirs.rating_areas,
                catalog,
                loader::parse_rating_areas,
                commit_rating_areas,
            ),
            Stage::Factors => self.workbook_stage(
                stage,
                &dirs.factors,
                catalog,
                |book: &dyn Workbook, name: &str| Ok(loader::parse_factors(book, name)),
                commit_factors,
            ),
            Stage::ServiceAreas => self.workbook_stage(
                stage,
                &dirs.service_areas,
                catalog,
                loader::parse_service_areas,
                commit_service_areas,
            ),
            Stage::Plans => self.plan_stage(catalog),
            Stage::Rates => self.rate_stage(catalog),
        }
    }

    fn stage_files(&self, dir: &str, extension: &str) -> Result<Vec<PathBuf>> {
        find_stage_sources(&self.region_root.join(dir), extension)
    }

    /// Run `parse` over every file, in parallel when enabled, keeping file order
    fn parse_files<T, F>(&self, stage: Stage, files: &[PathBuf], parse: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T> + Sync,
    {
        let pb =
            create_stage_progress_bar(files.len() as u64, stage.name(), self.config.show_progress);
        let parse_one = |path: &PathBuf| {
            log::debug!("Parsing {}", path.display());
            let parsed = parse(path);
            pb.inc(1);
            parsed
        };
        let results: Vec<Result<T>> = if self.config.parallel_files && files.len() > 1 {
            self.pool.install(|| files.par_iter().map(parse_one).collect())
        } else {
            files.iter().map(parse_one).collect()
        };
        finish(&pb, stage);
        results.into_iter().collect()
    }

    fn workbook_stage<T, P, C>(
        &self,
        stage: Stage,
        dir: &str,
        catalog: &mut Catalog,
        parse: P,
        commit: C,
    ) -> Result<StageReport>
    where
        T: Send,
        P: Fn(&dyn Workbook, &str) -> std::result::Result<Parsed<T>, ParseError> + Sync,
        C: Fn(&mut Catalog, Parsed<T>) -> LoadReport,
    {
        let files = self.stage_files(dir, WORKBOOK_EXTENSION)?;
        let parsed = self.parse_files(stage, &files, |path| {
            let name = source_name(path);
            let workbook = self.source.open_workbook(path)?;
            Ok(parse(workbook.as_ref(), &name).unwrap_or_else(|e| file_failure(&name, e)))
        })?;

        let mut load = LoadReport::default();
        for file in parsed {
            load.merge(commit(catalog, file));
        }
        Ok(StageReport {
            files: files.len(),
            written: load.written,
            skipped: load.skipped,
            failures: load.failures,
            ..StageReport::new(stage)
        })
    }

    fn plan_stage(&self, catalog: &mut Catalog) -> Result<StageReport> {
        let mut report = StageReport::new(Stage::Plans);
        let metadata = self.load_metadata(&mut report)?;

        let files = self.stage_files(&self.config.stage_dirs.plans, XML_EXTENSION)?;
        let documents = self.parse_files(Stage::Plans, &files, |path| {
            let name = source_name(path);
            let document = self
                .read_xml(path)?
                .and_then(|root| QhpDocument::parse_document(&root));
            Ok((name, document))
        })?;

        let mut build = BuildReport::default();
        let mut builder = PlanBuilder::new(catalog, &metadata, self.config);
        for (name, document) in documents {
            match document {
                Ok(document) => build.merge(builder.build(&name, &document)),
                Err(e) => build.failures.push(RowFailure::new(name, e.path.clone(), e.into())),
            }
        }

        report.files = files.len();
        report.written = build.written();
        report.skipped = build.skipped;
        report.failures.extend(build.failures);
        Ok(report)
    }

    /// Supplemental metadata read ahead of the plan templates
    fn load_metadata(&self, report: &mut StageReport) -> Result<PlanMetadataMaps> {
        let files = self.stage_files(&self.config.stage_dirs.metadata, WORKBOOK_EXTENSION)?;
        let parsed = self.parse_files(Stage::Plans, &files, |path| {
            let name = source_name(path);
            let workbook = self.source.open_workbook(path)?;
            Ok((name.clone(), loader::parse_plan_metadata(workbook.as_ref(), &name)))
        })?;

        let mut metadata = PlanMetadataMaps::default();
        for (name, result) in parsed {
            match result {
                Ok(sheets) => {
                    for (kind, sheet) in sheets {
                        report.failures.extend(sheet.failures);
                        metadata.extend(kind, sheet.rows);
                    }
                }
                Err(e) => report
                    .failures
                    .push(RowFailure::new(name, e.path.clone(), e.into())),
            }
        }
        log::info!("Loaded metadata for {} plans", metadata.len());
        Ok(metadata)
    }

    fn rate_stage(&self, catalog: &mut Catalog) -> Result<StageReport> {
        let files = self.stage_files(&self.config.stage_dirs.rates, XML_EXTENSION)?;
        let parsed = self.parse_files(Stage::Rates, &files, |path| {
            let name = source_name(path);
            let groups = self
                .read_xml(path)?
                .and_then(|root| parse_rate_groups(&root));
            Ok((name, groups))
        })?;

        let mut report = StageReport::new(Stage::Rates);
        let mut sources: Vec<(String, Vec<RateGroup>)> = Vec::with_capacity(parsed.len());
        for (name, groups) in parsed {
            match groups {
                Ok(groups) => sources.push((name, groups)),
                Err(e) => report
                    .failures
                    .push(RowFailure::new(name, e.path.clone(), e.into())),
            }
        }

        // Premium tables are replaced per (plan, year) across all files at once
        let build = build_rates(catalog, &sources);
        report.files = files.len();
        report.written = build.created;
        report.skipped = build.skipped;
        report.failures.extend(build.failures);
        Ok(report)
    }

    /// Read an XML document, separating malformed documents from IO failures
    fn read_xml(&self, path: &Path) -> Result<std::result::Result<XmlNode, ParseError>> {
        match self.source.parse_xml(path) {
            Ok(root) => Ok(Ok(root)),
            Err(CatalogError::Parse(e)) => Ok(Err(e)),
            Err(e) => Err(e),
        }
    }
}

fn file_failure<T>(source: &str, error: ParseError) -> Parsed<T> {
    let mut parsed = Parsed::new(source);
    let location = error.path.clone();
    parsed.fail(location, error);
    parsed
}

fn finish(pb: &ProgressBar, stage: Stage) {
    finish_progress_bar(pb, Some(&format!("{stage} parsed")));
}
