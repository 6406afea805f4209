use crate::config::toml_config::ScraperConfig;
use crate::core::context::CrawlContext;
use crate::core::discovery::discover;
use crate::core::district::DistrictTable;
use crate::core::enrichment::enrich;
use crate::core::report::{self, KeywordCanon, ReportBuilder};
use crate::domain::aggregation::AggregationIndex;
use crate::domain::ports::{EnrichmentStats, Pipeline, Storage, TransformResult};
use crate::utils::error::{EtlError, Result};

/// Discovery, enrichment and report writing for one configured run.
pub struct CrawlPipeline<S: Storage> {
    storage: S,
    config: ScraperConfig,
    ctx: CrawlContext,
    districts: DistrictTable,
    report: ReportBuilder,
}

impl<S: Storage> CrawlPipeline<S> {
    pub fn new(storage: S, config: ScraperConfig) -> Result<Self> {
        let ctx = CrawlContext::from_config(&config)?;
        let districts = DistrictTable::from_config(&config.districts);
        let report = ReportBuilder::new(
            KeywordCanon::new(&config.search.keywords),
            &config.source.detail_page_url,
        );

        Ok(Self {
            storage,
            config,
            ctx,
            districts,
            report,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for CrawlPipeline<S> {
    /// Runs the whole keyword × district matrix before any detail is fetched.
    async fn extract(&self) -> Result<AggregationIndex> {
        if let Some(url) = &self.ctx.source.warmup_url {
            self.ctx.http.warm_up(url).await;
        }

        let total = self.config.search_space_size();
        let mut index = AggregationIndex::new();
        let mut pair = 0;

        for keyword in &self.config.search.keywords {
            for district in &self.config.districts {
                pair += 1;
                let ids = discover(&self.ctx, keyword, district.id).await;
                tracing::info!(
                    "[{}/{}] Found {} contracts for '{}' in '{}'",
                    pair,
                    total,
                    ids.len(),
                    keyword,
                    district.name
                );
                index.record_all(&ids, keyword, &district.name);
            }
        }

        tracing::info!("Discovery finished: {} unique contracts", index.len());
        Ok(index)
    }

    async fn transform(&self, index: AggregationIndex) -> Result<TransformResult> {
        let mut stats = EnrichmentStats {
            unique_ids: index.len(),
            ..EnrichmentStats::default()
        };
        let mut rows = Vec::new();

        for (position, entry) in index.entries().enumerate() {
            tracing::debug!("[{}/{}] Fetching contract {}", position + 1, stats.unique_ids, entry.id);

            let Some(detail) = enrich(&self.ctx, &entry.id).await else {
                stats.fetch_failures += 1;
                continue;
            };

            let Some(district) = self.districts.find_district(&detail.execution_place) else {
                tracing::debug!(
                    "Contract {} skipped: execution place '{}' is out of scope",
                    entry.id,
                    detail.execution_place
                );
                stats.out_of_scope += 1;
                continue;
            };

            rows.push(self.report.build_row(&detail, district, entry));
        }

        let mut rows = report::dedup_by_id(rows);
        report::sort_by_publication_desc(&mut rows);

        tracing::info!(
            "Enrichment finished: {} rows from {} contracts ({} fetch failures, {} out of scope)",
            rows.len(),
            stats.unique_ids,
            stats.fetch_failures,
            stats.out_of_scope
        );

        Ok(TransformResult { rows, stats })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.config.output_path().to_string();

        if result.rows.is_empty() {
            tracing::warn!("No contracts matched; writing a header-only report");
        }

        let bytes = report::to_csv_bytes(&result.rows)?;
        self.storage
            .write_file(&output_path, &bytes)
            .await
            .map_err(|e| match e {
                EtlError::IoError(source) => EtlError::OutputError {
                    path: output_path.clone(),
                    source,
                },
                other => other,
            })?;

        tracing::info!("Report with {} rows saved to '{}'", result.rows.len(), output_path);
        Ok(output_path)
    }
}
