use crate::domain::aggregation::AggregationIndex;
use crate::domain::model::ReportRow;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Counters gathered while enriching the discovered identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub unique_ids: usize,
    pub fetch_failures: usize,
    pub out_of_scope: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<ReportRow>,
    pub stats: EnrichmentStats,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<AggregationIndex>;
    async fn transform(&self, index: AggregationIndex) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
