use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Discovery completes for every pair before enrichment starts.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting contract discovery...");
        let index = self.pipeline.extract().await?;

        tracing::info!("Enriching {} unique contracts...", index.len());
        let result = self.pipeline.transform(index).await?;

        tracing::info!("Writing report...");
        match self.pipeline.load(result).await {
            Ok(path) => Ok(path),
            Err(e) => {
                tracing::error!(severity = ?e.severity(), "Report not produced: {}", e);
                Err(e)
            }
        }
    }
}
