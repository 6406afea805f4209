use crate::core::context::{CrawlContext, DETAIL_LABEL};
use crate::domain::model::ContractDetail;
use crate::utils::error::{EtlError, Result};

pub async fn fetch_detail(ctx: &CrawlContext, id: &str) -> Result<ContractDetail> {
    let form = [
        ("id", id.to_string()),
        ("type", "detail_contratos".to_string()),
        ("version", ctx.source.api_version.clone()),
    ];
    let referer = ctx.detail_page_url(id);
    let body = ctx
        .http
        .post_form(
            &ctx.detail_limiter,
            DETAIL_LABEL,
            &ctx.source.detail_url,
            &form,
            Some(&referer),
        )
        .await?;

    parse_detail(id, &body)
}

/// Detail for one identifier, or `None` after logging why it was skipped.
pub async fn enrich(ctx: &CrawlContext, id: &str) -> Option<ContractDetail> {
    match fetch_detail(ctx, id).await {
        Ok(detail) => Some(detail),
        Err(e) => {
            tracing::error!("Could not fetch details for contract {}: {}", id, e);
            None
        }
    }
}

fn parse_detail(id: &str, body: &str) -> Result<ContractDetail> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(EtlError::MalformedResponseError {
            message: format!("detail for {} is not a JSON object", id),
        });
    }
    let mut detail: ContractDetail = serde_json::from_value(value)?;
    detail.id = id.to_string();
    Ok(detail)
}
