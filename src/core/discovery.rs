use crate::core::context::{CrawlContext, SEARCH_LABEL};
use crate::domain::model::{SearchPage, SearchQuery};
use crate::utils::error::Result;
use std::collections::BTreeSet;

/// Collects every contract id the search endpoint returns for one
/// (keyword, district) pair.
///
/// Pages are requested from 0 until one comes back shorter than the page
/// size. A failed page ends the pair early and keeps what was gathered.
pub async fn discover(ctx: &CrawlContext, keyword: &str, district_id: u32) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    let page_size = ctx.source.page_size;
    let mut query = SearchQuery::first_page(keyword, district_id, page_size);

    loop {
        if let Some(max_pages) = ctx.source.max_pages {
            if query.page >= max_pages {
                tracing::warn!(
                    "Stopping '{}' in district {} at the {}-page cap",
                    keyword,
                    district_id,
                    max_pages
                );
                break;
            }
        }

        let page = match fetch_page(ctx, &query).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    "Discovery aborted for '{}' in district {} at page {}: {}",
                    keyword,
                    district_id,
                    query.page,
                    e
                );
                break;
            }
        };

        let returned = page.items.len();
        ids.extend(page.items.into_iter().map(|item| item.id));
        tracing::debug!(
            "'{}' district {} page {}: {} items",
            keyword,
            district_id,
            query.page,
            returned
        );

        if returned < page_size as usize {
            break;
        }
        query = query.next_page();
    }

    ids
}

async fn fetch_page(ctx: &CrawlContext, query: &SearchQuery) -> Result<SearchPage> {
    let body = ctx
        .http
        .post_form(
            &ctx.search_limiter,
            SEARCH_LABEL,
            &ctx.source.search_url,
            &query.form(&ctx.source.api_version),
            None,
        )
        .await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::ScraperConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn context(server: &MockServer, max_pages: Option<u32>) -> CrawlContext {
        let toml = format!(
            r#"
[source]
search_url = "{}"
detail_url = "{}"
page_size = 100

[rate_limit]
search_interval_seconds = 0.0
detail_interval_seconds = 0.0

[retry]
max_attempts = 1
backoff_factor_seconds = 0.0

[search]
keywords = ["IoT"]

[[districts]]
name = "Aveiro"
id = 1
"#,
            server.url("/resultados/"),
            server.url("/resultados/")
        );
        let mut config = ScraperConfig::from_toml_str(&toml).unwrap();
        config.source.max_pages = max_pages;
        CrawlContext::from_config(&config).unwrap()
    }

    fn items(prefix: &str, count: usize) -> serde_json::Value {
        let items: Vec<_> = (0..count)
            .map(|i| json!({"id": format!("{}{}", prefix, i)}))
            .collect();
        json!({ "items": items })
    }

    #[tokio::test]
    async fn test_full_page_requests_next_page() {
        let server = MockServer::start();
        let page0 = server.mock(|when, then| {
            when.method(POST)
                .path("/resultados/")
                .body_contains("type=search_contratos")
                .body_contains("page=0");
            then.status(200).json_body(items("p0-", 100));
        });
        let page1 = server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=1");
            then.status(200).json_body(items("p1-", 37));
        });
        let page2 = server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=2");
            then.status(200).json_body(items("p2-", 5));
        });

        let ctx = context(&server, None);
        let ids = discover(&ctx, "IoT", 1).await;

        page0.assert_hits(1);
        page1.assert_hits(1);
        page2.assert_hits(0);
        assert_eq!(ids.len(), 137);
    }

    #[tokio::test]
    async fn test_short_page_stops_without_further_request() {
        let server = MockServer::start();
        let page0 = server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=0");
            then.status(200).json_body(items("a", 37));
        });
        let page1 = server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=1");
            then.status(200).json_body(items("b", 1));
        });

        let ctx = context(&server, None);
        let ids = discover(&ctx, "IoT", 1).await;

        page0.assert_hits(1);
        page1.assert_hits(0);
        assert_eq!(ids.len(), 37);
    }

    #[tokio::test]
    async fn test_query_embeds_keyword_and_district() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/resultados/")
                .x_www_form_urlencoded_tuple(
                    "query",
                    "texto=Smart City&tipo=0&tipocontrato=0&pais=0&distrito=6&concelho=0",
                )
                .x_www_form_urlencoded_tuple("sort", "-publicationDate")
                .x_www_form_urlencoded_tuple("size", "100");
            then.status(200).json_body(json!({"items": [{"id": 42}]}));
        });

        let ctx = context(&server, None);
        let ids = discover(&ctx, "Smart City", 6).await;

        mock.assert();
        assert!(ids.contains("42"));
    }

    #[tokio::test]
    async fn test_failed_page_keeps_partial_results() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=0");
            then.status(200).json_body(items("ok", 100));
        });
        let broken = server.mock(|when, then| {
            when.method(POST).path("/resultados/").body_contains("page=1");
            then.status(200).body("<html>blocked</html>");
        });

        let ctx = context(&server, None);
        let ids = discover(&ctx, "IoT", 1).await;

        broken.assert_hits(1);
        assert_eq!(ids.len(), 100);
    }

    #[tokio::test]
    async fn test_transport_failure_returns_empty() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/resultados/");
            then.status(500);
        });

        let ctx = context(&server, None);
        let ids = discover(&ctx, "IoT", 1).await;

        mock.assert_hits(1);
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_page_cap_stops_discovery() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/resultados/");
            then.status(200).json_body(items("same", 100));
        });

        let ctx = context(&server, Some(2));
        let ids = discover(&ctx, "IoT", 1).await;

        mock.assert_hits(2);
        assert_eq!(ids.len(), 100);
    }
}
