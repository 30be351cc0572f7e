use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ContentSource, FetchError, FetchOptions, Perspective, Query, QueryParams};
use crate::models::config::SanityConfig;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    ms: Option<u64>,
}

/// 内容 API 客户端
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: reqwest::Client,
    project_id: String,
    dataset: String,
    api_version: String,
    token: Option<String>,
    use_cdn: bool,
    api_host: Option<Url>,
}

impl SanityClient {
    pub fn new(config: &SanityConfig) -> Result<Self, FetchError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FetchError::Config {
                message: "sanity.project_id (or SANITY_PROJECT_ID) is required".to_string(),
            })?;

        let api_host = config
            .api_host
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        Ok(Self {
            http: reqwest::Client::new(),
            project_id,
            dataset: config.dataset.clone(),
            api_version: config.api_version.trim_start_matches('v').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            use_cdn: config.use_cdn,
            api_host,
        })
    }

    /// 只有已发布且匿名的请求可以走 CDN
    fn base_url(&self, options: FetchOptions) -> Result<Url, FetchError> {
        if let Some(host) = &self.api_host {
            return Ok(host.clone());
        }

        let cdn = self.use_cdn && self.token.is_none() && options.perspective == Perspective::Published;
        let host = if cdn { "apicdn" } else { "api" };
        Ok(Url::parse(&format!("https://{}.{}.sanity.io/", self.project_id, host))?)
    }

    /// 构造查询 URL
    pub fn query_url(
        &self,
        query: &Query,
        params: &QueryParams,
        options: FetchOptions,
    ) -> Result<Url, FetchError> {
        let base = self.base_url(options)?;
        let mut url = base.join(&format!(
            "v{}/data/query/{}",
            self.api_version, self.dataset
        ))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query.groq);
            for (name, value) in params.iter() {
                pairs.append_pair(&format!("${}", name), &serde_json::to_string(value)?);
            }
            pairs.append_pair("perspective", options.perspective.as_str());
            if options.stega {
                pairs.append_pair("resultSourceMap", "withKeyArraySelector");
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ContentSource for SanityClient {
    fn name(&self) -> &str {
        "sanity"
    }

    async fn fetch(
        &self,
        query: &Query,
        params: &QueryParams,
        options: FetchOptions,
    ) -> Result<Value, FetchError> {
        let url = self.query_url(query, params, options)?;
        debug!("Fetching {} ({})", query.name, options.perspective);

        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: QueryResponse = serde_json::from_slice(&body)?;
        if let Some(ms) = parsed.ms {
            debug!("{} answered in {}ms", query.name, ms);
        }

        Ok(parsed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fetch::queries;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(api_host: Option<String>) -> SanityConfig {
        SanityConfig {
            project_id: Some("proj".to_string()),
            dataset: "production".to_string(),
            api_version: "2024-07-11".to_string(),
            use_cdn: true,
            token: None,
            perspective: "published".to_string(),
            stega: false,
            api_host,
        }
    }

    #[test]
    fn test_requires_project_id() {
        let mut config = test_config(None);
        config.project_id = None;
        assert!(matches!(SanityClient::new(&config), Err(FetchError::Config { .. })));
    }

    #[test]
    fn test_query_url_uses_cdn_for_published() {
        let client = SanityClient::new(&test_config(None)).unwrap();
        let params = QueryParams::new().with("slug", "about").with("language", "en");

        let url = client
            .query_url(&queries::PAGE, &params, FetchOptions::published())
            .unwrap();
        assert_eq!(url.host_str(), Some("proj.apicdn.sanity.io"));
        assert_eq!(url.path(), "/v2024-07-11/data/query/production");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("$slug".to_string(), "\"about\"".to_string())));
        assert!(pairs.contains(&("$language".to_string(), "\"en\"".to_string())));
        assert!(pairs.contains(&("perspective".to_string(), "published".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "resultSourceMap"));
    }

    #[test]
    fn test_query_url_bypasses_cdn_for_drafts_and_stega() {
        let client = SanityClient::new(&test_config(None)).unwrap();
        let options = FetchOptions {
            perspective: Perspective::PreviewDrafts,
            stega: true,
        };

        let url = client.query_url(&queries::PAGE_SLUGS, &QueryParams::new(), options).unwrap();
        assert_eq!(url.host_str(), Some("proj.api.sanity.io"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("resultSourceMap".to_string(), "withKeyArraySelector".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_returns_result_and_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2024-07-11/data/query/production"))
            .and(query_param("$slug", "\"about\""))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ms": 3,
                "result": {"_id": "abc", "title": "About Us"}
            })))
            .mount(&server)
            .await;

        let mut config = test_config(Some(server.uri()));
        config.token = Some("secret".to_string());
        let client = SanityClient::new(&config).unwrap();

        let params = QueryParams::new().with("slug", "about").with("language", "en");
        let value = client
            .fetch(&queries::PAGE, &params, FetchOptions::published())
            .await
            .unwrap();
        assert_eq!(value["title"], "About Us");
    }

    #[tokio::test]
    async fn test_fetch_null_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})))
            .mount(&server)
            .await;

        let client = SanityClient::new(&test_config(Some(server.uri()))).unwrap();
        let value = client
            .fetch(&queries::PAGE, &QueryParams::new(), FetchOptions::published())
            .await
            .unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = SanityClient::new(&test_config(Some(server.uri()))).unwrap();
        let err = client
            .fetch(&queries::PAGE, &QueryParams::new(), FetchOptions::published())
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
