use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::domain::Record;
use crate::errors::{FetchError, TabfeedError, TabfeedResult};
use crate::sources::traits::ContentSource;

/// Error body returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    error_location_code: Option<String>,
}

pub struct TabNewsSource {
    client: Client,
    base_url: Url,
}

impl TabNewsSource {
    pub fn new(base_url: &str, timeout: Duration) -> TabfeedResult<Self> {
        // Trailing slash so Url::join appends instead of replacing the last segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| TabfeedError::Config(format!("invalid API URL: {}", e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Network(format!("invalid endpoint {}: {}", path, e)))
    }

    fn listing_url(&self, page: u32, per_page: usize, strategy: &str) -> Result<Url, FetchError> {
        let mut url = self.endpoint("contents")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string())
            .append_pair("strategy", strategy);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            return Err(server_error(status.as_u16(), &bytes));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ContentSource for TabNewsSource {
    async fn fetch_page(
        &self,
        page: u32,
        per_page: usize,
        strategy: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let url = self.listing_url(page, per_page, strategy)?;
        self.get_json(url).await
    }

    async fn fetch_content(&self, username: &str, slug: &str) -> Result<Record, FetchError> {
        let url = self.endpoint(&format!("contents/{}/{}", username, slug))?;
        self.get_json(url).await
    }
}

fn server_error(status: u16, body: &[u8]) -> FetchError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => FetchError::Server {
            status,
            message: err.message,
            code: err.error_location_code,
        },
        Err(_) => FetchError::Server {
            status,
            message: format!("server returned status {}", status),
            code: None,
        },
    }
}

/// Parse "username/slug" or an article URL ("https://host/username/slug")
pub fn parse_target(target: &str) -> TabfeedResult<(String, String)> {
    let target = target.trim();

    let path = if target.starts_with("http://") || target.starts_with("https://") {
        let parsed =
            Url::parse(target).map_err(|e| TabfeedError::InvalidTarget(e.to_string()))?;
        parsed.path().to_string()
    } else {
        target.to_string()
    };

    let target_regex = Regex::new(r"^/?([^/\s]+)/([^/\s]+)/?$")
        .map_err(|e| TabfeedError::InvalidTarget(e.to_string()))?;

    target_regex
        .captures(&path)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .ok_or_else(|| {
            TabfeedError::InvalidTarget(format!(
                "expected username/slug or an article URL, got '{}'",
                target
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TabNewsSource {
        TabNewsSource::new("https://www.tabnews.com.br/api/v1", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_listing_url() {
        let url = source().listing_url(2, 20, "relevant").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.tabnews.com.br/api/v1/contents?page=2&per_page=20&strategy=relevant"
        );
    }

    #[test]
    fn test_content_endpoint_keeps_base_path() {
        let source = TabNewsSource::new("http://localhost:3000/api/v1/", Duration::from_secs(5))
            .unwrap();
        let url = source.endpoint("contents/ferris/rust-e-bom").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/v1/contents/ferris/rust-e-bom"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = TabNewsSource::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(TabfeedError::Config(_))));
    }

    #[test]
    fn test_server_error_decodes_body() {
        let body = r#"{"name":"NotFoundError","message":"O conteúdo informado não foi encontrado no sistema.","action":"Verifique o slug.","status_code":404,"error_id":"x","request_id":"y","error_location_code":"CONTROLLER:CONTENT:GET_HANDLER:SLUG_NOT_FOUND"}"#
            .as_bytes();

        let err = server_error(404, body);

        assert_eq!(
            err.to_string(),
            "O conteúdo informado não foi encontrado no sistema."
        );
        assert_eq!(
            err.code(),
            Some("CONTROLLER:CONTENT:GET_HANDLER:SLUG_NOT_FOUND")
        );
    }

    #[test]
    fn test_server_error_undecodable_body() {
        let err = server_error(502, b"<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "server returned status 502");
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_parse_target_path() {
        let (user, slug) = parse_target("ferris/rust-e-bom").unwrap();
        assert_eq!(user, "ferris");
        assert_eq!(slug, "rust-e-bom");
    }

    #[test]
    fn test_parse_target_url() {
        let (user, slug) = parse_target("https://www.tabnews.com.br/ferris/rust-e-bom").unwrap();
        assert_eq!(user, "ferris");
        assert_eq!(slug, "rust-e-bom");
    }

    #[test]
    fn test_parse_target_rejects_bare_username() {
        assert!(matches!(
            parse_target("ferris"),
            Err(TabfeedError::InvalidTarget(_))
        ));
        assert!(parse_target("https://www.tabnews.com.br/ferris").is_err());
    }
}
