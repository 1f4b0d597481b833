//! Telegraph HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{DocumentPublisher, MediaHost, PublishError, html_to_nodes};

/// Telegraph rejects longer page titles.
const MAX_TITLE_CHARS: usize = 256;

/// Standard `{ok, result, error}` envelope of the Telegraph API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, PublishError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(PublishError::Api(
                self.error.unwrap_or_else(|| "empty result".to_owned()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
}

/// Publishes pages and uploads media on Telegraph.
///
/// An anonymous account is created on first publish and reused afterwards.
pub struct TelegraphClient {
    http: Client,
    api_url: String,
    upload_url: String,
    short_name: String,
    access_token: OnceCell<String>,
}

impl TelegraphClient {
    pub fn new(
        api_url: impl Into<String>,
        upload_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            upload_url: upload_url.into(),
            short_name: env!("CARGO_PKG_NAME").to_owned(),
            access_token: OnceCell::new(),
        })
    }

    /// Uses an existing account instead of creating one.
    #[must_use]
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        Self {
            access_token: OnceCell::new_with(Some(token.into())),
            ..self
        }
    }

    async fn access_token(&self) -> Result<&str, PublishError> {
        let token = self
            .access_token
            .get_or_try_init(|| async {
                let account: Account = self
                    .call("createAccount", &[("short_name", self.short_name.as_str())])
                    .await?;
                info!("Created Telegraph account \"{}\"", self.short_name);
                Ok::<_, PublishError>(account.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PublishError> {
        let url = format!("{}/{method}", self.api_url);
        let envelope: Envelope<T> = self
            .http
            .post(&url)
            .form(params)
            .send()
            .await?
            .json()
            .await?;
        envelope.into_result()
    }
}

#[async_trait]
impl DocumentPublisher for TelegraphClient {
    async fn publish(&self, title: &str, html: &str) -> Result<String, PublishError> {
        let token = self.access_token().await?;
        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        let content = serde_json::to_string(&html_to_nodes(html))
            .map_err(|e| PublishError::Api(format!("could not encode page: {e}")))?;

        let page: Page = self
            .call(
                "createPage",
                &[
                    ("access_token", token),
                    ("title", title.as_str()),
                    ("content", content.as_str()),
                    ("return_content", "false"),
                ],
            )
            .await?;

        debug!("Created Telegraph page {}", page.url);
        Ok(page.url)
    }
}

#[async_trait]
impl MediaHost for TelegraphClient {
    async fn upload(&self, path: &Path) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "media".to_owned(), |n| n.to_string_lossy().into_owned());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let reply: Value = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        // Success is a list of `{src}`, failure an `{error}` object.
        if let Some(src) = reply.pointer("/0/src").and_then(Value::as_str) {
            debug!("Uploaded {} to {}", path.display(), src);
            return Ok(src.to_owned());
        }
        let message = reply
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unexpected upload reply");
        Err(PublishError::Api(message.to_owned()))
    }
}

impl std::fmt::Debug for TelegraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegraphClient")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::testing::{serve, serve_once};

    #[tokio::test]
    async fn test_publish_creates_account_once() {
        let (url, requests) = serve(vec![
            (200, r#"{"ok":true,"result":{"access_token":"tok"}}"#.to_owned()),
            (200, r#"{"ok":true,"result":{"url":"https://telegra.ph/A-01"}}"#.to_owned()),
            (200, r#"{"ok":true,"result":{"url":"https://telegra.ph/B-01"}}"#.to_owned()),
        ])
        .await;
        let client = TelegraphClient::new(url, "unused", Duration::from_secs(5)).unwrap();

        let first = client.publish("A", "<p>one</p>").await.unwrap();
        let second = client.publish("B", "<p>two</p>").await.unwrap();

        assert_eq!(first, "https://telegra.ph/A-01");
        assert_eq!(second, "https://telegra.ph/B-01");

        let requests = requests.await.unwrap();
        assert!(requests[0].starts_with("POST /createAccount"));
        assert!(requests[1].starts_with("POST /createPage"));
        assert!(requests[1].contains("access_token=tok"));
        assert!(requests[2].starts_with("POST /createPage"));
    }

    #[tokio::test]
    async fn test_publish_error_envelope() {
        let url = serve_once(200, r#"{"ok":false,"error":"CONTENT_TOO_BIG"}"#).await;
        let client = TelegraphClient::new(url, "unused", Duration::from_secs(5))
            .unwrap()
            .with_access_token("tok");

        let err = client.publish("Big", "<p>x</p>").await.unwrap_err();

        assert!(matches!(err, PublishError::Api(ref m) if m == "CONTENT_TOO_BIG"));
    }

    #[tokio::test]
    async fn test_upload_returns_fragment() {
        let url = serve_once(200, r#"[{"src":"/file/abc.jpg"}]"#).await;
        let client = TelegraphClient::new("unused", url, Duration::from_secs(5)).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xd8\xff").unwrap();

        let src = client.upload(file.path()).await.unwrap();
        assert_eq!(src, "/file/abc.jpg");
    }

    #[tokio::test]
    async fn test_upload_error_reply() {
        let url = serve_once(200, r#"{"error":"File type invalid"}"#).await;
        let client = TelegraphClient::new("unused", url, Duration::from_secs(5)).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"text").unwrap();

        let err = client.upload(file.path()).await.unwrap_err();
        assert!(matches!(err, PublishError::Api(ref m) if m == "File type invalid"));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let client =
            TelegraphClient::new("unused", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client
            .upload(Path::new("/nonexistent/media.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }
}
