//! AniList GraphQL client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{AiringEntry, LookupError, LookupKind, LookupRequest, LookupResult, QueryDocument};
use crate::oplog::OperationalLog;

/// Anything that can answer a GraphQL query document.
#[async_trait]
pub trait LookupBackend: Send + Sync {
    /// Sends one query and returns the `data` object of the reply.
    async fn fetch(&self, document: QueryDocument, variables: Value) -> Result<Value, LookupError>;

    /// Fetches and decodes a lookup request.
    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResult, LookupError> {
        let data = self
            .fetch(request.kind.document(), request.variables())
            .await?;
        decode(request.kind, &data)
    }

    /// Fetches the upcoming airing schedule page.
    async fn scheduled(&self) -> Result<Vec<AiringEntry>, LookupError> {
        let data = self
            .fetch(QueryDocument::AiringSchedule, json!({"notYetAired": true}))
            .await?;
        let entries = take(&data, "/Page/airingSchedules")?;
        Ok(entries)
    }
}

/// HTTP client for the AniList endpoint.
pub struct AniListClient {
    http: Client,
    endpoint: String,
    ops: Arc<dyn OperationalLog>,
}

impl AniListClient {
    /// Creates a client for `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        ops: Arc<dyn OperationalLog>,
    ) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            ops,
        })
    }
}

#[async_trait]
impl LookupBackend for AniListClient {
    async fn fetch(&self, document: QueryDocument, variables: Value) -> Result<Value, LookupError> {
        debug!("AniList query {:?} with {}", document, variables);

        let body = json!({ "query": document.text(), "variables": variables });
        let response = self.http.post(&self.endpoint).json(&body).send().await?;

        // Error statuses still carry a GraphQL error list in the body.
        let status = response.status();
        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).map_err(|e| {
            LookupError::Transport(format!("HTTP status {status} with unreadable body: {e}"))
        })?;

        extract_data(payload, self.ops.as_ref()).await
    }
}

impl std::fmt::Debug for AniListClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AniListClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Splits a GraphQL reply into its `data` object or the first remote error.
///
/// The full error list goes to the operational log exactly once.
pub async fn extract_data(payload: Value, ops: &dyn OperationalLog) -> Result<Value, LookupError> {
    if let Some(errors) = payload
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
    {
        ops.log(&format!(
            "ANILIST RETURNED FOLLOWING ERROR:\n\n{}",
            Value::Array(errors.clone())
        ))
        .await;

        let message = errors
            .first()
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_owned();
        warn!("AniList error: {}", message);
        return Err(LookupError::Remote(message));
    }

    match payload {
        Value::Object(mut map) => map
            .remove("data")
            .filter(|data| !data.is_null())
            .ok_or_else(|| LookupError::MalformedPayload("no data in reply".to_owned())),
        _ => Err(LookupError::MalformedPayload(
            "reply is not a JSON object".to_owned(),
        )),
    }
}

/// Decodes the `data` object of a lookup into its typed form.
pub fn decode(kind: LookupKind, data: &Value) -> Result<LookupResult, LookupError> {
    let result = match kind {
        LookupKind::Anime => LookupResult::Anime(Box::new(take(data, "/Media")?)),
        LookupKind::AiringSchedule => LookupResult::Airing(Box::new(take(data, "/Media")?)),
        LookupKind::Manga => LookupResult::Manga(Box::new(take(data, "/Media")?)),
        LookupKind::Character => LookupResult::Character(Box::new(take(data, "/Character")?)),
    };
    Ok(result)
}

fn take<T: DeserializeOwned>(data: &Value, pointer: &str) -> Result<T, LookupError> {
    let value = data
        .pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| LookupError::MalformedPayload(format!("{pointer} is missing")))?;

    serde_json::from_value(value.clone())
        .map_err(|e| LookupError::MalformedPayload(format!("{pointer}: {e}")))
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::oplog::MemoryLog;
    use crate::testing::serve_once;

    #[tokio::test]
    async fn test_remote_error_logged_once() {
        let ops = MemoryLog::new();
        let payload = json!({"errors": [{"message": "Not Found.", "status": 404}], "data": {"Media": null}});

        let err = extract_data(payload, &ops).await.unwrap_err();

        assert!(matches!(err, LookupError::Remote(ref m) if m == "Not Found."));
        let entries = ops.entries().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains("Not Found."));
    }

    #[tokio::test]
    async fn test_data_returned_without_logging() {
        let ops = MemoryLog::new();
        let payload = json!({"data": {"Media": {"id": 1}}});

        let data = extract_data(payload, &ops).await.unwrap();

        assert_eq!(data, json!({"Media": {"id": 1}}));
        assert!(ops.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_is_malformed() {
        let ops = MemoryLog::new();
        let err = extract_data(json!({"data": null}), &ops).await.unwrap_err();
        assert!(matches!(err, LookupError::MalformedPayload(_)));

        let err = extract_data(json!([1, 2]), &ops).await.unwrap_err();
        assert!(matches!(err, LookupError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_anime() {
        let data = json!({"Media": {
            "id": 98444,
            "idMal": 37450,
            "title": {"romaji": "Seishun Buta Yarou", "english": null, "native": "青春ブタ野郎"},
            "relations": {"edges": []},
            "isAdult": false
        }});
        let LookupResult::Anime(media) = decode(LookupKind::Anime, &data).unwrap() else {
            panic!("expected anime");
        };
        assert_eq!(media.id, 98444);
        assert_eq!(media.id_mal, Some(37450));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let data = json!({"Media": {"id": "not-a-number"}});
        assert!(matches!(
            decode(LookupKind::Anime, &data),
            Err(LookupError::MalformedPayload(_))
        ));

        let data = json!({"Character": null});
        assert!(matches!(
            decode(LookupKind::Character, &data),
            Err(LookupError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_client_reads_error_body_of_404() {
        let url = serve_once(
            404,
            r#"{"errors":[{"message":"Not Found.","status":404}],"data":{"Media":null}}"#,
        )
        .await;
        let ops = Arc::new(MemoryLog::new());
        let client = AniListClient::new(url, Duration::from_secs(5), ops.clone()).unwrap();

        let request =
            LookupRequest::build(LookupKind::Anime, "does not exist", &[] as &[&str]).unwrap();
        let err = client.lookup(&request).await.unwrap_err();

        assert!(matches!(err, LookupError::Remote(ref m) if m == "Not Found."));
        assert_eq!(ops.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_client_schedule() {
        let url = serve_once(
            200,
            r#"{"data":{"Page":{"airingSchedules":[{"id":1,"airingAt":1700000000,"timeUntilAiring":3600,"episode":4,"mediaId":21,"media":{"title":{"romaji":"One Piece"},"siteUrl":"https://anilist.co/anime/21"}}]}}}"#,
        )
        .await;
        let client =
            AniListClient::new(url, Duration::from_secs(5), Arc::new(MemoryLog::new())).unwrap();

        let entries = client.scheduled().await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].media_id, 21);
        assert_eq!(entries[0].episode, 4);
    }

    #[tokio::test]
    async fn test_client_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AniListClient::new(
            format!("http://{addr}"),
            Duration::from_secs(2),
            Arc::new(MemoryLog::new()),
        )
        .unwrap();
        let err = client
            .fetch(QueryDocument::Anime, json!({"id": 1}))
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::Transport(_)));
    }
}
