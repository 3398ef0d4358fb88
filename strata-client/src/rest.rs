/// REST transport: the same operation model over HTTP+JSON.
///
/// Verb/path mapping: `POST /rest/insert`, `PATCH /rest/update`,
/// `DELETE /rest/remove`, `GET /rest/search` (with body),
/// `POST /rest/subscribe`. Payload envelopes follow the protobuf JSON
/// mapping of `Any`: an `@type` key plus the record fields inline.
///
/// Search over REST returns the complete response as one body. It is fed
/// through the same correlation table as the streaming path (one frame,
/// then end-of-stream), so finished-set handling, anomaly recording, and
/// incompleteness detection are identical across transports.
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ClientConfig;
use crate::error::{ClientError, Result};
use crate::expr::{validate_basic, Comparison, LogicalOp};
use crate::schema::SchemaSet;
use crate::session::{CorrelationTable, Frame, SearchOutcome};

/// JSON rendition of a typed payload envelope: the record fields plus an
/// `@type` key carrying the fully-qualified schema name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonEnvelope(serde_json::Map<String, Value>);

impl JsonEnvelope {
    /// Wrap record fields under a schema type name. `fields` must be a JSON
    /// object whose keys match the schema's field names.
    pub fn new(type_name: &str, fields: Value) -> Result<Self> {
        let Value::Object(mut map) = fields else {
            return Err(ClientError::InvalidArgument(
                "envelope fields must be a JSON object".to_string(),
            ));
        };
        map.insert(
            "@type".to_string(),
            Value::String(crate::codec::type_url_for(type_name)),
        );
        Ok(Self(map))
    }

    /// The fully-qualified schema name, if the `@type` key is present.
    pub fn type_name(&self) -> Option<&str> {
        self.0
            .get("@type")
            .and_then(Value::as_str)
            .map(crate::codec::full_name_of)
    }

    pub fn fields(&self) -> &serde_json::Map<String, Value> {
        &self.0
    }
}

/// A basic search expression with JSON operands. REST mirrors the wire
/// model; composite forms travel over gRPC only.
#[derive(Debug, Clone, Serialize)]
pub struct JsonExpression {
    basic: JsonBasic,
}

#[derive(Debug, Clone, Serialize)]
struct JsonBasic {
    logical_operator: LogicalOp,
    comparisons: Vec<Comparison>,
    operands: Vec<JsonEnvelope>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<u32>,
}

impl JsonExpression {
    /// Construct a validated basic expression; the same structural rules as
    /// the gRPC expression model apply.
    pub fn basic(
        logical: LogicalOp,
        comparisons: Vec<Comparison>,
        operands: Vec<JsonEnvelope>,
        fields: Vec<u32>,
    ) -> Result<Self> {
        validate_basic(comparisons.len(), operands.len(), fields.len())?;
        Ok(Self {
            basic: JsonBasic {
                logical_operator: logical,
                comparisons,
                operands,
                fields,
            },
        })
    }
}

#[derive(Serialize)]
struct MutationBody<'a> {
    api_key: &'a str,
    messages: &'a [JsonEnvelope],
}

#[derive(Serialize)]
struct SearchBody<'a> {
    api_key: &'a str,
    queries: &'a [JsonExpression],
}

#[derive(Serialize)]
struct SubscribeBody<'a> {
    api_key: &'a str,
    schemas: &'a [String],
}

#[derive(Deserialize)]
struct JsonSearchResponse {
    #[serde(default)]
    results: Vec<JsonQueryResult>,
    #[serde(default)]
    finished: Vec<u32>,
}

#[derive(Deserialize)]
struct JsonQueryResult {
    index: u32,
    #[serde(default)]
    messages: Vec<JsonEnvelope>,
}

impl From<JsonSearchResponse> for Frame<JsonEnvelope> {
    fn from(response: JsonSearchResponse) -> Self {
        Frame {
            results: response
                .results
                .into_iter()
                .map(|r| (r.index, r.messages))
                .collect(),
            finished: response.finished,
        }
    }
}

/// StrataDB client over HTTP+JSON.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    bearer_token: String,
}

impl RestClient {
    /// Build a REST client from the same configuration as the gRPC client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            bearer_token: config.bearer_token,
        }
    }

    /// Insert a batch of records. No response body; errors arrive as HTTP
    /// status codes, fail-fast for the whole batch.
    pub async fn insert(&self, messages: &[JsonEnvelope]) -> Result<()> {
        self.mutate(Method::POST, "insert", messages).await
    }

    /// Update a batch of records.
    pub async fn update(&self, messages: &[JsonEnvelope]) -> Result<()> {
        self.mutate(Method::PATCH, "update", messages).await
    }

    /// Remove a batch of records.
    pub async fn remove(&self, messages: &[JsonEnvelope]) -> Result<()> {
        self.mutate(Method::DELETE, "remove", messages).await
    }

    async fn mutate(&self, method: Method, path: &str, messages: &[JsonEnvelope]) -> Result<()> {
        if messages.is_empty() {
            return Err(ClientError::InvalidState(
                "batch must contain at least one record".to_string(),
            ));
        }
        let body = MutationBody {
            api_key: &self.api_key,
            messages,
        };
        let response = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        expect_ok(response).await.map(|_| ())
    }

    /// Run one search batch. The complete response body is merged through
    /// the correlation table, so the outcome semantics match the gRPC
    /// streaming path exactly.
    pub async fn search(
        &self,
        queries: &[JsonExpression],
    ) -> Result<SearchOutcome<JsonEnvelope>> {
        if queries.is_empty() {
            return Err(ClientError::InvalidState(
                "batch must contain at least one query".to_string(),
            ));
        }

        let mut table = CorrelationTable::new();
        table.reserve(queries.len());

        let body = SearchBody {
            api_key: &self.api_key,
            queries,
        };
        let response = self
            .http
            .request(Method::GET, self.url("search"))
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_ok(response).await?;

        let parsed: JsonSearchResponse = response
            .json()
            .await
            .map_err(|e| ClientError::DecodeError(e.to_string()))?;

        table.apply(Frame::from(parsed));
        Ok(table.take_outcome())
    }

    /// Replace the service's active schema set. All-or-nothing; a rejection
    /// leaves the prior set unchanged.
    pub async fn subscribe(&self, schemas: &SchemaSet) -> Result<()> {
        let body = SubscribeBody {
            api_key: &self.api_key,
            schemas: schemas.sources(),
        };
        let response = self
            .http
            .post(self.url("subscribe"))
            .bearer_auth(&self.bearer_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                Err(ClientError::SchemaRejected(detail))
            }
            other => Err(status_error(other, detail)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/{}", self.base_url, path)
    }
}

fn transport_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout(error.to_string())
    } else {
        ClientError::ConnectionError(error.to_string())
    }
}

async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let detail = response.text().await.unwrap_or_default();
        Err(status_error(status, detail))
    }
}

fn status_error(status: StatusCode, detail: String) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::InvalidArgument(detail)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::PermissionDenied(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientError::Timeout(detail),
        StatusCode::TOO_MANY_REQUESTS => ClientError::ResourceExhausted(detail),
        StatusCode::SERVICE_UNAVAILABLE => ClientError::Unavailable(detail),
        status if status.is_server_error() => ClientError::InternalError(detail),
        _ => ClientError::Unknown(detail),
    }
}
