/// StrataDB gRPC client implementation
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::{Request, Status};

use strata_proto::{self as proto, strata_db_client::StrataDbClient};

use crate::error::{ClientError, Result};
use crate::expr::SearchExpression;
use crate::mutation::{MutationBatch, MutationKind};
use crate::schema::SchemaSet;
use crate::session::{MutationSession, SearchOutcome, SearchSession, SessionOptions};

/// Caller-supplied connection settings. Credentials are configuration, not
/// process-wide constants: the bearer token comes from an external signer
/// and is treated as an opaque, time-bounded string.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (e.g., "http://127.0.0.1:50051")
    pub endpoint: String,
    /// Account API key, carried inside every request frame.
    pub api_key: String,
    /// Bearer token attached as `authorization` metadata on every call.
    pub bearer_token: String,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

/// Attaches the bearer token to every outgoing request. A token that
/// expires mid-stream surfaces as a failed session, never a silent retry.
#[derive(Clone)]
pub struct AuthInterceptor {
    authorization: MetadataValue<Ascii>,
}

impl tonic::service::Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert("authorization", self.authorization.clone());
        Ok(request)
    }
}

const FRAME_BUFFER: usize = 16;

/// StrataDB remote client
pub struct Client {
    inner: StrataDbClient<InterceptedService<Channel, AuthInterceptor>>,
    api_key: String,
    options: SessionOptions,
}

impl Client {
    /// Connect to a StrataDB server
    ///
    /// # Example
    /// ```no_run
    /// # use strata_client::{Client, ClientConfig};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ClientConfig::new("http://localhost:50051", "API_KEY", "JWT");
    /// let client = Client::connect(config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let authorization: MetadataValue<Ascii> =
            MetadataValue::try_from(format!("Bearer {}", config.bearer_token)).map_err(
                |e| ClientError::InvalidArgument(format!("Invalid bearer token: {}", e)),
            )?;

        let channel = Channel::from_shared(config.endpoint.clone())
            .map_err(|e| ClientError::ConnectionError(format!("Invalid address: {}", e)))?
            .connect()
            .await
            .map_err(|e| ClientError::ConnectionError(format!("Failed to connect: {}", e)))?;

        let inner =
            StrataDbClient::with_interceptor(channel, AuthInterceptor { authorization });
        Ok(Self {
            inner,
            api_key: config.api_key,
            options: SessionOptions::default(),
        })
    }

    /// Override the default session options for subsequent calls.
    pub fn session_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Insert a batch of records.
    ///
    /// Mutation streams produce no payload; success is the stream closing
    /// cleanly, and the first reported error aborts the whole batch.
    pub async fn insert(&mut self, batch: MutationBatch) -> Result<()> {
        self.run_mutation(MutationKind::Insert, batch).await
    }

    /// Update a batch of records.
    pub async fn update(&mut self, batch: MutationBatch) -> Result<()> {
        self.run_mutation(MutationKind::Update, batch).await
    }

    /// Remove a batch of records.
    pub async fn remove(&mut self, batch: MutationBatch) -> Result<()> {
        self.run_mutation(MutationKind::Remove, batch).await
    }

    async fn run_mutation(&mut self, kind: MutationKind, batch: MutationBatch) -> Result<()> {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let request = Request::new(ReceiverStream::new(rx));
        let response = match kind {
            MutationKind::Insert => self.inner.insert(request).await?,
            MutationKind::Update => self.inner.update(request).await?,
            MutationKind::Remove => self.inner.remove(request).await?,
        };

        let mut session = MutationSession::start(self.api_key.clone(), tx, response.into_inner());
        session.send(batch.into_envelopes()).await?;
        session.half_close()?;
        session.finish().await
    }

    /// Run one search batch to completion: send, half-close, drain.
    ///
    /// The outcome carries per-index accumulators plus any unfinished
    /// indices; use [`SearchOutcome::require_complete`] to insist on a fully
    /// terminal result set.
    pub async fn search(&mut self, queries: Vec<SearchExpression>) -> Result<SearchOutcome> {
        let mut session = self.search_session().await?;
        session.send(queries).await?;
        session.half_close()?;
        session.finish().await
    }

    /// Open a search session for callers that drive the state machine
    /// themselves (several send calls before half-close, index bookkeeping).
    pub async fn search_session(&mut self) -> Result<SearchSession> {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let response = self
            .inner
            .search(Request::new(ReceiverStream::new(rx)))
            .await?;
        Ok(SearchSession::start(
            self.api_key.clone(),
            self.options,
            tx,
            response.into_inner(),
        ))
    }

    /// Replace the service's active schema set with exactly `schemas`.
    ///
    /// All-or-nothing: a non-Ack outcome means the prior set is unchanged.
    /// Schemas omitted from an accepted set are dropped along with their
    /// data.
    pub async fn subscribe(&mut self, schemas: &SchemaSet) -> Result<()> {
        let request = proto::SubscribeRequest {
            api_key: self.api_key.clone(),
            schemas: schemas.sources().to_vec(),
        };

        self.inner
            .subscribe(request)
            .await
            .map(|_| ())
            .map_err(subscribe_error)
    }
}

/// Any non-Ack leaves the service's prior schema set untouched; validation
/// rejections get their own variant, transport failures keep theirs.
fn subscribe_error(status: Status) -> ClientError {
    match status.code() {
        tonic::Code::InvalidArgument | tonic::Code::FailedPrecondition => {
            ClientError::SchemaRejected(status.message().to_string())
        }
        _ => status.into(),
    }
}
