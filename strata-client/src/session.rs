/// Stream session: one bidirectional channel, N multiplexed operations.
///
/// A session owns exactly one batch. The send side transmits frames and then
/// half-closes; the receive side runs as its own task from the moment the
/// session starts, demultiplexing response frames into per-index buckets.
/// The two sides share nothing but the correlation table, guarded by a single
/// mutex that is never held across an await.
///
/// Without a half-close the receive side blocks indefinitely. That mirrors
/// the service's wait-for-complete-intent contract and is not worked around
/// here; callers needing a deadline cancel the channel externally.
use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tonic::Status;
use tracing::{debug, warn};

use strata_proto as proto;

use crate::codec::Envelope;
use crate::error::{ClientError, Result};
use crate::expr::SearchExpression;

/// Session lifecycle. `Failed` is terminal and reachable from any
/// non-`Closed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Open,
    Sending,
    HalfClosed,
    Draining,
    Closed,
    Failed,
}

/// Per-session knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Treat protocol anomalies (duplicate finishes, results for terminal or
    /// unknown indices) as session failure instead of recording them.
    pub strict_protocol: bool,
}

/// A protocol violation by the service. Recorded and logged, never fatal
/// unless [`SessionOptions::strict_protocol`] is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// An index already marked finished was finished again.
    DuplicateFinish { index: u32 },
    /// Results arrived for an index already marked finished; the extra
    /// messages were discarded.
    ResultAfterFinish { index: u32, discarded: usize },
    /// A frame referenced an index outside the assigned batch range.
    UnknownIndex { index: u32 },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::DuplicateFinish { index } => {
                write!(f, "duplicate finish for index {index}")
            }
            Anomaly::ResultAfterFinish { index, discarded } => {
                write!(f, "{discarded} results after finish for index {index}")
            }
            Anomaly::UnknownIndex { index } => {
                write!(f, "frame referenced unassigned index {index}")
            }
        }
    }
}

/// One decoded response frame, transport-agnostic.
pub(crate) struct Frame<M> {
    pub results: Vec<(u32, Vec<M>)>,
    pub finished: Vec<u32>,
}

impl From<proto::SearchResponse> for Frame<Envelope> {
    fn from(response: proto::SearchResponse) -> Self {
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

#[derive(Debug, Default)]
struct Bucket<M> {
    messages: Vec<M>,
    finished: bool,
}

/// The only shared mutable state in a session: per-index accumulators plus
/// the anomaly log. The receive side appends and finishes; the send side
/// only reserves new indices.
#[derive(Debug)]
pub(crate) struct CorrelationTable<M> {
    buckets: Vec<Bucket<M>>,
    anomalies: Vec<Anomaly>,
}

impl<M> CorrelationTable<M> {
    pub(crate) fn new() -> Self {
        Self {
            buckets: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Assign indices to `count` newly submitted operations, in submission
    /// order.
    pub(crate) fn reserve(&mut self, count: usize) -> Range<u32> {
        let start = self.buckets.len() as u32;
        self.buckets
            .extend((0..count).map(|_| Bucket { messages: Vec::new(), finished: false }));
        start..start + count as u32
    }

    /// Merge one response frame. Partial results append in receipt order;
    /// finish marks are terminal. Violations are recorded, logged, and
    /// otherwise ignored.
    pub(crate) fn apply(&mut self, frame: Frame<M>) {
        for (index, messages) in frame.results {
            match self.buckets.get_mut(index as usize) {
                None => self.record(Anomaly::UnknownIndex { index }),
                Some(bucket) if bucket.finished => self.record(Anomaly::ResultAfterFinish {
                    index,
                    discarded: messages.len(),
                }),
                Some(bucket) => bucket.messages.extend(messages),
            }
        }
        for index in frame.finished {
            match self.buckets.get_mut(index as usize) {
                None => self.record(Anomaly::UnknownIndex { index }),
                Some(bucket) if bucket.finished => {
                    self.record(Anomaly::DuplicateFinish { index })
                }
                Some(bucket) => bucket.finished = true,
            }
        }
    }

    fn record(&mut self, anomaly: Anomaly) {
        warn!(%anomaly, "search stream protocol anomaly");
        self.anomalies.push(anomaly);
    }

    pub(crate) fn take_outcome(&mut self) -> SearchOutcome<M> {
        SearchOutcome {
            results: std::mem::take(&mut self.buckets)
                .into_iter()
                .enumerate()
                .map(|(index, bucket)| QueryResults {
                    index: index as u32,
                    messages: bucket.messages,
                    finished: bucket.finished,
                })
                .collect(),
            anomalies: std::mem::take(&mut self.anomalies),
        }
    }
}

/// Accumulated results for one query index.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults<M = Envelope> {
    pub index: u32,
    /// Result fragments in receipt order.
    pub messages: Vec<M>,
    /// Whether the service declared this index complete.
    pub finished: bool,
}

/// Final (or partial) per-index state of one search session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<M = Envelope> {
    /// One entry per assigned index, in index order.
    pub results: Vec<QueryResults<M>>,
    /// Protocol violations observed while draining.
    pub anomalies: Vec<Anomaly>,
}

impl<M> SearchOutcome<M> {
    /// Whether every assigned index was declared finished.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|r| r.finished)
    }

    /// Indices the stream ended without finishing.
    pub fn unfinished(&self) -> Vec<u32> {
        self.results
            .iter()
            .filter(|r| !r.finished)
            .map(|r| r.index)
            .collect()
    }

    /// Accumulated messages for one index, if it was assigned.
    pub fn messages(&self, index: u32) -> Option<&[M]> {
        self.results
            .get(index as usize)
            .map(|r| r.messages.as_slice())
    }

    /// Fail with [`ClientError::IncompleteResults`] unless every index is
    /// terminal. Silent truncation is forbidden; this is the explicit check.
    pub fn require_complete(self) -> Result<Self> {
        let unfinished = self.unfinished();
        if unfinished.is_empty() {
            Ok(self)
        } else {
            Err(ClientError::IncompleteResults { unfinished })
        }
    }
}

fn spawn_receiver<M, S>(
    table: Arc<Mutex<CorrelationTable<M>>>,
    mut inbound: S,
) -> JoinHandle<std::result::Result<(), Status>>
where
    M: Send + 'static,
    S: Stream<Item = std::result::Result<proto::SearchResponse, Status>> + Send + Unpin + 'static,
    Frame<M>: From<proto::SearchResponse>,
{
    tokio::spawn(async move {
        while let Some(frame) = inbound.next().await {
            let frame = frame?;
            debug!(
                results = frame.results.len(),
                finished = frame.finished.len(),
                "search response frame"
            );
            table.lock().apply(Frame::from(frame));
        }
        Ok(())
    })
}

/// One search call: send a batch of queries, half-close, drain multiplexed
/// results.
///
/// The receive task starts immediately, so the service can begin streaming
/// partial results before the batch is fully sent.
pub struct SearchSession {
    state: SessionState,
    options: SessionOptions,
    api_key: String,
    outbound: Option<mpsc::Sender<proto::SearchBatch>>,
    table: Arc<Mutex<CorrelationTable<Envelope>>>,
    receiver: JoinHandle<std::result::Result<(), Status>>,
}

impl SearchSession {
    /// Wire a session over an arbitrary transport pair: an outbound frame
    /// sink and an inbound response stream. The gRPC client and tests plug
    /// in identically.
    pub fn start<S>(
        api_key: impl Into<String>,
        options: SessionOptions,
        outbound: mpsc::Sender<proto::SearchBatch>,
        inbound: S,
    ) -> Self
    where
        S: Stream<Item = std::result::Result<proto::SearchResponse, Status>>
            + Send
            + Unpin
            + 'static,
    {
        let table = Arc::new(Mutex::new(CorrelationTable::new()));
        let receiver = spawn_receiver(Arc::clone(&table), inbound);
        Self {
            state: SessionState::Open,
            options,
            api_key: api_key.into(),
            outbound: Some(outbound),
            table,
            receiver,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Submit queries as one frame. Returns the index range assigned to
    /// them, in submission order. Indices are stable for the stream's
    /// lifetime.
    pub async fn send(&mut self, queries: Vec<SearchExpression>) -> Result<Range<u32>> {
        match self.state {
            SessionState::Open | SessionState::Sending => {}
            state => {
                return Err(ClientError::InvalidState(format!(
                    "cannot send in {state:?} state"
                )))
            }
        }
        if queries.is_empty() {
            return Err(ClientError::InvalidState(
                "batch must contain at least one query".to_string(),
            ));
        }

        let range = self.table.lock().reserve(queries.len());
        let frame = proto::SearchBatch {
            api_key: self.api_key.clone(),
            queries: queries.into_iter().map(SearchExpression::into_proto).collect(),
        };

        let outbound = self.outbound.as_ref().ok_or_else(|| {
            ClientError::InvalidState("send side already released".to_string())
        })?;
        if outbound.send(frame).await.is_err() {
            self.state = SessionState::Failed;
            return Err(ClientError::ConnectionError(
                "request stream closed by transport".to_string(),
            ));
        }

        self.state = SessionState::Sending;
        debug!(indices = ?range, "search batch frame sent");
        Ok(range)
    }

    /// Signal that no further frames will be sent. The service finalizes
    /// only after this; it is required before [`finish`](Self::finish).
    pub fn half_close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Sending => {
                self.outbound = None;
                self.state = SessionState::HalfClosed;
                Ok(())
            }
            SessionState::Open => Err(ClientError::InvalidState(
                "half-close before any batch was sent".to_string(),
            )),
            state => Err(ClientError::InvalidState(format!(
                "cannot half-close in {state:?} state"
            ))),
        }
    }

    /// Drain the response stream to end-of-stream and return the per-index
    /// outcome.
    ///
    /// End-of-stream with unfinished indices is reported through the
    /// outcome, not an error: accumulated data for finished indices stays
    /// fully valid and [`SearchOutcome::require_complete`] makes the
    /// incompleteness explicit. A transport error fails the session but
    /// still exposes the partial accumulators.
    pub async fn finish(&mut self) -> Result<SearchOutcome> {
        match self.state {
            SessionState::HalfClosed => {}
            state => {
                return Err(ClientError::InvalidState(format!(
                    "cannot finish in {state:?} state"
                )))
            }
        }
        self.state = SessionState::Draining;

        let drained = (&mut self.receiver).await;
        let outcome = self.table.lock().take_outcome();

        match drained {
            Ok(Ok(())) => {
                if self.options.strict_protocol && !outcome.anomalies.is_empty() {
                    self.state = SessionState::Failed;
                    let detail = outcome
                        .anomalies
                        .iter()
                        .map(Anomaly::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(ClientError::StreamFailed {
                        source: Box::new(ClientError::ProtocolViolation(detail)),
                        partial: outcome,
                    });
                }
                self.state = SessionState::Closed;
                Ok(outcome)
            }
            Ok(Err(status)) => {
                self.state = SessionState::Failed;
                Err(ClientError::StreamFailed {
                    source: Box::new(ClientError::from(status)),
                    partial: outcome,
                })
            }
            Err(join_error) => {
                self.state = SessionState::Failed;
                Err(ClientError::StreamFailed {
                    source: Box::new(ClientError::InternalError(format!(
                        "receive task aborted: {join_error}"
                    ))),
                    partial: outcome,
                })
            }
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        // Unblocks the receive task if the session is abandoned mid-stream.
        self.receiver.abort();
    }
}

/// One mutation call (insert, update, or remove — identical in use).
///
/// Mutation streams produce no payload frames: completion is end-of-stream,
/// and the first reported error aborts the outcome for the whole batch.
pub struct MutationSession {
    state: SessionState,
    api_key: String,
    outbound: Option<mpsc::Sender<proto::MutationBatch>>,
    receiver: JoinHandle<std::result::Result<(), Status>>,
}

impl MutationSession {
    /// Wire a session over an outbound frame sink and an inbound ack stream.
    pub fn start<S>(
        api_key: impl Into<String>,
        outbound: mpsc::Sender<proto::MutationBatch>,
        mut inbound: S,
    ) -> Self
    where
        S: Stream<Item = std::result::Result<proto::MutationAck, Status>>
            + Send
            + Unpin
            + 'static,
    {
        let receiver = tokio::spawn(async move {
            // Fail fast on the first error status; acks carry nothing.
            while let Some(ack) = inbound.next().await {
                ack?;
            }
            Ok(())
        });
        Self {
            state: SessionState::Open,
            api_key: api_key.into(),
            outbound: Some(outbound),
            receiver,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Submit one frame of typed record envelopes.
    pub async fn send(&mut self, envelopes: Vec<Envelope>) -> Result<()> {
        match self.state {
            SessionState::Open | SessionState::Sending => {}
            state => {
                return Err(ClientError::InvalidState(format!(
                    "cannot send in {state:?} state"
                )))
            }
        }
        if envelopes.is_empty() {
            return Err(ClientError::InvalidState(
                "batch must contain at least one record".to_string(),
            ));
        }

        let frame = proto::MutationBatch {
            api_key: self.api_key.clone(),
            messages: envelopes,
        };
        let outbound = self.outbound.as_ref().ok_or_else(|| {
            ClientError::InvalidState("send side already released".to_string())
        })?;
        if outbound.send(frame).await.is_err() {
            self.state = SessionState::Failed;
            return Err(ClientError::ConnectionError(
                "request stream closed by transport".to_string(),
            ));
        }
        self.state = SessionState::Sending;
        Ok(())
    }

    /// Signal that no further frames will be sent.
    pub fn half_close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Sending => {
                self.outbound = None;
                self.state = SessionState::HalfClosed;
                Ok(())
            }
            SessionState::Open => Err(ClientError::InvalidState(
                "half-close before any batch was sent".to_string(),
            )),
            state => Err(ClientError::InvalidState(format!(
                "cannot half-close in {state:?} state"
            ))),
        }
    }

    /// Await end-of-stream. Success carries no payload; the terminal status
    /// is the whole outcome.
    pub async fn finish(&mut self) -> Result<()> {
        match self.state {
            SessionState::HalfClosed => {}
            state => {
                return Err(ClientError::InvalidState(format!(
                    "cannot finish in {state:?} state"
                )))
            }
        }
        self.state = SessionState::Draining;

        match (&mut self.receiver).await {
            Ok(Ok(())) => {
                self.state = SessionState::Closed;
                Ok(())
            }
            Ok(Err(status)) => {
                self.state = SessionState::Failed;
                Err(ClientError::from(status))
            }
            Err(join_error) => {
                self.state = SessionState::Failed;
                Err(ClientError::InternalError(format!(
                    "receive task aborted: {join_error}"
                )))
            }
        }
    }
}

impl Drop for MutationSession {
    fn drop(&mut self) {
        self.receiver.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::type_url_for;

    fn envelope(marker: u8) -> Envelope {
        Envelope {
            type_url: type_url_for("strata.test.TestRecord"),
            value: vec![marker],
        }
    }

    fn frame(results: Vec<(u32, Vec<Envelope>)>, finished: Vec<u32>) -> Frame<Envelope> {
        Frame { results, finished }
    }

    #[test]
    fn results_merge_in_receipt_order_within_an_index() {
        let mut table = CorrelationTable::new();
        table.reserve(2);

        table.apply(frame(vec![(0, vec![envelope(1)])], vec![]));
        table.apply(frame(vec![(1, vec![envelope(9)])], vec![1]));
        table.apply(frame(vec![(0, vec![envelope(2), envelope(3)])], vec![0]));

        let outcome = table.take_outcome();
        assert!(outcome.is_complete());
        assert!(outcome.anomalies.is_empty());
        let zero: Vec<u8> = outcome.results[0].messages.iter().map(|m| m.value[0]).collect();
        assert_eq!(zero, vec![1, 2, 3]);
        assert_eq!(outcome.results[1].messages.len(), 1);
    }

    #[test]
    fn out_of_range_index_is_recorded_not_attributed() {
        let mut table = CorrelationTable::new();
        table.reserve(1);

        table.apply(frame(vec![(5, vec![envelope(1)])], vec![5]));

        let outcome = table.take_outcome();
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].messages.is_empty());
        assert_eq!(
            outcome.anomalies,
            vec![
                Anomaly::UnknownIndex { index: 5 },
                Anomaly::UnknownIndex { index: 5 },
            ]
        );
    }

    #[test]
    fn second_finish_is_duplicate_finish_and_idempotent() {
        let mut table = CorrelationTable::new();
        table.reserve(1);

        table.apply(frame(vec![], vec![0]));
        table.apply(frame(vec![], vec![0]));

        let outcome = table.take_outcome();
        assert!(outcome.results[0].finished);
        assert_eq!(outcome.anomalies, vec![Anomaly::DuplicateFinish { index: 0 }]);
    }

    #[test]
    fn results_after_finish_are_discarded() {
        let mut table = CorrelationTable::new();
        table.reserve(1);

        table.apply(frame(vec![(0, vec![envelope(1)])], vec![0]));
        table.apply(frame(vec![(0, vec![envelope(2), envelope(3)])], vec![]));

        let outcome = table.take_outcome();
        assert_eq!(outcome.results[0].messages.len(), 1);
        assert_eq!(
            outcome.anomalies,
            vec![Anomaly::ResultAfterFinish { index: 0, discarded: 2 }]
        );
    }

    #[test]
    fn reserve_assigns_indices_by_submission_order() {
        let mut table = CorrelationTable::<Envelope>::new();
        assert_eq!(table.reserve(2), 0..2);
        assert_eq!(table.reserve(3), 2..5);
    }

    #[test]
    fn incomplete_outcome_scopes_to_unfinished_indices() {
        let mut table = CorrelationTable::new();
        table.reserve(2);
        table.apply(frame(vec![(0, vec![envelope(1)])], vec![0]));

        let outcome = table.take_outcome();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.unfinished(), vec![1]);
        assert_eq!(outcome.messages(0).unwrap().len(), 1);

        match outcome.require_complete().unwrap_err() {
            ClientError::IncompleteResults { unfinished } => assert_eq!(unfinished, vec![1]),
            other => panic!("expected IncompleteResults, got {other:?}"),
        }
    }
}
