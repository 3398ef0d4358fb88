/// Mutation batch builder.
///
/// Insert, Update, and Remove are identical in use: an ordered sequence of
/// typed record envelopes, sent once and immutable thereafter. The kind
/// selects which RPC the batch travels on.
use crate::codec::Envelope;

/// Which mutation RPC a batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Remove,
}

/// Ordered records for one mutation call.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    messages: Vec<Envelope>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record envelope.
    pub fn record(mut self, envelope: Envelope) -> Self {
        self.messages.push(envelope);
        self
    }

    /// Append record envelopes in order.
    pub fn records(mut self, envelopes: impl IntoIterator<Item = Envelope>) -> Self {
        self.messages.extend(envelopes);
        self
    }

    pub fn push(&mut self, envelope: Envelope) {
        self.messages.push(envelope);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn into_envelopes(self) -> Vec<Envelope> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::type_url_for;

    #[test]
    fn batch_preserves_record_order() {
        let batch = MutationBatch::new()
            .record(Envelope {
                type_url: type_url_for("strata.test.TestRecord"),
                value: vec![1],
            })
            .record(Envelope {
                type_url: type_url_for("strata.test.TestRecord"),
                value: vec![2],
            });

        assert_eq!(batch.len(), 2);
        let envelopes = batch.into_envelopes();
        assert_eq!(envelopes[0].value, vec![1]);
        assert_eq!(envelopes[1].value, vec![2]);
    }
}
