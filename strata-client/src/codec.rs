/// Typed payload codec: packs caller records into self-describing envelopes
/// and back.
///
/// Payloads travel as `google.protobuf.Any` envelopes: a fully-qualified
/// type name plus serialized bytes. The protocol layer never inspects the
/// bytes; decoding goes through an explicit registry of known record types
/// rather than any form of reflection.
use std::collections::HashMap;

use prost::Name;

use crate::error::{ClientError, Result};

/// Transport envelope: `{type identifier, serialized bytes}`.
pub type Envelope = prost_types::Any;

const TYPE_URL_DOMAIN: &str = "type.googleapis.com";

/// Build the envelope type URL for a fully-qualified message name.
pub fn type_url_for(full_name: &str) -> String {
    format!("{}/{}", TYPE_URL_DOMAIN, full_name)
}

/// Extract the fully-qualified message name from an envelope type URL.
/// The part after the final '/' is always the proto package and message name.
pub fn full_name_of(type_url: &str) -> &str {
    type_url.rsplit('/').next().unwrap_or(type_url)
}

type DecodeFn =
    Box<dyn Fn(&[u8]) -> Result<Box<dyn std::any::Any + Send>> + Send + Sync>;

/// Explicit map from fully-qualified type names to decoders.
///
/// Registration is the caller's statement of which schemas it was compiled
/// against; marshaling a type that was never registered is an
/// [`ClientError::UnknownSchema`] error before any bytes hit the wire.
#[derive(Default)]
pub struct SchemaRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type, making it eligible for marshal and for the
    /// dynamic decode path.
    pub fn register<M>(&mut self)
    where
        M: Name + Default + Send + 'static,
    {
        self.decoders.insert(
            M::full_name(),
            Box::new(|bytes| {
                M::decode(bytes)
                    .map(|record| Box::new(record) as Box<dyn std::any::Any + Send>)
                    .map_err(|e| ClientError::DecodeError(e.to_string()))
            }),
        );
    }

    /// Whether a fully-qualified type name has been registered.
    pub fn contains(&self, full_name: &str) -> bool {
        self.decoders.contains_key(full_name)
    }

    /// Pack a record into a transport envelope.
    pub fn marshal<M: Name>(&self, record: &M) -> Result<Envelope> {
        let full_name = M::full_name();
        if !self.decoders.contains_key(&full_name) {
            return Err(ClientError::UnknownSchema(full_name));
        }
        Ok(Envelope {
            type_url: type_url_for(&full_name),
            value: record.encode_to_vec(),
        })
    }

    /// Unpack an envelope into a concrete record type.
    ///
    /// The expected type is compile-time knowledge, so this path does not
    /// consult the decoder table; it only verifies the type identifier and
    /// decodes the bytes.
    pub fn unmarshal<M: Name + Default>(&self, envelope: &Envelope) -> Result<M> {
        let expected = M::full_name();
        let actual = full_name_of(&envelope.type_url);
        if actual != expected {
            return Err(ClientError::TypeMismatch {
                expected,
                actual: actual.to_string(),
            });
        }
        M::decode(envelope.value.as_slice())
            .map_err(|e| ClientError::DecodeError(e.to_string()))
    }

    /// Decode an envelope through the registry, without knowing its concrete
    /// type statically. The result downcasts to the registered record type.
    pub fn decode_any(&self, envelope: &Envelope) -> Result<Box<dyn std::any::Any + Send>> {
        let name = full_name_of(&envelope.type_url);
        let decoder = self
            .decoders
            .get(name)
            .ok_or_else(|| ClientError::UnknownSchema(name.to_string()))?;
        decoder(&envelope.value)
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct TestRecord {
        #[prost(int64, tag = "1")]
        attribute1: i64,
        #[prost(int64, tag = "2")]
        attribute2: i64,
        #[prost(bool, tag = "3")]
        attribute3: bool,
    }

    impl Name for TestRecord {
        const NAME: &'static str = "TestRecord";
        const PACKAGE: &'static str = "strata.test";

        fn full_name() -> String {
            "strata.test.TestRecord".to_string()
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    struct OtherRecord {
        #[prost(string, tag = "1")]
        name: String,
    }

    impl Name for OtherRecord {
        const NAME: &'static str = "OtherRecord";
        const PACKAGE: &'static str = "strata.test";

        fn full_name() -> String {
            "strata.test.OtherRecord".to_string()
        }
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register::<TestRecord>();
        registry
    }

    #[test]
    fn marshal_round_trips_registered_type() {
        let registry = registry();
        let record = TestRecord {
            attribute1: 10,
            attribute2: 5,
            attribute3: true,
        };

        let envelope = registry.marshal(&record).unwrap();
        assert_eq!(envelope.type_url, "type.googleapis.com/strata.test.TestRecord");

        let decoded: TestRecord = registry.unmarshal(&envelope).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn marshal_unregistered_type_is_unknown_schema() {
        let registry = registry();
        let err = registry.marshal(&OtherRecord::default()).unwrap_err();
        assert!(matches!(err, ClientError::UnknownSchema(name) if name.contains("OtherRecord")));
    }

    #[test]
    fn unmarshal_wrong_type_is_type_mismatch() {
        let registry = registry();
        let envelope = registry.marshal(&TestRecord::default()).unwrap();

        let err = registry.unmarshal::<OtherRecord>(&envelope).unwrap_err();
        match err {
            ClientError::TypeMismatch { expected, actual } => {
                assert_eq!(expected, "strata.test.OtherRecord");
                assert_eq!(actual, "strata.test.TestRecord");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn unmarshal_malformed_bytes_is_decode_error() {
        let registry = registry();
        let envelope = Envelope {
            type_url: type_url_for("strata.test.TestRecord"),
            // field 1 wire-typed as length-delimited with a truncated body
            value: vec![0x0a, 0xff],
        };

        let err = registry.unmarshal::<TestRecord>(&envelope).unwrap_err();
        assert!(matches!(err, ClientError::DecodeError(_)));
    }

    #[test]
    fn decode_any_goes_through_the_registry() {
        let registry = registry();
        let record = TestRecord {
            attribute1: 7,
            ..Default::default()
        };
        let envelope = registry.marshal(&record).unwrap();

        let dynamic = registry.decode_any(&envelope).unwrap();
        let decoded = dynamic.downcast::<TestRecord>().unwrap();
        assert_eq!(*decoded, record);

        let foreign = Envelope {
            type_url: type_url_for("strata.test.OtherRecord"),
            value: Vec::new(),
        };
        assert!(matches!(
            registry.decode_any(&foreign),
            Err(ClientError::UnknownSchema(_))
        ));
    }
}
