//! Wire messages and gRPC client stub for the StrataDB service.
//!
//! The source of truth is `proto/strata.proto`. The code below matches the
//! `tonic-build` output for that file and is checked in so downstream crates
//! build without a protoc toolchain; keep it in sync when the proto changes.

/// One frame of a mutation request stream. Insert, Update, and Remove are
/// identical in use; payloads are schema-typed records packed as Any.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MutationBatch {
    #[prost(string, tag = "1")]
    pub api_key: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub messages: ::prost::alloc::vec::Vec<::prost_types::Any>,
}
/// Mutation streams carry no payload. Completion is signaled by end of
/// stream; any error arrives as the RPC status.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MutationAck {}
/// A flat predicate: comparisons\[i\] pairs with operands\[i\]. An empty fields
/// list makes the query index-eligible (operands must cover the full declared
/// index key); a non-empty fields list restricts evaluation to the named
/// field ids via full scan.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Basic {
    #[prost(enumeration = "LogicalOperator", tag = "1")]
    pub logical_operator: i32,
    #[prost(enumeration = "ComparisonOperator", repeated, tag = "2")]
    pub comparisons: ::prost::alloc::vec::Vec<i32>,
    #[prost(message, repeated, tag = "3")]
    pub operands: ::prost::alloc::vec::Vec<::prost_types::Any>,
    #[prost(uint32, repeated, tag = "4")]
    pub fields: ::prost::alloc::vec::Vec<u32>,
}
/// Nested combination of expressions.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Composite {
    #[prost(enumeration = "LogicalOperator", tag = "1")]
    pub logical_operator: i32,
    #[prost(message, repeated, tag = "2")]
    pub children: ::prost::alloc::vec::Vec<Expression>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Expression {
    #[prost(oneof = "expression::Kind", tags = "1, 2")]
    pub kind: ::core::option::Option<expression::Kind>,
}
/// Nested message and enum types in `Expression`.
pub mod expression {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        Basic(super::Basic),
        #[prost(message, tag = "2")]
        Composite(super::Composite),
    }
}
/// One frame of a search request stream. Queries are assigned zero-based
/// indices in submission order across the whole stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchBatch {
    #[prost(string, tag = "1")]
    pub api_key: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub queries: ::prost::alloc::vec::Vec<Expression>,
}
/// Partial results for one query index, in service emission order.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResult {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(message, repeated, tag = "2")]
    pub messages: ::prost::alloc::vec::Vec<::prost_types::Any>,
}
/// `finished` lists the query indices that will receive no further results.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: ::prost::alloc::vec::Vec<QueryResult>,
    #[prost(uint32, repeated, tag = "2")]
    pub finished: ::prost::alloc::vec::Vec<u32>,
}
/// The complete desired schema set. Schemas omitted from the list are
/// dropped along with their data; a rejected set changes nothing.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeRequest {
    #[prost(string, tag = "1")]
    pub api_key: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub schemas: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeAck {}
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    ::prost::Enumeration
)]
#[repr(i32)]
pub enum LogicalOperator {
    And = 0,
    Or = 1,
}
impl LogicalOperator {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    ::prost::Enumeration
)]
#[repr(i32)]
pub enum ComparisonOperator {
    Equal = 0,
    Greater = 1,
    GreaterEqual = 2,
    Lesser = 3,
    LesserEqual = 4,
    NotEqual = 5,
}
impl ComparisonOperator {
    /// String value of the enum field names used in the ProtoBuf definition.
    ///
    /// The values are not transformed in any way and thus are considered stable
    /// (if the ProtoBuf definition does not change) and safe for programmatic use.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "EQUAL",
            ComparisonOperator::Greater => "GREATER",
            ComparisonOperator::GreaterEqual => "GREATER_EQUAL",
            ComparisonOperator::Lesser => "LESSER",
            ComparisonOperator::LesserEqual => "LESSER_EQUAL",
            ComparisonOperator::NotEqual => "NOT_EQUAL",
        }
    }
    /// Creates an enum from field names used in the ProtoBuf definition.
    pub fn from_str_name(value: &str) -> ::core::option::Option<Self> {
        match value {
            "EQUAL" => Some(Self::Equal),
            "GREATER" => Some(Self::Greater),
            "GREATER_EQUAL" => Some(Self::GreaterEqual),
            "LESSER" => Some(Self::Lesser),
            "LESSER_EQUAL" => Some(Self::LesserEqual),
            "NOT_EQUAL" => Some(Self::NotEqual),
            _ => None,
        }
    }
}
/// Generated client implementations.
pub mod strata_db_client {
    #![allow(unused_variables, dead_code, missing_docs, clippy::let_unit_value)]
    use tonic::codegen::*;
    use tonic::codegen::http::Uri;
    #[derive(Debug, Clone)]
    pub struct StrataDbClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl StrataDbClient<tonic::transport::Channel> {
        /// Attempt to create a new client by connecting to a given endpoint.
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> StrataDbClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_origin(inner: T, origin: Uri) -> Self {
            let inner = tonic::client::Grpc::with_origin(inner, origin);
            Self { inner }
        }
        pub fn with_interceptor<F>(
            inner: T,
            interceptor: F,
        ) -> StrataDbClient<InterceptedService<T, F>>
        where
            F: tonic::service::Interceptor,
            T::ResponseBody: Default,
            T: tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
                Response = http::Response<
                    <T as tonic::client::GrpcService<tonic::body::BoxBody>>::ResponseBody,
                >,
            >,
            <T as tonic::codegen::Service<
                http::Request<tonic::body::BoxBody>,
            >>::Error: Into<StdError> + Send + Sync,
        {
            StrataDbClient::new(InterceptedService::new(inner, interceptor))
        }
        /// Compress requests with the given encoding.
        ///
        /// This requires the server to support it otherwise it might respond with an
        /// error.
        #[must_use]
        pub fn send_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.send_compressed(encoding);
            self
        }
        /// Enable decompressing responses.
        #[must_use]
        pub fn accept_compressed(mut self, encoding: CompressionEncoding) -> Self {
            self.inner = self.inner.accept_compressed(encoding);
            self
        }
        /// Limits the maximum size of a decoded message.
        ///
        /// Default: `4MB`
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }
        /// Limits the maximum size of an encoded message.
        ///
        /// Default: `usize::MAX`
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }
        pub async fn insert(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::MutationBatch>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::MutationAck>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/strata.StrataDb/Insert");
            let mut req = request.into_streaming_request();
            req.extensions_mut().insert(GrpcMethod::new("strata.StrataDb", "Insert"));
            self.inner.streaming(req, path, codec).await
        }
        pub async fn update(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::MutationBatch>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::MutationAck>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/strata.StrataDb/Update");
            let mut req = request.into_streaming_request();
            req.extensions_mut().insert(GrpcMethod::new("strata.StrataDb", "Update"));
            self.inner.streaming(req, path, codec).await
        }
        pub async fn remove(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::MutationBatch>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::MutationAck>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/strata.StrataDb/Remove");
            let mut req = request.into_streaming_request();
            req.extensions_mut().insert(GrpcMethod::new("strata.StrataDb", "Remove"));
            self.inner.streaming(req, path, codec).await
        }
        pub async fn search(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::SearchBatch>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::SearchResponse>>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/strata.StrataDb/Search");
            let mut req = request.into_streaming_request();
            req.extensions_mut().insert(GrpcMethod::new("strata.StrataDb", "Search"));
            self.inner.streaming(req, path, codec).await
        }
        pub async fn subscribe(
            &mut self,
            request: impl tonic::IntoRequest<super::SubscribeRequest>,
        ) -> std::result::Result<
            tonic::Response<super::SubscribeAck>,
            tonic::Status,
        > {
            self.inner
                .ready()
                .await
                .map_err(|e| {
                    tonic::Status::new(
                        tonic::Code::Unknown,
                        format!("Service was not ready: {}", e.into()),
                    )
                })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static(
                "/strata.StrataDb/Subscribe",
            );
            let mut req = request.into_request();
            req.extensions_mut().insert(GrpcMethod::new("strata.StrataDb", "Subscribe"));
            self.inner.unary(req, path, codec).await
        }
    }
}
