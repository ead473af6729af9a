//! gRPC fullnode client for the `sui.rpc.v2.LedgerService` API.
//!
//! Only object reads go over gRPC. Gas, balance and transaction calls are
//! JSON-RPC only and fail with `BenchError::Unsupported` here.

use super::{
    Balance, CoinRef, ExecutionReceipt, FullnodeClient, MoveCallRequest, ObjectState, ReadMask,
    TransferSuiRequest,
};
use crate::error::{BenchError, Result};
use crate::rpc::json_rpc::API_KEY_HEADER;
use crate::tx::{TransactionPayload, UserSignature};
use async_trait::async_trait;
use prost_types::{value::Kind, FieldMask};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, trace};

const GET_OBJECT_PATH: &str = "/sui.rpc.v2.LedgerService/GetObject";

/// Message definitions mirroring `sui/rpc/v2/ledger_service.proto` and
/// `sui/rpc/v2/object.proto`, restricted to the fields read here.
pub mod proto {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct GetObjectRequest {
        #[prost(string, optional, tag = "1")]
        pub object_id: Option<String>,
        #[prost(uint64, optional, tag = "2")]
        pub version: Option<u64>,
        #[prost(message, optional, tag = "3")]
        pub read_mask: Option<prost_types::FieldMask>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct GetObjectResponse {
        #[prost(message, optional, tag = "1")]
        pub object: Option<Object>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Object {
        #[prost(string, optional, tag = "2")]
        pub object_id: Option<String>,
        #[prost(uint64, optional, tag = "3")]
        pub version: Option<u64>,
        #[prost(string, optional, tag = "4")]
        pub digest: Option<String>,
        #[prost(message, optional, tag = "5")]
        pub owner: Option<Owner>,
        #[prost(string, optional, tag = "6")]
        pub object_type: Option<String>,
        #[prost(message, optional, tag = "100")]
        pub json: Option<prost_types::Value>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Owner {
        /// `Owner.OwnerKind`
        #[prost(int32, optional, tag = "1")]
        pub kind: Option<i32>,
        #[prost(string, optional, tag = "2")]
        pub address: Option<String>,
        #[prost(uint64, optional, tag = "3")]
        pub version: Option<u64>,
    }
}

/// Fullnode client speaking the Sui gRPC API
pub struct GrpcClient {
    inner: tonic::client::Grpc<Channel>,
    url: String,
    api_key: Option<MetadataValue<Ascii>>,
}

impl GrpcClient {
    /// Build a client for `url`. The channel connects on first use and is
    /// shared by every call; `https` endpoints use the system trust roots.
    pub fn new(url: &str, api_key: Option<String>, connect_timeout: Duration) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|e| BenchError::InvalidInput(format!("invalid gRPC endpoint {url}: {e}")))?
            .connect_timeout(connect_timeout);

        if url.starts_with("https://") {
            endpoint = endpoint
                .tls_config(ClientTlsConfig::new().with_native_roots())
                .map_err(|e| BenchError::Transport(format!("failed to configure TLS: {e}")))?;
        }

        let api_key = match api_key.filter(|k| !k.is_empty()) {
            Some(key) => Some(MetadataValue::try_from(key.as_str()).map_err(|_| {
                BenchError::InvalidInput("API key is not valid ASCII metadata".to_string())
            })?),
            None => None,
        };

        Ok(Self {
            inner: tonic::client::Grpc::new(endpoint.connect_lazy()),
            url: url.to_string(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn unary_get_object(
        &self,
        request: proto::GetObjectRequest,
    ) -> std::result::Result<proto::GetObjectResponse, Status> {
        let mut request = tonic::Request::new(request);
        if let Some(ref key) = self.api_key {
            request.metadata_mut().insert(API_KEY_HEADER, key.clone());
        }

        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("channel not ready: {e}")))?;

        let codec = tonic_prost::ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(GET_OBJECT_PATH), codec)
            .await?;
        Ok(response.into_inner())
    }

    fn unsupported<T>(operation: &str) -> Result<T> {
        Err(BenchError::Unsupported(format!(
            "{operation} is only available with --transport json-rpc"
        )))
    }
}

impl fmt::Debug for GrpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcClient")
            .field("url", &self.url)
            .field("api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Translate a read mask into `sui.rpc.v2` field paths.
///
/// Content fields are projected locally, so any `json.<field>` becomes
/// `json`. An empty mask asks for every supported path.
pub fn grpc_read_mask(mask: &ReadMask) -> FieldMask {
    const ALL: [&str; 6] = ["object_id", "version", "digest", "object_type", "owner", "json"];

    let mut paths: Vec<String> = Vec::new();
    let requested: Vec<&str> = if mask.paths.is_empty() {
        ALL.to_vec()
    } else {
        mask.paths.iter().map(String::as_str).collect()
    };

    for path in requested {
        let translated = match path {
            "type" => "object_type",
            p if p.starts_with("json.") => "json",
            p => p,
        };
        if !paths.iter().any(|p| p == translated) {
            paths.push(translated.to_string());
        }
    }
    FieldMask { paths }
}

/// Map a gRPC status onto the error taxonomy
pub fn map_status(status: Status, object_id: &str) -> BenchError {
    match status.code() {
        Code::NotFound => BenchError::NotFound {
            object_id: object_id.to_string(),
        },
        Code::Unavailable | Code::Unknown | Code::Cancelled | Code::DeadlineExceeded => {
            BenchError::Transport(format!("{}: {}", status.code(), status.message()))
        }
        code => BenchError::Rpc {
            code: code as i64,
            message: status.message().to_string(),
        },
    }
}

/// Convert a protobuf `Value` into JSON. Integral numbers stay integers.
pub fn proto_value_to_json(value: &prost_types::Value) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::StringValue(ref s)) => Value::String(s.clone()),
        Some(Kind::NumberValue(n)) => {
            if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                json!(n as i64)
            } else {
                serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
            }
        }
        Some(Kind::ListValue(ref list)) => {
            Value::Array(list.values.iter().map(proto_value_to_json).collect())
        }
        Some(Kind::StructValue(ref s)) => Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_value_to_json(v)))
                .collect(),
        ),
    }
}

fn owner_to_json(owner: &proto::Owner) -> Value {
    let kind = match owner.kind {
        Some(1) => "Address",
        Some(2) => "Object",
        Some(3) => "Shared",
        Some(4) => "Immutable",
        Some(5) => "ConsensusAddress",
        _ => "Unknown",
    };

    let mut map = Map::new();
    map.insert("kind".to_string(), json!(kind));
    if let Some(ref address) = owner.address {
        map.insert("address".to_string(), json!(address));
    }
    if let Some(version) = owner.version {
        map.insert("version".to_string(), json!(version));
    }
    Value::Object(map)
}

/// Object state from a `GetObject` response, restricted to `mask`
pub fn object_state(object: proto::Object, mask: &ReadMask) -> ObjectState {
    ObjectState {
        object_id: object.object_id,
        version: object.version,
        digest: object.digest,
        object_type: object.object_type,
        owner: object.owner.as_ref().map(owner_to_json),
        json: object.json.as_ref().map(proto_value_to_json),
    }
    .apply_mask(mask)
}

#[async_trait]
impl FullnodeClient for GrpcClient {
    async fn get_object(&self, object_id: &str, mask: &ReadMask) -> Result<ObjectState> {
        let request = proto::GetObjectRequest {
            object_id: Some(object_id.to_string()),
            version: None,
            read_mask: Some(grpc_read_mask(mask)),
        };
        trace!("GetObject {} paths={:?}", object_id, request.read_mask);

        let response = self
            .unary_get_object(request)
            .await
            .map_err(|status| map_status(status, object_id))?;

        let object = response.object.ok_or_else(|| {
            BenchError::MalformedResponse("GetObject response has no object".to_string())
        })?;
        debug!("GetObject {} version {:?}", object_id, object.version);
        Ok(object_state(object, mask))
    }

    async fn get_reference_gas_price(&self) -> Result<u64> {
        Self::unsupported("get_reference_gas_price")
    }

    async fn get_gas_coins(&self, _owner: &str) -> Result<Vec<CoinRef>> {
        Self::unsupported("get_gas_coins")
    }

    async fn get_all_balances(&self, _owner: &str) -> Result<Vec<Balance>> {
        Self::unsupported("get_all_balances")
    }

    async fn build_move_call(&self, _request: &MoveCallRequest) -> Result<TransactionPayload> {
        Self::unsupported("build_move_call")
    }

    async fn build_transfer_sui(
        &self,
        _request: &TransferSuiRequest,
    ) -> Result<TransactionPayload> {
        Self::unsupported("build_transfer_sui")
    }

    async fn execute_transaction(
        &self,
        _payload: &TransactionPayload,
        _signatures: &[UserSignature],
    ) -> Result<ExecutionReceipt> {
        Self::unsupported("execute_transaction")
    }

    fn name(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use prost_types::{ListValue, Struct};
    use std::collections::BTreeMap;

    fn string(s: &str) -> prost_types::Value {
        prost_types::Value {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    fn number(n: f64) -> prost_types::Value {
        prost_types::Value {
            kind: Some(Kind::NumberValue(n)),
        }
    }

    fn pool_object() -> proto::Object {
        let mut fields = BTreeMap::new();
        fields.insert("sqrt_price".to_string(), string("5464238785497366862"));
        fields.insert("tick_spacing".to_string(), number(60.0));
        proto::Object {
            object_id: Some("0x6e35".to_string()),
            version: Some(512),
            digest: Some("9Wdm".to_string()),
            owner: Some(proto::Owner {
                kind: Some(3),
                address: None,
                version: Some(1),
            }),
            object_type: Some("0x1eab::pool::Pool".to_string()),
            json: Some(prost_types::Value {
                kind: Some(Kind::StructValue(Struct { fields })),
            }),
        }
    }

    #[test]
    fn test_read_mask_translation() {
        let mask = grpc_read_mask(&ReadMask::new(["json.sqrt_price", "type", "json.liquidity"]));
        assert_eq!(mask.paths, vec!["json", "object_type"]);

        let all = grpc_read_mask(&ReadMask::all());
        assert_eq!(all.paths.len(), 6);
        assert!(all.paths.contains(&"owner".to_string()));
    }

    #[test]
    fn test_request_wire_tags() {
        let request = proto::GetObjectRequest {
            object_id: Some("0x6".to_string()),
            version: None,
            read_mask: Some(FieldMask {
                paths: vec!["json".to_string()],
            }),
        };
        let bytes = request.encode_to_vec();

        // field 1, length-delimited: "0x6"
        assert_eq!(&bytes[..5], &[0x0a, 3, b'0', b'x', b'6']);
        // field 3, length-delimited: FieldMask { paths: ["json"] }
        assert_eq!(&bytes[5..], &[0x1a, 6, 0x0a, 4, b'j', b's', b'o', b'n']);
    }

    #[test]
    fn test_proto_values_convert_to_json() {
        let list = prost_types::Value {
            kind: Some(Kind::ListValue(ListValue {
                values: vec![number(1.0), number(2.5), string("x")],
            })),
        };
        assert_eq!(proto_value_to_json(&list), json!([1, 2.5, "x"]));
        assert_eq!(proto_value_to_json(&prost_types::Value { kind: None }), Value::Null);
    }

    #[test]
    fn test_object_state_applies_mask() {
        let state = object_state(pool_object(), &ReadMask::new(["json.sqrt_price"]));
        assert!(state.object_id.is_none());
        assert_eq!(state.field("sqrt_price").as_deref(), Some("5464238785497366862"));
        assert!(state.field("tick_spacing").is_none());

        let state = object_state(pool_object(), &ReadMask::all());
        assert_eq!(state.version, Some(512));
        assert_eq!(state.field("tick_spacing").as_deref(), Some("60"));
        assert_eq!(state.owner, Some(json!({"kind": "Shared", "version": 1})));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(Status::not_found("gone"), "0x6"),
            BenchError::NotFound { ref object_id } if object_id == "0x6"
        ));
        assert!(matches!(
            map_status(Status::unavailable("down"), "0x6"),
            BenchError::Transport(_)
        ));
        match map_status(Status::unauthenticated("bad key"), "0x6") {
            BenchError::Rpc { code, message } => {
                assert_eq!(code, Code::Unauthenticated as i64);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = GrpcClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BenchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_non_ascii_api_key_is_rejected() {
        let err = GrpcClient::new(
            "http://127.0.0.1:9000",
            Some("ключ".to_string()),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_transaction_calls_are_unsupported() {
        let client =
            GrpcClient::new("http://127.0.0.1:9000", None, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.get_reference_gas_price().await,
            Err(BenchError::Unsupported(_))
        ));
        assert!(matches!(
            client.get_all_balances("0x1").await,
            Err(BenchError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_a_remote_error() {
        let client = GrpcClient::new("http://127.0.0.1:1", None, Duration::from_secs(1)).unwrap();
        let err = client.get_object("0x6", &ReadMask::all()).await.unwrap_err();
        assert!(err.is_remote(), "unexpected error: {err:?}");
    }
}
