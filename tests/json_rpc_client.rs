use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;
use sui_latency_bench::{
    rpc::{json_rpc::API_KEY_HEADER, FullnodeClient, JsonRpcClient, ReadMask},
    session::{FailurePolicy, Session, SessionConfig, TrialOutcome},
    tx::{Ed25519Signer, PayloadSource, SubmitPipeline, TransactionSigner},
};

const POOL_ID: &str = "0x6e35c9f02f1cebb018f8c2b9f157dea6cf5d03bcc63f1addf4c2609be8c29212";

fn object_body() -> String {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "data": {
                "objectId": POOL_ID,
                "version": "512",
                "digest": "9WdmqLmKq3QBu4oxHXWyS2E3qXwqS9V7S2iN4TMUhbGg",
                "content": {
                    "dataType": "moveObject",
                    "type": "0x1eab::pool::Pool",
                    "hasPublicTransfer": false,
                    "fields": {
                        "sqrt_price": "5464238785497366862",
                        "liquidity": "1000000",
                        "tick_spacing": 60
                    }
                }
            }
        }
    })
    .to_string()
}

/// Requests carry the API key as the x-api-key header when one is configured.
#[tokio::test]
async fn api_key_is_sent_as_header() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header(API_KEY_HEADER, "secret-key")
        .match_body(Matcher::PartialJson(json!({
            "jsonrpc": "2.0",
            "method": "suix_getReferenceGasPrice"
        })))
        .with_status(200)
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"750"}"#)
        .create_async()
        .await;

    let client = JsonRpcClient::new(
        &server.url(),
        Some("secret-key".to_string()),
        Duration::from_secs(5),
    )?;
    assert_eq!(client.get_reference_gas_price().await?, 750);
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn no_api_key_means_no_header() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header(API_KEY_HEADER, Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"1000"}"#)
        .create_async()
        .await;

    let client = JsonRpcClient::new(&server.url(), None, Duration::from_secs(5))?;
    assert_eq!(client.get_reference_gas_price().await?, 1000);
    mock.assert_async().await;
    Ok(())
}

/// A full read session against a mocked node: every trial extracts the
/// field and the request asks only for content.
#[tokio::test]
async fn read_session_against_json_rpc() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "sui_getObject",
            "params": [POOL_ID, {"showType": false, "showOwner": false, "showContent": true}]
        })))
        .with_status(200)
        .with_body(object_body())
        .expect(4)
        .create_async()
        .await;

    let client = JsonRpcClient::new(&server.url(), None, Duration::from_secs(5))?;
    let mask = ReadMask::new(["json.sqrt_price"]);
    let config = SessionConfig {
        rounds: 4,
        failure_policy: FailurePolicy::Abort,
        ..SessionConfig::default()
    };

    let report = Session::new("read", config)
        .run(
            || client.get_object(POOL_ID, &mask),
            |state| state.field("sqrt_price"),
            |_| Ok(()),
        )
        .await?;

    mock.assert_async().await;
    assert_eq!(report.summary().map(|s| s.count), Some(4));
    assert!(report.trials.iter().all(|t| t.outcome
        == TrialOutcome::Success {
            extracted: Some("5464238785497366862".to_string())
        }));
    Ok(())
}

#[tokio::test]
async fn object_mask_drops_unselected_fields() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(object_body())
        .create_async()
        .await;

    let client = JsonRpcClient::new(&server.url(), None, Duration::from_secs(5))?;

    let state = client
        .get_object(POOL_ID, &ReadMask::new(["version", "json.liquidity"]))
        .await?;
    assert_eq!(state.version, Some(512));
    assert!(state.object_id.is_none());
    assert_eq!(state.field("liquidity").as_deref(), Some("1000000"));
    assert!(state.field("sqrt_price").is_none());

    let state = client.get_object(POOL_ID, &ReadMask::all()).await?;
    assert_eq!(state.object_id.as_deref(), Some(POOL_ID));
    assert_eq!(state.field("tick_spacing").as_deref(), Some("60"));
    Ok(())
}

/// The bytes returned by the builder endpoint are the bytes executed.
#[tokio::test]
async fn transfer_pipeline_against_json_rpc() -> Result<()> {
    let signer = Ed25519Signer::from_bytes([5u8; 32]);
    let sender = signer.address();
    let tx_bytes = BASE64.encode([1u8, 2, 3, 4, 5, 6]);

    let mut server = mockito::Server::new_async().await;
    let gas_price = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "suix_getReferenceGasPrice"})))
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"750"}"#)
        .create_async()
        .await;
    let coins = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "suix_getCoins",
            "params": [sender, "0x2::sui::SUI", null, 50]
        })))
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {
                    "data": [
                        {"coinType": "0x2::sui::SUI", "coinObjectId": "0xc0", "version": "3", "digest": "D0", "balance": "10"},
                        {"coinType": "0x2::sui::SUI", "coinObjectId": "0xc1", "version": "4", "digest": "D1", "balance": "900000000"}
                    ],
                    "nextCursor": null,
                    "hasNextPage": false
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let build = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "unsafe_transferSui",
            "params": [sender, "0xc1", "10000000", "0xb0b", "25"]
        })))
        .with_body(json!({"jsonrpc": "2.0", "id": 3, "result": {"txBytes": tx_bytes}}).to_string())
        .create_async()
        .await;
    let execute = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"method": "sui_executeTransactionBlock"})),
            // "AQIDBAUG" has no regex metacharacters
            Matcher::Regex(format!("\"{tx_bytes}\"")),
        ]))
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "result": {
                    "digest": "5vYhQz3t1",
                    "effects": {"status": {"status": "success"}}
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = JsonRpcClient::new(&server.url(), None, Duration::from_secs(5))?;
    let source = PayloadSource::TransferSui {
        recipient: "0xb0b".to_string(),
        amount: Some(25),
    };

    let outcome = SubmitPipeline::new(&client, &signer, 10_000_000)
        .run(&source)
        .await?;

    gas_price.assert_async().await;
    coins.assert_async().await;
    build.assert_async().await;
    execute.assert_async().await;

    assert_eq!(outcome.receipt.digest, "5vYhQz3t1");
    assert!(outcome.receipt.succeeded());
    assert_eq!(outcome.gas_coin.as_deref(), Some("0xc1"));
    assert_eq!(outcome.payload_len, 6);
    Ok(())
}
