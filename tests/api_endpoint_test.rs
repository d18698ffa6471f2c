use axum::http::StatusCode;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use vaultledger::api;
use vaultledger::domain::amount::pow10;
use vaultledger::domain::Address;
use vaultledger::engine::SnapshotScheduler;
use vaultledger::oracle::{MockContract, MockOracle};
use vaultledger::{init_db, LedgerContext, Repository};

const VAULT: &str = "0x1111111111111111111111111111111111111111";
const USER: &str = "0x2222222222222222222222222222222222222222";
const DEPOSIT_TX: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";
const WITHDRAW_TX: &str = "0x0202020202020202020202020202020202020202020202020202020202020202";

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let vault = VAULT.parse::<Address>().unwrap();
    let one = pow10(18).unwrap();
    let oracle = Arc::new(MockOracle::new().with_contract(
        vault,
        MockContract::token("Test Vault", "yvTEST", 18).with_price_per_share(one),
    ));

    let ledger = LedgerContext::new(repo, oracle, SnapshotScheduler::default());
    let app = api::create_router(api::AppState::new(ledger));

    TestApp {
        app,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn deposit_json(block: u64, tx: &str) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "address": VAULT,
            "txHash": tx,
            "logIndex": 0,
            "blockNumber": block,
            "blockTimestamp": 1_700_000_000u64 + block * 12
        },
        "payload": {
            "type": "deposit",
            "sender": USER,
            "owner": USER,
            "assets": "1000000000000000000000",
            "shares": "1000000000000000000000"
        }
    })
}

fn withdraw_json(block: u64, tx: &str, shares: &str) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "address": VAULT,
            "txHash": tx,
            "logIndex": 0,
            "blockNumber": block,
            "blockTimestamp": 1_700_000_000u64 + block * 12
        },
        "payload": {
            "type": "withdraw",
            "sender": USER,
            "receiver": USER,
            "owner": USER,
            "assets": shares,
            "shares": shares
        }
    })
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = setup_test_app().await;

    let (status, body) = request(t.app.clone(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = request(t.app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_post_events_then_read_back() {
    let t = setup_test_app().await;

    let batch = serde_json::json!([
        withdraw_json(11, WITHDRAW_TX, "500000000000000000000"),
        deposit_json(10, DEPOSIT_TX),
    ]);
    let (status, body) = request(
        t.app.clone(),
        "POST",
        "/v1/events",
        Some(batch.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 2);
    assert_eq!(body["faults"], 0);
    assert_eq!(body["outcomes"][0]["type"], "deposit");
    assert_eq!(body["outcomes"][0]["status"], "applied");
    assert_eq!(body["outcomes"][1]["type"], "withdraw");

    let (status, body) = request(t.app.clone(), "GET", &format!("/v1/vaults/{}", VAULT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Test Vault");
    assert_eq!(body["totalDeposited"], "1000000000000000000000");
    assert_eq!(body["totalSupply"], "500000000000000000000");
    assert_eq!(body["pricePerShare"], "1000000000000000000");
    assert!(body.get("defaultStrategy").is_none());

    let (status, body) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/positions?user={}", USER),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let positions = body.as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["vault"], VAULT);
    assert_eq!(positions[0]["currentShares"], "500000000000000000000");
    assert_eq!(positions[0]["realizedPnl"], "0");

    let (status, body) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/transactions/{}", DEPOSIT_TX),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "VaultDeposit");
    assert_eq!(body["owner"], USER);
    assert_eq!(body["blockNumber"], 10);

    let (status, body) = request(t.app, "GET", "/v1/protocol", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vaults"], serde_json::json!([VAULT]));
}

#[tokio::test]
async fn test_fault_is_reported_in_outcomes() {
    let t = setup_test_app().await;

    let batch = serde_json::json!([withdraw_json(5, WITHDRAW_TX, "1")]);
    let (status, body) = request(t.app, "POST", "/v1/events", Some(batch.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["faults"], 1);
    assert_eq!(body["outcomes"][0]["status"], "fault");
    assert!(body["outcomes"][0]["fault"]
        .as_str()
        .unwrap()
        .contains("no position"));
}

#[tokio::test]
async fn test_snapshots_endpoint() {
    let t = setup_test_app().await;

    let tick = serde_json::json!([{
        "meta": {
            "address": VAULT,
            "txHash": DEPOSIT_TX,
            "logIndex": 0,
            "blockNumber": 1,
            "blockTimestamp": 1_700_000_000u64
        },
        "payload": {"type": "block"}
    }]);
    let (status, _) = request(t.app.clone(), "POST", "/v1/events", Some(tick.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/vaults/{}/snapshots", VAULT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = request(
        t.app.clone(),
        "GET",
        &format!("/v1/vaults/{}/snapshots?kind=daily", VAULT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshots = body.as_array().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0]["kind"], "daily");
    assert_eq!(snapshots[0]["timestamp"], 1_700_000_000u64);

    let (status, _) = request(
        t.app,
        "GET",
        &format!("/v1/vaults/{}/snapshots?kind=monthly", VAULT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_errors() {
    let t = setup_test_app().await;

    let (status, body) = request(t.app.clone(), "GET", &format!("/v1/vaults/{}", VAULT), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = request(t.app.clone(), "GET", "/v1/vaults/0x123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(t.app.clone(), "GET", "/v1/positions", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(t.app.clone(), "GET", "/v1/transactions/nothex", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(t.app, "GET", &format!("/v1/transactions/{}", DEPOSIT_TX), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
