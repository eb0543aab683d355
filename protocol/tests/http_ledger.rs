//! HTTP integration tests: the reqwest clients against an axum mock of the
//! ledger node's JSON-RPC endpoint and the listing-cache REST API, served on
//! an ephemeral local port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use hourglass_protocol::address::{Address, Network};
use hourglass_protocol::cache::{HttpListingCache, ListingCache, Profile, TokenQuery};
use hourglass_protocol::config::{ClientConfig, TESTNET_PASSPHRASE};
use hourglass_protocol::ledger::{
    HttpLedger, RpcError, RpcMethod, RpcRequest, RpcResponse, SimulationResult,
};
use hourglass_protocol::market::{Marketplace, TokenBrowse};
use hourglass_protocol::session::Session;
use hourglass_protocol::transaction::{ResourceEstimate, SignedEnvelope, TransportEnvelope};
use hourglass_protocol::value::ScValue;
use hourglass_protocol::wallet::LocalWallet;
use hourglass_protocol::workflow::FinalityPoller;
use hourglass_protocol::ClientError;

// ---------------------------------------------------------------------------
// Mock node
// ---------------------------------------------------------------------------

struct MockNode {
    known_account: String,
    status_checks: AtomicUsize,
    sent: Mutex<Vec<String>>,
    profiles: Mutex<HashMap<String, Profile>>,
}

impl MockNode {
    fn new(known_account: &Address) -> Arc<Self> {
        Arc::new(Self {
            known_account: known_account.to_string(),
            status_checks: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            profiles: Mutex::new(HashMap::new()),
        })
    }
}

fn token_record(id: u64) -> ScValue {
    ScValue::record([
        ("id", ScValue::U64(id)),
        ("seller", ScValue::Address(Address::Account([3u8; 32]))),
        ("hourly_rate", ScValue::i128(12_500_000)),
        ("hours_available", ScValue::U32(6)),
        ("description", ScValue::from("Piano lesson")),
    ])
}

fn simulate(transport: &str) -> SimulationResult {
    let envelope = match TransportEnvelope::decode(transport) {
        Ok(t) => t.envelope,
        Err(e) => return SimulationResult::failed(e.to_string()),
    };
    let args = envelope.operation.args();
    let value = match envelope.operation.method() {
        "get_token_count" => Some(ScValue::U64(2)),
        "get_token" => match args.first() {
            Some(ScValue::U64(id)) => Some(token_record(*id)),
            _ => return SimulationResult::failed("bad token id"),
        },
        "purchase_token" => None,
        other => return SimulationResult::failed(format!("HostError: no method {other}")),
    };
    SimulationResult {
        resources: ResourceEstimate {
            min_resource_fee: 4_200,
            ..ResourceEstimate::default()
        },
        ..SimulationResult::returning(value)
    }
}

async fn rpc(State(node): State<Arc<MockNode>>, Json(req): Json<RpcRequest>) -> Json<RpcResponse> {
    let id = req.id.clone();
    let param = |name: &str| req.params[name].as_str().unwrap_or_default().to_string();

    let result = match req.method {
        RpcMethod::GetAccount => {
            let address = param("address");
            if address != node.known_account {
                return Json(RpcResponse::error(id, RpcError::account_not_found(&address)));
            }
            json!({ "address": address, "sequence": 10 })
        }
        RpcMethod::SimulateTransaction => {
            serde_json::to_value(simulate(&param("transaction"))).unwrap_or(Value::Null)
        }
        RpcMethod::SendTransaction => {
            node.sent.lock().push(param("transaction"));
            json!({ "hash": "feedbeef", "status": "PENDING" })
        }
        RpcMethod::GetTransaction => match node.status_checks.fetch_add(1, Ordering::SeqCst) {
            0 => {
                return Json(RpcResponse::error(
                    id,
                    RpcError::internal_error("XDR decode: Bad union switch: 4"),
                ))
            }
            1 => json!({ "status": "NOT_FOUND" }),
            _ => json!({ "status": "SUCCESS", "return_value": null, "ledger": 77 }),
        },
    };
    Json(RpcResponse::success(id, result))
}

async fn tokens(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "data": [{
            "token_id": 1,
            "seller_address": "acct1qqqqqqqqqqqqqqqqqqqqqqqqq",
            "title": "Piano lesson",
            "hourly_rate": 12500000,
            "hours_available": 6,
            "category": query.get("category"),
            "tags": ["music"],
            "view_count": 3
        }]
    }))
}

async fn get_profile(
    State(node): State<Arc<MockNode>>,
    Path(address): Path<String>,
) -> Result<Json<Profile>, StatusCode> {
    node.profiles
        .lock()
        .get(&address)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_profile(
    State(node): State<Arc<MockNode>>,
    Path(address): Path<String>,
    Json(profile): Json<Profile>,
) -> Json<Profile> {
    node.profiles.lock().insert(address, profile.clone());
    Json(profile)
}

/// Serves the mock on 127.0.0.1 and returns its base URL.
async fn serve(node: Arc<MockNode>) -> String {
    let app = Router::new()
        .route("/rpc", post(rpc))
        .route("/api/tokens", get(tokens))
        .route("/api/profiles/:address", get(get_profile).put(put_profile))
        .with_state(node);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn testnet() -> Network {
    Network::new(TESTNET_PASSPHRASE)
}

fn market() -> Marketplace {
    Marketplace::new(&ClientConfig::testnet(Address::Contract([1u8; 32])))
        .with_poller(FinalityPoller::new(Duration::from_millis(20), 10))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn purchase_round_trips_over_http() {
    let wallet = Arc::new(LocalWallet::from_seed(&[21u8; 32], testnet()));
    let node = MockNode::new(&wallet.address());
    let base = serve(node.clone()).await;

    let ledger = Arc::new(HttpLedger::new(format!("{base}/rpc")).unwrap());
    let session = Session::new(ledger, Some(wallet.clone()));
    session.connect().await.unwrap();

    let confirmation = market().purchase(&session, 1, 2).await.unwrap();
    assert_eq!(confirmation.ledger, 77);
    assert_eq!(confirmation.hash, "feedbeef");
    // Still-processing error, NOT_FOUND, then SUCCESS.
    assert_eq!(confirmation.attempts, 3);

    let sent = node.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    let signed = SignedEnvelope::from_transport(&sent[0], &testnet()).unwrap();
    assert_eq!(signed.envelope().source, wallet.address());
    assert_eq!(signed.envelope().sequence, 11);
    assert_eq!(signed.envelope().fee, 100 + 4_200);
}

#[tokio::test]
async fn unknown_account_is_reported_as_unresolvable() {
    let node = MockNode::new(&Address::Account([0u8; 32]));
    let base = serve(node).await;

    let wallet = Arc::new(LocalWallet::from_seed(&[22u8; 32], testnet()));
    let ledger = Arc::new(HttpLedger::new(format!("{base}/rpc")).unwrap());
    let session = Session::new(ledger, Some(wallet));
    session.connect().await.unwrap();

    let err = market().purchase(&session, 1, 1).await.unwrap_err();
    assert!(matches!(err, ClientError::AccountUnresolvable { .. }), "{err:?}");
}

#[tokio::test]
async fn reads_work_without_a_wallet() {
    let node = MockNode::new(&Address::Account([0u8; 32]));
    let base = serve(node).await;
    let session = Session::new(Arc::new(HttpLedger::new(format!("{base}/rpc")).unwrap()), None);

    let tokens = market().all_tokens(&session).await.unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens.skipped, 0);
    assert_eq!(tokens.items[0].hourly_rate, 12_500_000);
}

#[tokio::test]
async fn listing_cache_client_speaks_the_rest_api() {
    let node = MockNode::new(&Address::Account([0u8; 32]));
    let base = serve(node).await;
    let cache = HttpListingCache::new(format!("{base}/api/")).unwrap();

    let query = TokenQuery {
        category: Some("music".into()),
        ..TokenQuery::default()
    };
    let tokens = cache.list_tokens(&query).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].category.as_deref(), Some("music"));

    let me = Address::Account([9u8; 32]);
    assert_eq!(cache.get_profile(&me).await.unwrap(), None);

    let profile = Profile {
        username: "keys".into(),
        display_name: "Keys".into(),
        ..Profile::default()
    };
    cache.put_profile(&me, &profile).await.unwrap();
    assert_eq!(cache.get_profile(&me).await.unwrap(), Some(profile));
}

#[tokio::test]
async fn browse_falls_back_when_the_cache_is_down() {
    let node = MockNode::new(&Address::Account([0u8; 32]));
    let base = serve(node).await;
    let session = Session::new(Arc::new(HttpLedger::new(format!("{base}/rpc")).unwrap()), None);

    let dead_cache = Arc::new(HttpListingCache::new("http://127.0.0.1:9/api").unwrap());
    let result = market()
        .with_cache(dead_cache)
        .browse(&session, &TokenQuery::default())
        .await
        .unwrap();

    match result {
        TokenBrowse::Ledger(tokens) => assert_eq!(tokens.len(), 2),
        other => panic!("expected a ledger listing, got {other:?}"),
    }
}
