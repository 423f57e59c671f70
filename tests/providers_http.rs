//! HTTP providers against mock backends.

use std::time::Duration;

use cert_anchor::providers::{
    BitcoindProvider, BlockcypherProvider, EsploraProvider, EtherscanProvider, InsightProvider,
    Provider, ProviderError, ProviderKind,
};

mod common;

const TIMEOUT: Duration = Duration::from_secs(5);

// BIP-173 testnet example address and its locking script
const SEGWIT_ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
const SEGWIT_SCRIPT: &str = "0014751e76e8199196d454941c45d1b3a323f1433bd6";

#[tokio::test]
async fn test_esplora_balance_includes_mempool() {
    let (addr, log) = common::start_mock_backend(
        200,
        r#"{"address":"x","chain_stats":{"funded_txo_count":2,"funded_txo_sum":5000,"spent_txo_count":1,"spent_txo_sum":1000,"tx_count":3},
            "mempool_stats":{"funded_txo_count":1,"funded_txo_sum":200,"spent_txo_count":0,"spent_txo_sum":0,"tx_count":1}}"#,
    )
    .await;

    let provider = EsploraProvider::new(&format!("{}/", common::url(addr)), TIMEOUT);
    let balance = provider.balance().unwrap().get_balance(SEGWIT_ADDRESS).await.unwrap();

    assert_eq!(balance, 4200);
    let requests = log.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path(), format!("/address/{}", SEGWIT_ADDRESS));
}

#[tokio::test]
async fn test_esplora_utxos_derive_script_from_address() {
    let (addr, _log) = common::start_mock_backend(
        200,
        r#"[{"txid":"aa","vout":1,"status":{"confirmed":true},"value":1500},
            {"txid":"bb","vout":0,"status":{"confirmed":false},"value":700}]"#,
    )
    .await;

    let provider = EsploraProvider::new(&common::url(addr), TIMEOUT);
    let utxos = provider
        .unspent_outputs()
        .unwrap()
        .get_unspent_outputs(SEGWIT_ADDRESS)
        .await
        .unwrap();

    assert_eq!(utxos.len(), 2);
    assert_eq!(utxos[0].txid, "aa");
    assert_eq!(utxos[0].vout, 1);
    assert_eq!(utxos[0].value, 1500);
    assert!(utxos.iter().all(|u| u.script_pubkey == SEGWIT_SCRIPT));
}

#[tokio::test]
async fn test_esplora_broadcast_posts_raw_hex() {
    let (addr, log) = common::start_mock_backend(200, "f00dcafe\n").await;

    let provider = EsploraProvider::new(&common::url(addr), TIMEOUT);
    let txid = provider.broadcaster().unwrap().broadcast_tx("0100abcd").await.unwrap();

    assert_eq!(txid.as_deref(), Some("f00dcafe"));
    let requests = log.lock().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path(), "/tx");
    assert_eq!(requests[0].body, "0100abcd");
}

#[tokio::test]
async fn test_esplora_error_status_carries_payload() {
    let (addr, _log) = common::start_mock_backend(400, "sendrawtransaction RPC error: bad-txns").await;

    let provider = EsploraProvider::new(&common::url(addr), TIMEOUT);
    let err = provider.broadcaster().unwrap().broadcast_tx("00").await.unwrap_err();

    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("bad-txns"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_insight_utxos_and_summed_balance() {
    let (addr, log) = common::start_mock_backend(
        200,
        r#"[{"address":"x","txid":"aa","vout":0,"scriptPubKey":"76a914","amount":0.00001,"satoshis":1000,"confirmations":6},
            {"address":"x","txid":"bb","vout":2,"scriptPubKey":"76a914","amount":0.00002,"satoshis":2000,"confirmations":0}]"#,
    )
    .await;

    let provider = InsightProvider::new(&common::url(addr), TIMEOUT);
    let utxos = provider.unspent_outputs().unwrap().get_unspent_outputs("mx").await.unwrap();
    assert_eq!(utxos.len(), 2);
    assert_eq!(utxos[1].script_pubkey, "76a914");

    let balance = provider.balance().unwrap().get_balance("mx").await.unwrap();
    assert_eq!(balance, 3000);
    assert_eq!(log.lock().unwrap()[0].path(), "/addr/mx/utxo");
}

#[tokio::test]
async fn test_insight_broadcast_sends_rawtx() {
    let (addr, log) = common::start_mock_backend(200, r#"{"txid":"abc123"}"#).await;

    let provider = InsightProvider::new(&common::url(addr), TIMEOUT);
    let txid = provider.broadcaster().unwrap().broadcast_tx("0100").await.unwrap();

    assert_eq!(txid.as_deref(), Some("abc123"));
    let requests = log.lock().unwrap();
    assert_eq!(requests[0].path(), "/tx/send");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["rawtx"], "0100");
}

#[tokio::test]
async fn test_blockcypher_push_with_token() {
    let (addr, log) =
        common::start_mock_backend(200, r#"{"tx":{"block_height":-1,"hash":"beef","fees":1000}}"#).await;

    let provider = BlockcypherProvider::new(&common::url(addr), "tok", TIMEOUT);
    assert!(provider.balance().is_none());
    let txid = provider.broadcaster().unwrap().broadcast_tx("0100").await.unwrap();

    assert_eq!(txid.as_deref(), Some("beef"));
    let requests = log.lock().unwrap();
    assert_eq!(requests[0].path(), "/txs/push");
    assert_eq!(requests[0].query(), "token=tok");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["tx"], "0100");
}

#[tokio::test]
async fn test_etherscan_balance_and_nonce() {
    let (addr, log) = common::start_programmable_backend(|request| async move {
        if request.query().contains("action=balance") {
            (200, r#"{"status":"1","message":"OK","result":"1000000000000000000"}"#.to_string())
        } else {
            (200, r#"{"jsonrpc":"2.0","id":1,"result":"0x1a"}"#.to_string())
        }
    })
    .await;

    let provider = EtherscanProvider::new(&format!("{}/api", common::url(addr)), Some("key".into()), TIMEOUT);
    assert!(provider.unspent_outputs().is_none());

    let balance = provider.balance().unwrap().get_balance("0xabc").await.unwrap();
    assert_eq!(balance, 1_000_000_000_000_000_000);

    let nonce = provider.nonce().unwrap().get_nonce("0xabc").await.unwrap();
    assert_eq!(nonce, 26);

    let requests = log.lock().unwrap();
    assert_eq!(requests[0].path(), "/api");
    assert!(requests[0].query().contains("module=account"));
    assert!(requests[0].query().contains("address=0xabc"));
    assert!(requests[0].query().contains("apikey=key"));
    assert!(requests[1].query().contains("action=eth_getTransactionCount"));
}

#[tokio::test]
async fn test_etherscan_broadcast_and_rejection() {
    let (addr, log) = common::start_programmable_backend(|request| async move {
        if request.body.contains("hex=0xgood") {
            (200, r#"{"jsonrpc":"2.0","id":1,"result":"0xhash"}"#.to_string())
        } else {
            (
                200,
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#.to_string(),
            )
        }
    })
    .await;

    let provider = EtherscanProvider::new(&common::url(addr), None, TIMEOUT);
    let broadcaster = provider.broadcaster().unwrap();

    assert_eq!(broadcaster.broadcast_tx("0xgood").await.unwrap().as_deref(), Some("0xhash"));
    assert!(matches!(
        broadcaster.broadcast_tx("0xbad").await,
        Err(ProviderError::Rejected(ref m)) if m == "nonce too low"
    ));
    assert_eq!(log.lock().unwrap()[0].method, "POST");
    assert!(!log.lock().unwrap()[0].query().contains("apikey"));
}

#[tokio::test]
async fn test_bitcoind_scan_and_send() {
    let (addr, log) = common::start_programmable_backend(|request| async move {
        let rpc: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        match rpc["method"].as_str() {
            Some("scantxoutset") => (
                200,
                r#"{"result":{"success":true,"unspents":[
                    {"txid":"t1","vout":0,"scriptPubKey":"0014ab","amount":0.0001,"height":100},
                    {"txid":"t2","vout":3,"scriptPubKey":"0014ab","amount":0.29,"height":101}]},
                   "error":null,"id":"cert-anchor"}"#
                    .to_string(),
            ),
            _ => (200, r#"{"result":"txid42","error":null,"id":"cert-anchor"}"#.to_string()),
        }
    })
    .await;

    let provider = BitcoindProvider::new(&common::url(addr), "user", "pass", TIMEOUT);
    assert_eq!(provider.kind(), ProviderKind::LocalNode);

    let balance = provider.balance().unwrap().get_balance("bcrt1qxyz").await.unwrap();
    assert_eq!(balance, 10_000 + 29_000_000);

    let txid = provider.broadcaster().unwrap().broadcast_tx("0100").await.unwrap();
    assert_eq!(txid.as_deref(), Some("txid42"));

    let requests = log.lock().unwrap();
    assert!(requests[0].header("authorization").unwrap().starts_with("Basic "));
    let scan: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(scan["params"][1][0], "addr(bcrt1qxyz)");
}

#[tokio::test]
async fn test_bitcoind_rpc_error_is_rejected() {
    let (addr, _log) = common::start_mock_backend(
        500,
        r#"{"result":null,"error":{"code":-26,"message":"txn-mempool-conflict"},"id":"cert-anchor"}"#,
    )
    .await;

    let provider = BitcoindProvider::new(&common::url(addr), "user", "pass", TIMEOUT);
    let err = provider.broadcaster().unwrap().broadcast_tx("0100").await.unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(ref m) if m.contains("txn-mempool-conflict")));
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = InsightProvider::new(&common::url(addr), TIMEOUT);
    let err = provider.balance().unwrap().get_balance("mx").await.unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
}
