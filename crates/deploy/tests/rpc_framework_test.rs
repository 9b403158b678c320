//! JSON-RPC tests for roulette-deploy.
//!
//! These tests run [`RpcFramework`] against a scripted HTTP JSON-RPC node
//! bound to a local port, so every receipt the framework interprets comes
//! off the wire. Run with: cargo test --test rpc_framework_test

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use roulette_deploy::{
    ConfirmationConfig, ContractArtifact, DeploymentFramework, InitialMigration, MigrationConfig,
    RpcFramework, SequencerError,
    rpc::{self, ConfirmationPolicy},
};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

const CHAIN_ID: u64 = 1337;
const SENDER: Address = Address::repeat_byte(0xd0);
const CONTRACT: Address = Address::repeat_byte(0xc0);
const DEPLOY_TX: B256 = B256::repeat_byte(0x01);
const CONFIGURE_TX: B256 = B256::repeat_byte(0x02);

/// How the node answers one request.
enum Reply {
    Result(Value),
    Error(String),
    /// Close the connection without answering.
    Hangup,
}

type Handler = dyn Fn(&str, &[Value]) -> Reply + Send + Sync;

/// A request received by the node.
#[derive(Debug, Clone)]
struct Call {
    method: String,
    params: Vec<Value>,
}

/// HTTP JSON-RPC node answering each request through a handler.
struct StubNode {
    url: String,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl StubNode {
    async fn start<H>(handler: H) -> Self
    where
        H: Fn(&str, &[Value]) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handler: Arc<Handler> = Arc::new(handler);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let recorded = calls.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve(stream, handler.as_ref(), &recorded).await {
                        tracing::debug!(error = %e, "Stub connection closed");
                    }
                });
            }
        });

        Self { url, calls }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }
}

/// Answer a single HTTP request, then close the connection.
async fn serve(stream: TcpStream, handler: &Handler, calls: &Mutex<Vec<Call>>) -> Result<()> {
    let mut reader = BufReader::new(stream);

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse()?;
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    let request: Value = serde_json::from_slice(&body)?;
    let method = request["method"]
        .as_str()
        .context("Request without method")?
        .to_string();
    let params = request["params"].as_array().cloned().unwrap_or_default();
    calls.lock().unwrap().push(Call {
        method: method.clone(),
        params: params.clone(),
    });

    let payload = match handler(&method, &params) {
        Reply::Result(result) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
        Reply::Error(message) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": -32000, "message": message }
        }),
        Reply::Hangup => return Ok(()),
    };

    let body = payload.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// How the scripted node settles the two migration transactions.
#[derive(Debug, Clone, Copy)]
struct Script {
    deploy_status: &'static str,
    contract_address: Option<Address>,
    configure_status: &'static str,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            deploy_status: "0x1",
            contract_address: Some(CONTRACT),
            configure_status: "0x1",
        }
    }
}

fn receipt(tx_hash: B256, contract_address: Option<Address>, status: &str) -> Value {
    json!({
        "transactionHash": tx_hash,
        "blockNumber": "0x1",
        "contractAddress": contract_address,
        "status": status,
    })
}

/// A node with one unlocked account that mines every transaction at once.
async fn roulette_node(script: Script) -> StubNode {
    StubNode::start(move |method: &str, params: &[Value]| match method {
        "eth_chainId" => Reply::Result(json!(format!("{:#x}", CHAIN_ID))),
        "eth_accounts" => Reply::Result(json!([SENDER])),
        "eth_sendTransaction" => {
            if params[0].get("to").is_some() {
                Reply::Result(json!(CONFIGURE_TX))
            } else {
                Reply::Result(json!(DEPLOY_TX))
            }
        }
        "eth_getTransactionReceipt" => {
            let tx_hash: B256 = serde_json::from_value(params[0].clone()).unwrap();
            if tx_hash == DEPLOY_TX {
                Reply::Result(receipt(
                    DEPLOY_TX,
                    script.contract_address,
                    script.deploy_status,
                ))
            } else {
                Reply::Result(receipt(CONFIGURE_TX, None, script.configure_status))
            }
        }
        "eth_getCode" => Reply::Result(json!("0x6080604052")),
        other => Reply::Error(format!("the method {} does not exist", other)),
    })
    .await
}

fn config(node: &StubNode) -> MigrationConfig {
    MigrationConfig {
        rpc_url: node.url.clone(),
        request_timeout_secs: 5,
        confirmation: ConfirmationConfig {
            poll_interval_ms: 10,
            timeout_secs: 1,
        },
        ..MigrationConfig::default()
    }
}

fn artifact() -> ContractArtifact {
    ContractArtifact::from_json(r#"{ "contractName": "Roulette", "bytecode": "0x6080604052" }"#)
        .unwrap()
}

fn policy() -> ConfirmationPolicy {
    ConfirmationPolicy {
        poll_interval: Duration::from_millis(10),
        timeout: Duration::from_millis(100),
    }
}

/// Initialize tracing for tests (idempotent).
fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

#[tokio::test]
async fn test_connect_resolves_chain_and_sender() {
    init_test_tracing();
    let node = roulette_node(Script::default()).await;

    let framework = RpcFramework::connect(&MigrationConfig {
        chain_id: Some(CHAIN_ID),
        ..config(&node)
    })
    .await
    .unwrap();

    assert_eq!(framework.chain_id(), CHAIN_ID);
    assert_eq!(framework.sender(), SENDER);
    assert_eq!(node.methods(), vec!["eth_chainId", "eth_accounts"]);
}

#[tokio::test]
async fn test_connect_rejects_wrong_chain_id() {
    init_test_tracing();
    let node = roulette_node(Script::default()).await;

    let err = RpcFramework::connect(&MigrationConfig {
        chain_id: Some(1),
        ..config(&node)
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Chain ID mismatch"), "{:#}", err);
    assert_eq!(node.methods(), vec!["eth_chainId"]);
}

#[tokio::test]
async fn test_migration_over_json_rpc() {
    init_test_tracing();
    let node = roulette_node(Script::default()).await;
    let framework = RpcFramework::connect(&config(&node)).await.unwrap();

    let outcome = InitialMigration::default()
        .run(&framework, &artifact(), None)
        .await
        .unwrap();

    assert_eq!(outcome.address, CONTRACT);
    assert_eq!(outcome.deploy_tx, DEPLOY_TX);
    assert_eq!(outcome.configure_tx, CONFIGURE_TX);
    assert_eq!(
        node.methods(),
        vec![
            "eth_chainId",
            "eth_accounts",
            "eth_sendTransaction",
            "eth_getTransactionReceipt",
            "eth_getCode",
            "eth_sendTransaction",
            "eth_getTransactionReceipt",
        ]
    );

    let sends: Vec<Call> = node
        .calls()
        .into_iter()
        .filter(|c| c.method == "eth_sendTransaction")
        .collect();

    // Creation: bytecode followed by the two constructor words, no recipient.
    let creation = &sends[0].params[0];
    assert!(creation.get("to").is_none());
    let data = creation["data"].as_str().unwrap();
    assert!(data.starts_with("0x6080604052"));
    assert_eq!(data.len(), 2 + 2 * (5 + 64));

    let configure = &sends[1].params[0];
    let to: Address = serde_json::from_value(configure["to"].clone()).unwrap();
    assert_eq!(to, CONTRACT);
}

#[tokio::test]
async fn test_reverted_creation_is_a_deployment_failure() {
    init_test_tracing();
    let node = roulette_node(Script {
        deploy_status: "0x0",
        ..Script::default()
    })
    .await;
    let framework = RpcFramework::connect(&config(&node)).await.unwrap();

    let err = InitialMigration::default()
        .run(&framework, &artifact(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SequencerError::Deployment(_)), "{}", err);
    assert!(err.to_string().contains("reverted"), "{}", err);
    assert_eq!(node.count("eth_sendTransaction"), 1);
    assert_eq!(node.count("eth_getCode"), 0);
}

#[tokio::test]
async fn test_creation_without_contract_address_is_a_deployment_failure() {
    init_test_tracing();
    let node = roulette_node(Script {
        contract_address: None,
        ..Script::default()
    })
    .await;
    let framework = RpcFramework::connect(&config(&node)).await.unwrap();

    let err = InitialMigration::default()
        .run(&framework, &artifact(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SequencerError::Deployment(_)), "{}", err);
    assert!(err.to_string().contains("no contract address"), "{}", err);
    assert_eq!(node.count("eth_sendTransaction"), 1);
}

#[tokio::test]
async fn test_reverted_set_token_is_a_configuration_failure() {
    init_test_tracing();
    let node = roulette_node(Script {
        configure_status: "0x0",
        ..Script::default()
    })
    .await;
    let framework = RpcFramework::connect(&config(&node)).await.unwrap();

    let err = InitialMigration::default()
        .run(&framework, &artifact(), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, SequencerError::Configuration { address, .. } if address == CONTRACT),
        "{}",
        err
    );
    assert_eq!(err.deployed_address(), Some(CONTRACT));
    assert!(err.to_string().contains("reverted"), "{}", err);
    assert_eq!(node.count("eth_sendTransaction"), 2);
}

#[tokio::test]
async fn test_unmined_transaction_times_out() {
    init_test_tracing();
    let node = StubNode::start(|method: &str, _: &[Value]| match method {
        "eth_getTransactionReceipt" => Reply::Result(Value::Null),
        other => Reply::Error(format!("the method {} does not exist", other)),
    })
    .await;
    let client = rpc::create_client(Duration::from_secs(5)).unwrap();

    let err = rpc::wait_for_receipt(&client, &node.url, DEPLOY_TX, policy())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Timeout waiting"), "{:#}", err);
    assert!(node.count("eth_getTransactionReceipt") >= 10);
}

#[tokio::test]
async fn test_dropped_connection_while_waiting_is_retried() {
    init_test_tracing();
    let lookups = AtomicUsize::new(0);
    let node = StubNode::start(move |method: &str, _: &[Value]| match method {
        "eth_getTransactionReceipt" => {
            if lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                Reply::Hangup
            } else {
                Reply::Result(receipt(DEPLOY_TX, Some(CONTRACT), "0x1"))
            }
        }
        other => Reply::Error(format!("the method {} does not exist", other)),
    })
    .await;
    let client = rpc::create_client(Duration::from_secs(5)).unwrap();

    let receipt = rpc::wait_for_receipt(&client, &node.url, DEPLOY_TX, policy())
        .await
        .unwrap();

    assert_eq!(receipt.transaction_hash, DEPLOY_TX);
    assert_eq!(receipt.contract_address, Some(CONTRACT));
    assert_eq!(node.count("eth_getTransactionReceipt"), 2);
}

#[tokio::test]
async fn test_rpc_error_while_waiting_aborts() {
    init_test_tracing();
    let node = StubNode::start(|_: &str, _: &[Value]| Reply::Error("unknown transaction".into()))
        .await;
    let client = rpc::create_client(Duration::from_secs(5)).unwrap();

    let err = rpc::wait_for_receipt(&client, &node.url, DEPLOY_TX, policy())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unknown transaction"), "{:#}", err);
    assert_eq!(node.count("eth_getTransactionReceipt"), 1);
}
