//! Server Round-Trip Tests
//!
//! Drives a real listener over TCP with newline-delimited JSON and checks
//! graceful shutdown flushes databases to disk.

use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use tessera_server::ServerConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct Client {
    reader: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send_raw(&mut self, line: &str) -> Value {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        let reply = tokio::time::timeout(Duration::from_secs(10), self.reader.next_line())
            .await
            .expect("response timed out")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&reply).unwrap()
    }

    async fn send(&mut self, request: Value) -> Value {
        self.send_raw(&request.to_string()).await
    }
}

fn config(data_dir: &std::path::Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.engine.data_dir = data_dir.to_path_buf();
    config.engine.flush_on_commit = false;
    config
}

#[tokio::test]
async fn test_round_trip_and_shutdown() {
    let dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(tessera_server::run_with_listener(
        config(dir.path()),
        listener,
        async move {
            let _ = stop_rx.await;
        },
    ));

    let mut client = Client::connect(addr).await;

    let inserted = client
        .send(json!({
            "id": "1",
            "command": {"BatchInsert": {"database": "orders", "statements": [
                {"key": "a", "value": {"str": "pending"}, "tags": [{"name": "n", "value": {"int": 1}}]},
                {"key": "b", "value": {"blob": {"$bytes": "AQID"}}}
            ]}}
        }))
        .await;
    assert_eq!(inserted["id"], json!("1"));
    assert_eq!(inserted["ok"], json!(true));
    assert_eq!(inserted["result"]["Exec"]["rows_affected"], json!(2));

    let fetched = client
        .send(json!({
            "id": "2",
            "command": {"MultiGet": {"database": "orders", "keys": ["a", "b"]}}
        }))
        .await;
    assert_eq!(fetched["ok"], json!(true));
    let docs = &fetched["result"]["Query"]["documents"];
    assert_eq!(docs["a"]["value"], json!({"str": "pending"}));
    assert_eq!(docs["a"]["tags"][0], json!({"name": "n", "value": {"int": 1}}));
    assert_eq!(docs["b"]["value"], json!({"blob": {"$bytes": "AQID"}}));

    let duplicate = client
        .send(json!({
            "id": "3",
            "command": {"BatchInsert": {"database": "orders", "statements": [
                {"key": "a", "value": {"int": 0}}
            ]}}
        }))
        .await;
    assert_eq!(duplicate["ok"], json!(false));
    assert_eq!(duplicate["error"]["code"], json!("already_exists"));

    let missing = client
        .send(json!({
            "id": "4",
            "command": {"MultiGet": {"database": "orders", "keys": ["a", "zzz"]}}
        }))
        .await;
    assert_eq!(missing["error"]["code"], json!("not_found"));
    assert_eq!(missing["error"]["details"], json!({"expected": 2, "actual": 1}));

    let bad_value = client
        .send(json!({
            "id": "5",
            "command": {"BatchUpsert": {"database": "orders", "statements": [
                {"key": "c", "value": {"float": 1.5}}
            ]}}
        }))
        .await;
    assert_eq!(bad_value["error"]["code"], json!("invalid_argument"));
    assert_eq!(
        bad_value["error"]["details"]["violations"][0]["field"],
        json!("statements[key=c].value")
    );

    let garbage = client.send_raw("{not json").await;
    assert_eq!(garbage["ok"], json!(false));
    assert_eq!(garbage["error"]["code"], json!("invalid_argument"));

    drop(client);
    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    // Deferred writes reached disk on shutdown
    assert!(dir.path().join("orders.tdb").exists());
}

#[tokio::test]
async fn test_disabled_listener_refuses_to_start() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.listener.enabled = false;
    let result = tessera_server::run(config, async {}).await;
    assert!(result.is_err());
}
