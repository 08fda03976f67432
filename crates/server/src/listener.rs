//! Newline-delimited JSON over TCP
//!
//! Each connection is served by its own task. Requests on one connection
//! are answered in order; each runs on the blocking pool with a
//! [`CancelToken`] carrying the request deadline.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tessera_engine::CancelToken;
use tessera_executor::{Error, Executor};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::envelope::{decode_request, encode_response, Response};

/// Accept connections until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    executor: Arc<Executor>,
    request_timeout: Duration,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(target: "tessera::server", "Stopped accepting connections");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(target: "tessera::server", error = %e, "Accept failed");
                        continue;
                    }
                };
                debug!(target: "tessera::server", peer = %addr, "Connection opened");

                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, addr, executor, request_timeout).await {
                        warn!(target: "tessera::server", peer = %addr, error = %e, "Connection error");
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    executor: Arc<Executor>,
    request_timeout: Duration,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = dispatch(Arc::clone(&executor), &line, request_timeout).await;
        match encode_response(&response) {
            Ok(mut encoded) => {
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
            }
            Err(e) => {
                warn!(target: "tessera::server", peer = %addr, error = %e, "Failed to encode response");
            }
        }
    }

    debug!(target: "tessera::server", peer = %addr, "Connection closed");
    Ok(())
}

/// Decode, execute and answer one request line
pub async fn dispatch(executor: Arc<Executor>, line: &str, request_timeout: Duration) -> Response {
    let request = match decode_request(line) {
        Ok(request) => request,
        Err((id, err)) => return Response::error(&id, &err),
    };

    let id = request.id;
    let command = request.command;
    let cancel = CancelToken::with_timeout(request_timeout);
    let result = tokio::task::spawn_blocking(move || executor.execute(command, &cancel)).await;

    match result {
        Ok(result) => Response::from_result(&id, result),
        Err(join_err) => Response::error(
            &id,
            &Error::Internal {
                reason: format!("request task failed: {}", join_err),
            },
        ),
    }
}
