//! WebSocket JSON-RPC transport with auto-reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::value::RawValue;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use chainclient_core::error::TransportError;
use chainclient_core::request::{JsonRpcRequest, JsonRpcResponse, RpcId};
use chainclient_core::transport::Transport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ResponseSender = oneshot::Sender<Result<Box<RawValue>, TransportError>>;
type PendingMap = Arc<Mutex<HashMap<u64, ResponseSender>>>;

/// Reconnect behavior for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Reconnect backoff starting duration.
    pub reconnect_initial: Duration,
    /// Maximum reconnect backoff.
    pub reconnect_max: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

/// Command sent from callers to the background connection task.
enum WsCommand {
    Send {
        req: JsonRpcRequest,
        tx: ResponseSender,
    },
    Close,
}

/// WebSocket JSON-RPC transport.
///
/// A background task owns the connection; callers hand it requests over a
/// channel and get their response back through a oneshot, matched by request
/// id. On disconnect the task fails everything in flight and reconnects with
/// capped exponential backoff. Requests arriving while disconnected fail
/// immediately rather than queueing.
#[derive(Debug)]
pub struct WsTransport {
    url: String,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
    next_id: AtomicU64,
}

impl WsTransport {
    /// Connect to `url` and start the background connection task.
    ///
    /// The initial connection is made eagerly so a bad endpoint fails here
    /// instead of on the first request.
    pub async fn connect(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_config(url, WsConfig::default()).await
    }

    /// Connect with custom reconnect behavior.
    pub async fn with_config(
        url: impl Into<String>,
        config: WsConfig,
    ) -> Result<Self, TransportError> {
        let url = url.into();

        let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        tracing::info!(url = %url, "WebSocket connected");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
        let task_url = url.clone();
        tokio::spawn(async move {
            ws_task(task_url, ws_stream, cmd_rx, config).await;
        });

        Ok(Self {
            url,
            cmd_tx,
            next_id: AtomicU64::new(1),
        })
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Send { req, tx })
            .map_err(|_| TransportError::WebSocket("connection task closed".into()))?;
        rx.await
            .map_err(|_| TransportError::WebSocket("response dropped".into()))?
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Background task that owns the WebSocket connection.
///
/// Runs one connection at a time: serve requests until the connection drops,
/// fail whatever was in flight, then reconnect with backoff. Returns when the
/// transport is dropped or explicitly closed.
async fn ws_task(
    url: String,
    initial: WsStream,
    mut cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
    config: WsConfig,
) {
    let mut conn = Some(initial);
    let mut backoff = config.reconnect_initial;

    loop {
        let ws_stream = match conn.take() {
            Some(stream) => stream,
            None => match tokio_tungstenite::connect_async(&url).await {
                Ok((stream, _)) => {
                    tracing::info!(url = %url, "WebSocket reconnected");
                    stream
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "WebSocket connect failed, retrying in {backoff:?}");
                    if reject_during_backoff(&mut cmd_rx, backoff, &e.to_string()).await {
                        return;
                    }
                    backoff = (backoff * 2).min(config.reconnect_max);
                    continue;
                }
            },
        };

        backoff = config.reconnect_initial; // reset on success
        let (mut sink, mut stream) = ws_stream.split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        // Serve this connection until it drops.
        loop {
            tokio::select! {
                // Incoming commands from callers
                cmd = cmd_rx.recv() => {
                    match cmd {
                        None | Some(WsCommand::Close) => return,
                        Some(WsCommand::Send { req, tx }) => {
                            let id = match &req.id { RpcId::Number(n) => *n, _ => 0 };
                            match serde_json::to_string(&req) {
                                Ok(msg) => {
                                    pending.lock().unwrap().insert(id, tx);
                                    if sink.send(Message::Text(msg.into())).await.is_err() {
                                        // Connection dropped — break to reconnect
                                        break;
                                    }
                                }
                                Err(e) => {
                                    let _ = tx.send(Err(TransportError::Serialization(e)));
                                }
                            }
                        }
                    }
                }
                // Incoming messages from the node
                msg = stream.next() => {
                    match msg {
                        None => break, // stream closed
                        Some(Err(e)) => {
                            tracing::warn!(url = %url, error = %e, "WebSocket receive error");
                            break;
                        }
                        Some(Ok(Message::Text(text))) => {
                            handle_message(text.as_str(), &pending);
                        }
                        Some(Ok(Message::Close(_))) => break,
                        _ => {}
                    }
                }
            }
        }

        // Fail everything in flight so callers can fall back to another
        // transport now instead of waiting out their deadline.
        for (_, tx) in pending.lock().unwrap().drain() {
            let _ = tx.send(Err(TransportError::WebSocket("connection lost".into())));
        }

        tracing::warn!(url = %url, "WebSocket disconnected, reconnecting in {backoff:?}");
        if reject_during_backoff(&mut cmd_rx, backoff, "connection lost").await {
            return;
        }
        backoff = (backoff * 2).min(config.reconnect_max);
    }
}

/// Wait out the reconnect backoff, failing any requests that arrive in the
/// meantime. Returns `true` when the command channel has closed.
async fn reject_during_backoff(
    cmd_rx: &mut mpsc::UnboundedReceiver<WsCommand>,
    backoff: Duration,
    reason: &str,
) -> bool {
    let wait = time::sleep(backoff);
    tokio::pin!(wait);

    loop {
        tokio::select! {
            _ = &mut wait => return false,
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(WsCommand::Close) => return true,
                    Some(WsCommand::Send { tx, .. }) => {
                        let _ = tx.send(Err(TransportError::WebSocket(format!(
                            "not connected: {reason}"
                        ))));
                    }
                }
            }
        }
    }
}

fn handle_message(text: &str, pending: &PendingMap) {
    let resp: JsonRpcResponse = match serde_json::from_str(text) {
        Ok(resp) => resp,
        Err(_) => {
            tracing::debug!("ignoring non-response WebSocket message");
            return;
        }
    };
    let id = match &resp.id {
        RpcId::Number(n) => *n,
        _ => return,
    };
    if let Some(tx) = pending.lock().unwrap().remove(&id) {
        let _ = tx.send(resp.into_result());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn ws_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(sock).await.unwrap();
            handler(ws).await;
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn round_trip_returns_raw_result() {
        let url = ws_server(|mut ws| async move {
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let req: Value = serde_json::from_str(text.as_str()).unwrap();
                assert_eq!(req["method"], "eth_blockNumber");
                let resp = json!({"jsonrpc": "2.0", "id": req["id"], "result": "0x2a"});
                ws.send(Message::Text(resp.to_string().into())).await.unwrap();
            }
        })
        .await;

        let transport = WsTransport::connect(&url).await.unwrap();
        let result = transport.request("eth_blockNumber", vec![]).await.unwrap();
        assert_eq!(result.get(), "\"0x2a\"");
    }

    #[tokio::test]
    async fn responses_match_by_id_out_of_order() {
        let url = ws_server(|mut ws| async move {
            let mut reqs = Vec::new();
            while reqs.len() < 2 {
                if let Some(Ok(Message::Text(text))) = ws.next().await {
                    reqs.push(serde_json::from_str::<Value>(text.as_str()).unwrap());
                }
            }
            // Answer in reverse order; each response names its request.
            for req in reqs.iter().rev() {
                let resp = json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "result": req["method"],
                });
                ws.send(Message::Text(resp.to_string().into())).await.unwrap();
            }
        })
        .await;

        let transport = WsTransport::connect(&url).await.unwrap();
        let (first, second) = tokio::join!(
            transport.request("eth_chainId", vec![]),
            transport.request("eth_gasPrice", vec![]),
        );
        assert_eq!(first.unwrap().get(), "\"eth_chainId\"");
        assert_eq!(second.unwrap().get(), "\"eth_gasPrice\"");
    }

    #[tokio::test]
    async fn rpc_error_member_is_surfaced() {
        let url = ws_server(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let req: Value = serde_json::from_str(text.as_str()).unwrap();
                let resp = json!({
                    "jsonrpc": "2.0",
                    "id": req["id"],
                    "error": {"code": -32000, "message": "execution reverted"},
                });
                ws.send(Message::Text(resp.to_string().into())).await.unwrap();
            }
        })
        .await;

        let transport = WsTransport::connect(&url).await.unwrap();
        let err = transport.request("eth_call", vec![]).await.unwrap_err();
        match err {
            TransportError::Rpc(rpc) => assert_eq!(rpc.code, -32000),
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnect_fails_in_flight_request() {
        let url = ws_server(|mut ws| async move {
            // Read the request, then hang up without answering.
            let _ = ws.next().await;
            let _ = ws.close(None).await;
        })
        .await;

        let transport = WsTransport::connect(&url).await.unwrap();
        let err = transport.request("eth_blockNumber", vec![]).await.unwrap_err();
        match err {
            TransportError::WebSocket(msg) => {
                assert!(msg.contains("connection lost"), "unexpected message: {msg}");
            }
            other => panic!("expected WebSocket error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn requests_fail_fast_while_reconnecting() {
        let url = ws_server(|mut ws| async move {
            let _ = ws.close(None).await;
        })
        .await;

        // Long backoff keeps the task inside its reconnect wait for the
        // whole test.
        let config = WsConfig {
            reconnect_initial: Duration::from_secs(30),
            reconnect_max: Duration::from_secs(60),
        };
        let transport = WsTransport::with_config(&url, config).await.unwrap();

        // Give the task a moment to observe the server hangup.
        time::sleep(Duration::from_millis(200)).await;

        let start = std::time::Instant::now();
        let err = transport.request("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::WebSocket(_)));
        // Rejected immediately, not after the 30s backoff.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn connect_to_dead_endpoint_fails() {
        // Bind then drop to get a port with no listener.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = WsTransport::connect(format!("ws://{addr}")).await.unwrap_err();
        assert!(matches!(err, TransportError::WebSocket(_)));
    }
}
