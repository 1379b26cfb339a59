//! IPC JSON-RPC transport over a Unix domain socket.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::value::RawValue;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time;

use chainclient_core::error::TransportError;
use chainclient_core::request::{JsonRpcRequest, JsonRpcResponse, RpcId};
use chainclient_core::transport::Transport;

type ResponseSender = oneshot::Sender<Result<Box<RawValue>, TransportError>>;
type PendingMap = Arc<Mutex<HashMap<u64, ResponseSender>>>;

/// Reconnect behavior for the IPC transport.
#[derive(Debug, Clone)]
pub struct IpcConfig {
    /// Reconnect backoff starting duration.
    pub reconnect_initial: Duration,
    /// Maximum reconnect backoff.
    pub reconnect_max: Duration,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

/// Command sent from callers to the background connection task.
enum IpcCommand {
    Send {
        req: JsonRpcRequest,
        tx: ResponseSender,
    },
    Close,
}

/// IPC JSON-RPC transport over a Unix domain socket.
///
/// Same shape as the WebSocket transport: a background task owns the socket,
/// requests are multiplexed and matched by id, in-flight requests fail on
/// disconnect, and the task reconnects with capped exponential backoff.
/// Framing is newline-delimited JSON, one envelope per line.
#[derive(Debug)]
pub struct IpcTransport {
    path: String,
    cmd_tx: mpsc::UnboundedSender<IpcCommand>,
    next_id: AtomicU64,
}

impl IpcTransport {
    /// Connect to the socket at `path` and start the background task.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        Self::with_config(path, IpcConfig::default()).await
    }

    /// Connect with custom reconnect behavior.
    pub async fn with_config(
        path: impl AsRef<Path>,
        config: IpcConfig,
    ) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();

        let stream = UnixStream::connect(&path)
            .await
            .map_err(|e| TransportError::Ipc(e.to_string()))?;
        tracing::info!(path = %path.display(), "IPC connected");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<IpcCommand>();
        let task_path = path.clone();
        tokio::spawn(async move {
            ipc_task(task_path, stream, cmd_rx, config).await;
        });

        Ok(Self {
            path: path.display().to_string(),
            cmd_tx,
            next_id: AtomicU64::new(1),
        })
    }
}

impl Drop for IpcTransport {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(IpcCommand::Close);
    }
}

#[async_trait]
impl Transport for IpcTransport {
    async fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Box<RawValue>, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(IpcCommand::Send { req, tx })
            .map_err(|_| TransportError::Ipc("connection task closed".into()))?;
        rx.await
            .map_err(|_| TransportError::Ipc("response dropped".into()))?
    }

    fn endpoint(&self) -> &str {
        &self.path
    }
}

/// Background task that owns the Unix stream.
async fn ipc_task(
    path: PathBuf,
    initial: UnixStream,
    mut cmd_rx: mpsc::UnboundedReceiver<IpcCommand>,
    config: IpcConfig,
) {
    let mut conn = Some(initial);
    let mut backoff = config.reconnect_initial;

    loop {
        let stream = match conn.take() {
            Some(stream) => stream,
            None => match UnixStream::connect(&path).await {
                Ok(stream) => {
                    tracing::info!(path = %path.display(), "IPC reconnected");
                    stream
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "IPC connect failed, retrying in {backoff:?}");
                    if reject_during_backoff(&mut cmd_rx, backoff, &e.to_string()).await {
                        return;
                    }
                    backoff = (backoff * 2).min(config.reconnect_max);
                    continue;
                }
            },
        };

        backoff = config.reconnect_initial; // reset on success
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        // Serve this connection until it drops.
        loop {
            tokio::select! {
                // Incoming commands from callers
                cmd = cmd_rx.recv() => {
                    match cmd {
                        None | Some(IpcCommand::Close) => return,
                        Some(IpcCommand::Send { req, tx }) => {
                            let id = match &req.id { RpcId::Number(n) => *n, _ => 0 };
                            match serde_json::to_string(&req) {
                                Ok(mut msg) => {
                                    msg.push('\n');
                                    pending.lock().unwrap().insert(id, tx);
                                    if write_half.write_all(msg.as_bytes()).await.is_err() {
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
                // Incoming lines from the node
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => handle_line(&line, &pending),
                        Ok(None) => break, // EOF
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "IPC read error");
                            break;
                        }
                    }
                }
            }
        }

        // Fail everything in flight so callers can fall back to another
        // transport now instead of waiting out their deadline.
        for (_, tx) in pending.lock().unwrap().drain() {
            let _ = tx.send(Err(TransportError::Ipc("connection lost".into())));
        }

        tracing::warn!(path = %path.display(), "IPC disconnected, reconnecting in {backoff:?}");
        if reject_during_backoff(&mut cmd_rx, backoff, "connection lost").await {
            return;
        }
        backoff = (backoff * 2).min(config.reconnect_max);
    }
}

/// Wait out the reconnect backoff, failing any requests that arrive in the
/// meantime. Returns `true` when the command channel has closed.
async fn reject_during_backoff(
    cmd_rx: &mut mpsc::UnboundedReceiver<IpcCommand>,
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
                    None | Some(IpcCommand::Close) => return true,
                    Some(IpcCommand::Send { tx, .. }) => {
                        let _ = tx.send(Err(TransportError::Ipc(format!(
                            "not connected: {reason}"
                        ))));
                    }
                }
            }
        }
    }
}

fn handle_line(line: &str, pending: &PendingMap) {
    let resp: JsonRpcResponse = match serde_json::from_str(line) {
        Ok(resp) => resp,
        Err(_) => {
            tracing::debug!("ignoring non-response IPC line");
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
