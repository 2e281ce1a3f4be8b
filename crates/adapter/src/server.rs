//! TCP server for the match-3 protocol
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::core::{GameConfig, GameSnapshot};
use crate::handle::GameHandle;
use crate::protocol::*;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            protocol_version: PROTOCOL_VERSION.to_string(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_*` environment variables. Unparsable values keep their defaults.
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        let host = env::var("MATCH3_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);

        Self {
            host,
            port: parsed("MATCH3_PORT").unwrap_or(defaults.port),
            protocol_version: defaults.protocol_version,
            game: GameConfig {
                rows: parsed("MATCH3_ROWS").unwrap_or(defaults.game.rows),
                cols: parsed("MATCH3_COLS").unwrap_or(defaults.game.cols),
                seed: parsed("MATCH3_SEED"),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    game: GameHandle,
    clients: RwLock<Vec<ClientHandle>>,
    observation_seq: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig, game: GameHandle) -> Self {
        Self {
            config,
            game,
            clients: RwLock::new(Vec::new()),
            observation_seq: AtomicU64::new(0),
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: u64,
    pub addr: SocketAddr,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>, // Channel to send messages to client
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Welcome(WelcomeMessage),
    State(StateMessage),
    MoveResult(MoveResultMessage),
    Hint(HintMessage),
    Error(ErrorMessage),
}

impl ClientOutbound {
    fn encode(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            ClientOutbound::Welcome(m) => serde_json::to_writer(buf, m),
            ClientOutbound::State(m) => serde_json::to_writer(buf, m),
            ClientOutbound::MoveResult(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Hint(m) => serde_json::to_writer(buf, m),
            ClientOutbound::Error(m) => serde_json::to_writer(buf, m),
        }
    }
}

async fn is_handshaken(state: &ServerState, client_id: u64) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

async fn check_and_update_seq(state: &ServerState, client_id: u64, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

/// Gate for every request after hello: handshake first, then strictly increasing seq.
/// Sends the error itself and returns false when the request must be dropped.
async fn admit(
    state: &ServerState,
    client_id: u64,
    seq: u64,
    tx: &mpsc::UnboundedSender<ClientOutbound>,
) -> bool {
    if !is_handshaken(state, client_id).await {
        let error = create_error(seq, ErrorCode::HandshakeRequired, "Send hello first");
        let _ = tx.send(ClientOutbound::Error(error));
        return false;
    }
    if !check_and_update_seq(state, client_id, seq).await {
        let error = create_error(
            seq,
            ErrorCode::InvalidCommand,
            "seq must be strictly increasing",
        );
        let _ = tx.send(ClientOutbound::Error(error));
        return false;
    }
    true
}

/// Push the new state to every other handshaken client that asked for observations
async fn broadcast_observation(state: &ServerState, origin: u64, snap: &GameSnapshot) {
    let seq = state.observation_seq.fetch_add(1, Ordering::Relaxed) + 1;
    let msg = create_state(seq, snap);

    let clients = state.clients.read().await;
    for c in clients
        .iter()
        .filter(|c| c.id != origin && c.handshaken && c.stream_observations)
    {
        let _ = c.tx.send(ClientOutbound::State(msg.clone()));
    }
}

/// Start the TCP server. Runs until the listener fails or the task is dropped.
pub async fn run_server(
    config: ServerConfig,
    game: GameHandle,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, "match-3 server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config, game));
    let mut client_id_counter = 0u64;

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: u64,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if let Err(e) = msg.encode(&mut buf) {
                warn!(error = %e, "failed to encode outbound message");
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let mut line = String::new();

    loop {
        line.clear();
        // A broken read still has to fall through to the cleanup below
        let bytes_read = match reader.read_line(&mut line).await {
            Ok(n) => n,
            Err(e) => {
                warn!(client_id, error = %e, "read failed; closing client");
                break;
            }
        };

        if bytes_read == 0 {
            // Client disconnected
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                // A repeated hello still obeys sequencing.
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, hello.seq).await
                {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }

                if !hello.protocol_version.starts_with("1.") {
                    let error = create_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                    }
                }
                debug!(
                    client_id,
                    name = %hello.client.name,
                    stream = hello.requested.stream_observations,
                    "handshake complete"
                );

                let (rows, cols) = state.game.dimensions().await;
                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id,
                    rows,
                    cols,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));
            }

            Ok(ParsedMessage::NewGame(msg)) => {
                if !admit(&state, client_id, msg.seq, &tx).await {
                    continue;
                }
                let snap = state.game.new_game().await;
                let _ = tx.send(ClientOutbound::State(create_state(msg.seq, &snap)));
                broadcast_observation(&state, client_id, &snap).await;
            }

            Ok(ParsedMessage::Move(msg)) => {
                if !admit(&state, client_id, msg.seq, &tx).await {
                    continue;
                }
                let (outcome, snap) = state.game.make_move(msg.from.into(), msg.to.into()).await;
                let result = create_move_result(msg.seq, &outcome, &snap);
                let _ = tx.send(ClientOutbound::MoveResult(result));
                if outcome.success {
                    broadcast_observation(&state, client_id, &snap).await;
                }
            }

            Ok(ParsedMessage::GetState(msg)) => {
                if !admit(&state, client_id, msg.seq, &tx).await {
                    continue;
                }
                let snap = state.game.snapshot().await;
                let _ = tx.send(ClientOutbound::State(create_state(msg.seq, &snap)));
            }

            Ok(ParsedMessage::Hint(msg)) => {
                if !admit(&state, client_id, msg.seq, &tx).await {
                    continue;
                }
                let hint = state.game.hint().await;
                let _ = tx.send(ClientOutbound::Hint(create_hint(msg.seq, hint)));
            }

            Ok(ParsedMessage::Unknown(msg)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, msg.seq).await
                {
                    let error = create_error(
                        msg.seq,
                        ErrorCode::InvalidCommand,
                        "seq must be strictly increasing",
                    );
                    let _ = tx.send(ClientOutbound::Error(error));
                    continue;
                }
                let error = create_error(msg.seq, ErrorCode::InvalidCommand, "Unknown message type");
                let _ = tx.send(ClientOutbound::Error(error));
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                let error = create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                let _ = tx.send(ClientOutbound::Error(error));
            }
        }
    }

    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
    }

    // Drain pending output, then stop the writer
    drop(tx);
    let _ = write_task.await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.protocol_version, PROTOCOL_VERSION);
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_server_config_from_env() {
        // This test just ensures it doesn't panic
        let _config = ServerConfig::from_env();
    }

    #[tokio::test]
    async fn test_seq_must_increase() {
        let state = ServerState::new(
            ServerConfig::default(),
            GameHandle::from_config(GameConfig {
                seed: Some(1),
                ..GameConfig::default()
            }),
        );
        let (tx, _rx) = mpsc::unbounded_channel();
        state.clients.write().await.push(ClientHandle {
            id: 1,
            addr: "127.0.0.1:1".parse().unwrap(),
            stream_observations: false,
            handshaken: true,
            last_seq: Some(1),
            tx,
        });

        assert!(check_and_update_seq(&state, 1, 2).await);
        assert!(!check_and_update_seq(&state, 1, 2).await);
        assert!(!check_and_update_seq(&state, 1, 1).await);
        assert!(check_and_update_seq(&state, 1, 10).await);
    }

    #[tokio::test]
    async fn test_admit_requires_handshake() {
        let state = ServerState::new(
            ServerConfig::default(),
            GameHandle::from_config(GameConfig {
                seed: Some(1),
                ..GameConfig::default()
            }),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.clients.write().await.push(ClientHandle {
            id: 1,
            addr: "127.0.0.1:1".parse().unwrap(),
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });

        assert!(!admit(&state, 1, 5, &tx).await);
        match rx.recv().await {
            Some(ClientOutbound::Error(e)) => {
                assert_eq!(e.code, ErrorCode::HandshakeRequired);
                assert_eq!(e.seq, 5);
            }
            other => panic!("expected handshake error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_removed_after_read_error() {
        let state = Arc::new(ServerState::new(
            ServerConfig::default(),
            GameHandle::from_config(GameConfig {
                seed: Some(1),
                ..GameConfig::default()
            }),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (socket, addr) = listener.accept().await.unwrap();

        // Invalid UTF-8 makes read_line fail
        client.write_all(b"\xff\xfe\n").await.unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            handle_client(socket, addr, 1, Arc::clone(&state)),
        )
        .await
        .expect("handler did not return");

        assert!(result.is_ok());
        assert!(state.clients.read().await.is_empty());
    }
}
