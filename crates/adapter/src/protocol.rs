//! Protocol module - JSON message types for the match-3 server
//!
//! Implements the line-delimited JSON protocol. All messages have: type, seq
//! (sequence number), ts (timestamp in ms). Boards travel as rows of
//! lowercase color names, positions as `[row, col]` arrays.

use serde::{Deserialize, Serialize};

use crate::core::{BoardSnapshot, ChainStep, GameSnapshot, MoveOutcome};
use crate::types::{Color, Position, PALETTE};

/// Protocol version spoken by this server. Clients must share the major version.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Name of the game served over this protocol, sent in `welcome`
pub const GAME_NAME: &str = "match3";

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelloType {
    #[default]
    #[serde(rename = "hello")]
    Hello,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewGameType {
    #[default]
    #[serde(rename = "new_game")]
    NewGame,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveType {
    #[default]
    #[serde(rename = "move")]
    Move,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GetStateType {
    #[default]
    #[serde(rename = "get_state")]
    GetState,
}

/// Shared by the `hint` request and its reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintType {
    #[default]
    #[serde(rename = "hint")]
    Hint,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    /// Receive a `state` line whenever another client changes the game
    #[serde(default)]
    pub stream_observations: bool,
}

/// Deal a fresh board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: NewGameType,
    pub seq: u64,
    pub ts: u64,
}

/// Swap two tiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: MoveType,
    pub seq: u64,
    pub ts: u64,
    pub from: WirePosition,
    pub to: WirePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStateMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: GetStateType,
    pub seq: u64,
    pub ts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintRequest {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HintType,
    pub seq: u64,
    pub ts: u64,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[default]
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    #[default]
    #[serde(rename = "state")]
    State,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveResultType {
    #[default]
    #[serde(rename = "move_result")]
    MoveResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[default]
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    /// Game type; distinct from the per-board `game_id` counter in `state`
    pub game: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub rows: usize,
    pub cols: usize,
    /// Palette in refill order
    pub colors: Vec<ColorName>,
}

/// Current game state; reply to `new_game`/`get_state` and the streamed observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMessage {
    #[serde(rename = "type")]
    pub msg_type: StateType,
    pub seq: u64,
    pub ts: u64,
    pub state: StatePayload,
}

/// Outcome of a `move`. Rejected swaps carry `success: false` and empty payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveResultMessage {
    #[serde(rename = "type")]
    pub msg_type: MoveResultType,
    pub seq: u64,
    pub ts: u64,
    pub success: bool,
    pub matches: Vec<WirePosition>,
    pub board_after_swap: Option<WireBoard>,
    pub chain_steps: Vec<ChainStepPayload>,
    pub state: StatePayload,
}

/// Suggested swap; both ends null when the board has no legal move
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintMessage {
    #[serde(rename = "type")]
    pub msg_type: HintType,
    pub seq: u64,
    pub ts: u64,
    pub from: Option<WirePosition>,
    pub to: Option<WirePosition>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

// ============== Payloads ==============

/// Rows of color names, top row first
pub type WireBoard = Vec<Vec<ColorName>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePayload {
    pub board: WireBoard,
    pub score: u64,
    pub moves: u32,
    pub game_id: u32,
    pub state_hash: StateHash,
}

impl From<&GameSnapshot> for StatePayload {
    fn from(snap: &GameSnapshot) -> Self {
        Self {
            board: wire_board(&snap.board),
            score: snap.score,
            moves: snap.moves,
            game_id: snap.game_id,
            state_hash: StateHash(snap.state_hash),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStepPayload {
    pub matches: Vec<WirePosition>,
    pub board_before: WireBoard,
    pub board_after: WireBoard,
}

impl From<&ChainStep> for ChainStepPayload {
    fn from(step: &ChainStep) -> Self {
        Self {
            matches: step.matches.iter().map(|&p| p.into()).collect(),
            board_before: wire_board(&step.board_before),
            board_after: wire_board(&step.board_after),
        }
    }
}

pub fn wire_board(board: &BoardSnapshot) -> WireBoard {
    board
        .rows
        .iter()
        .map(|row| row.iter().map(|&c| c.into()).collect())
        .collect()
}

/// `[row, col]` on the wire. Any JSON integer in i64 range parses; values
/// outside the board are rejected by the engine, not by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WirePosition(pub i64, pub i64);

impl From<Position> for WirePosition {
    fn from(p: Position) -> Self {
        Self(i64::from(p.row), i64::from(p.col))
    }
}

/// Coordinates beyond i32 saturate; they stay off-board either way.
impl From<WirePosition> for Position {
    fn from(p: WirePosition) -> Self {
        Position::new(saturate(p.0), saturate(p.1))
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorName {
    #[serde(rename = "red")]
    Red,
    #[serde(rename = "blue")]
    Blue,
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "yellow")]
    Yellow,
    #[serde(rename = "purple")]
    Purple,
    #[serde(rename = "orange")]
    Orange,
}

impl From<Color> for ColorName {
    fn from(value: Color) -> Self {
        match value {
            Color::Red => ColorName::Red,
            Color::Blue => ColorName::Blue,
            Color::Green => ColorName::Green,
            Color::Yellow => ColorName::Yellow,
            Color::Purple => ColorName::Purple,
            Color::Orange => ColorName::Orange,
        }
    }
}

impl From<ColorName> for Color {
    fn from(value: ColorName) -> Self {
        match value {
            ColorName::Red => Color::Red,
            ColorName::Blue => Color::Blue,
            ColorName::Green => Color::Green,
            ColorName::Yellow => Color::Yellow,
            ColorName::Purple => Color::Purple,
            ColorName::Orange => Color::Orange,
        }
    }
}

/// Deterministic state hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        match std::str::from_utf8(&buf) {
            Ok(s) => serializer.serialize_str(s),
            Err(e) => Err(serde::ser::Error::custom(e)),
        }
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

const INBOUND_TYPES: [&str; 5] = ["hello", "new_game", "move", "get_state", "hint"];

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "new_game")]
        NewGame(NewGameMessage),
        #[serde(rename = "move")]
        Move(MoveMessage),
        #[serde(rename = "get_state")]
        GetState(GetStateMessage),
        #[serde(rename = "hint")]
        Hint(HintRequest),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::NewGame(m)) => Ok(ParsedMessage::NewGame(m)),
        Ok(InboundMessage::Move(m)) => Ok(ParsedMessage::Move(m)),
        Ok(InboundMessage::GetState(m)) => Ok(ParsedMessage::GetState(m)),
        Ok(InboundMessage::Hint(m)) => Ok(ParsedMessage::Hint(m)),
        Err(e) => {
            // A well-formed object with an unrecognized type is not a parse error.
            #[derive(Debug, Deserialize)]
            struct Envelope {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            let known = envelope
                .msg_type
                .as_deref()
                .is_some_and(|t| INBOUND_TYPES.contains(&t));
            if !known {
                return Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    NewGame(NewGameMessage),
    Move(MoveMessage),
    GetState(GetStateMessage),
    Hint(HintRequest),
    Unknown(UnknownMessage),
}

impl ParsedMessage {
    pub fn seq(&self) -> u64 {
        match self {
            ParsedMessage::Hello(m) => m.seq,
            ParsedMessage::NewGame(m) => m.seq,
            ParsedMessage::Move(m) => m.seq,
            ParsedMessage::GetState(m) => m.seq,
            ParsedMessage::Hint(m) => m.seq,
            ParsedMessage::Unknown(m) => m.seq,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Pull `"seq": <digits>` out of a line that failed to parse
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(
    seq: u64,
    client_name: &str,
    protocol_version: &str,
    stream_observations: bool,
) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_observations,
        },
    }
}

pub fn create_new_game(seq: u64) -> NewGameMessage {
    NewGameMessage {
        msg_type: NewGameType::NewGame,
        seq,
        ts: current_timestamp_ms(),
    }
}

pub fn create_move(seq: u64, from: Position, to: Position) -> MoveMessage {
    MoveMessage {
        msg_type: MoveType::Move,
        seq,
        ts: current_timestamp_ms(),
        from: from.into(),
        to: to.into(),
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    rows: usize,
    cols: usize,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        game: GAME_NAME.to_string(),
        capabilities: ServerCapabilities {
            rows,
            cols,
            colors: PALETTE.iter().map(|&c| c.into()).collect(),
        },
    }
}

pub fn create_state(seq: u64, snap: &GameSnapshot) -> StateMessage {
    StateMessage {
        msg_type: StateType::State,
        seq,
        ts: current_timestamp_ms(),
        state: snap.into(),
    }
}

/// Create a move result; `snap` is the state after the move was resolved
pub fn create_move_result(seq: u64, outcome: &MoveOutcome, snap: &GameSnapshot) -> MoveResultMessage {
    MoveResultMessage {
        msg_type: MoveResultType::MoveResult,
        seq,
        ts: current_timestamp_ms(),
        success: outcome.success,
        matches: outcome.matches.iter().map(|&p| p.into()).collect(),
        board_after_swap: outcome.board_after_swap.as_ref().map(wire_board),
        chain_steps: outcome.chain_steps.iter().map(ChainStepPayload::from).collect(),
        state: snap.into(),
    }
}

pub fn create_hint(seq: u64, hint: Option<(Position, Position)>) -> HintMessage {
    HintMessage {
        msg_type: HintType::Hint,
        seq,
        ts: current_timestamp_ms(),
        from: hint.map(|(from, _)| from.into()),
        to: hint.map(|(_, to)| to.into()),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
