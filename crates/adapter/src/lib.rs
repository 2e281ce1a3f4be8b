//! Adapter module - the match-3 engine over a TCP socket with a JSON protocol
//!
//! This module lets external clients (bots, UIs, test harnesses) play the
//! single live game through a TCP socket connection.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:8081)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Requests**: `new_game`, `move`, `get_state` and `hint`, each answered
//!    on the same connection with the request's `seq`
//! 4. **Observation Streaming**: clients that asked for it receive a `state`
//!    line whenever another client deals a new game or lands a move
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **new_game**: Deal a fresh board, resetting score and moves
//! - **move**: Swap two tiles given as `[row, col]`
//! - **get_state**: Read the current board, score and move count
//! - **hint**: Ask for a legal swap
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with board dimensions and palette
//! - **state**: Board, score, moves, game id and state hash
//! - **move_result**: Whether the swap was legal, every match and each cascade round
//! - **hint**: A legal swap, or nulls when none exists
//! - **error**: Protocol errors (`handshake_required`, `protocol_mismatch`,
//!   `invalid_command`)
//!
//! An illegal swap is a `move_result` with `success: false`, never an `error`.
//!
//! # Environment Variables
//!
//! - `MATCH3_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_PORT`: Port number (default: 8081)
//! - `MATCH3_ROWS` / `MATCH3_COLS`: Board size (default: 8x8)
//! - `MATCH3_SEED`: Fixed seed for reproducible sessions
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"bot","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":false}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"game":"match3",...}
//! Client -> Server: {"type":"move","seq":2,"ts":1234567891,"from":[0,2],"to":[1,2]}
//! Server -> Client: {"type":"move_result","seq":2,"ts":1234567891,"success":true,"matches":[[0,0],[0,1],[0,2]],...}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 8081
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"nc","version":"0"},"protocol_version":"1.0.0"}
//! {"type":"get_state","seq":2,"ts":0}
//! ```

pub mod handle;
pub mod protocol;
pub mod server;

pub use match3_core as core;
pub use match3_types as types;

// Re-export protocol types for convenience
pub use handle::GameHandle;
pub use protocol::*;
pub use server::*;
