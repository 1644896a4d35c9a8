//! Room-based chat relay server library.
//!
//! Clients join named, password-gated rooms over WebSocket, exchange chat
//! events and receive membership change notifications. The room/session
//! registry lives in `usecase` on top of the stores in `infrastructure`.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
