//! メッセージ配信の実装
//!
//! ## 概要
//!
//! このモジュールは `MessagePublisher` trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `websocket`: トピック購読を管理し WebSocket へ配信する実装

pub mod websocket;

pub use websocket::{PusherChannel, WebSocketPublisher};
