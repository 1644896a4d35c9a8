//! Infrastructure layer: in-memory stores, the WebSocket topic broker and
//! wire DTOs.

pub mod dto;
pub mod message_publisher;
pub mod repository;
