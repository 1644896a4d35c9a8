//! Room-based WebSocket chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relay-server
//! cargo run --bin relay-server -- --host 0.0.0.0 --port 3000 --log-level info
//! ```

use std::sync::Arc;

use clap::Parser;
use relay_server::{
    infrastructure::{
        message_publisher::WebSocketPublisher,
        repository::{InMemoryConnectionContextStore, InMemoryRoomStore, InMemorySessionTracker},
    },
    ui::Server,
    usecase::{MessageRouter, PresenceCoordinator},
};
use relay_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "relay-server")]
#[command(about = "Room-based WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Stores
    // 2. Publisher
    // 3. UseCases
    // 4. Server

    // 1. Create stores (the public room exists for the lifetime of the process)
    let rooms = Arc::new(InMemoryRoomStore::with_public_lounge());
    let sessions = Arc::new(InMemorySessionTracker::new());
    let contexts = Arc::new(InMemoryConnectionContextStore::new());

    // 2. Create publisher (WebSocket implementation)
    let publisher = Arc::new(WebSocketPublisher::new());

    // 3. Create UseCases
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let presence = Arc::new(PresenceCoordinator::new(
        rooms.clone(),
        sessions,
        contexts,
        publisher.clone(),
        clock.clone(),
    ));
    let message_router = Arc::new(MessageRouter::new(rooms.clone(), publisher.clone(), clock));

    // 4. Create and run the server
    let server = Server::new(presence, message_router, publisher, rooms);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
