//! CipherLink Relay Gateway
//!
//! Binds the relay core to a WebSocket listener. Each connection gets its
//! own task and an explicit context; frames are JSON event records decoded
//! at the boundary, and everything the relay pushes for a connection flows
//! through that connection's channel in order.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cipherlink_core::ClientEvent;
use cipherlink_relay::{ConnectionContext, ConnectionHandle, DrainMode, RelayConfig, Router};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "relay-gateway-service")]
#[command(about = "CipherLink WebSocket relay gateway")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8086")]
    port: u16,

    /// Clear a mailbox when its owner fetches it
    #[arg(long)]
    consume_on_read: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RelayConfig {
        drain_mode: if args.consume_on_read {
            DrainMode::Consume
        } else {
            DrainMode::Snapshot
        },
    };
    let router = Arc::new(Router::new(config));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Relay gateway listening on {}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        let router = Arc::clone(&router);
        tokio::spawn(async move {
            handle_connection(stream, peer, router).await;
        });
    }
}

/// Drive one WebSocket connection against the shared router
async fn handle_connection(stream: TcpStream, peer: SocketAddr, router: Arc<Router>) {
    info!("New connection from {}", peer);

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", peer, e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let (handle, mut outbound_rx) = ConnectionHandle::channel();
    let mut ctx = ConnectionContext::new(handle);

    loop {
        tokio::select! {
            // Relay pushes for this connection: replies and broadcasts alike
            outbound = outbound_rx.recv() => {
                let Some(event) = outbound else { break };
                match event.to_json() {
                    Ok(frame) => {
                        if write.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode event for {}: {}", peer, e),
                }
            }

            // Inbound frames from the client
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(frame))) => {
                        match ClientEvent::from_json(&frame) {
                            Ok(event) => router.handle_event(&mut ctx, event),
                            Err(e) => warn!("Dropping malformed frame from {}: {}", peer, e),
                        }
                    }

                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }

                    Some(Ok(Message::Close(_))) | None => break,

                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", peer, e);
                        break;
                    }

                    _ => {}
                }
            }
        }
    }

    router.disconnect(&mut ctx);
    let stats = router.mailbox().stats();
    info!(
        online = router.registry().online_count(),
        stored = stats.envelopes,
        "Connection {} closed",
        peer
    );
}
