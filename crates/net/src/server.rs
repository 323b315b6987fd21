//! Relay server: accept loop and lifecycle handle
//!
//! Binds the listening socket, admits connections through the registry,
//! and spawns one session task per client. The returned handle exposes
//! the bound address, read-only registry snapshots, and a graceful
//! shutdown that disconnects every client.

use std::net::SocketAddr;
use std::sync::Arc;

use pewter_core::{ClientInfo, RelayHooks, ServerConfig};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::registry::Registry;
use crate::session::{handle_connection, SharedRegistry};

/// A running relay server.
pub struct RelayServer {
    addr: SocketAddr,
    registry: SharedRegistry,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    /// Bind the configured address and start accepting connections.
    pub async fn listen(config: ServerConfig, hooks: impl RelayHooks + 'static) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        info!(addr = %addr, "Relay server started");

        let registry: SharedRegistry = Arc::new(RwLock::new(Registry::new(Arc::new(hooks))));
        let config = Arc::new(config);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(accept_loop(
            listener,
            registry.clone(),
            config,
            shutdown_rx,
        ));

        Ok(Self {
            addr,
            registry,
            shutdown_tx,
        })
    }

    /// The bound address; binding port 0 yields the real port here.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of connected (or still handshaking) clients.
    pub async fn client_count(&self) -> usize {
        self.registry.read().await.client_count()
    }

    /// Names of the live rooms.
    pub async fn rooms(&self) -> Vec<String> {
        self.registry.read().await.room_names()
    }

    /// Members of a room, in join order, if the room exists.
    pub async fn room_members(&self, name: &str) -> Option<Vec<ClientInfo>> {
        self.registry.read().await.room_members(name)
    }

    /// Stop accepting and disconnect every client.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let mut reg = self.registry.write().await;
        for id in reg.client_ids() {
            reg.disconnect(id, "Server shutting down");
        }
        info!("Relay server shut down");
    }
}

/// Accept incoming connections until shutdown.
async fn accept_loop(
    listener: TcpListener,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    debug!(addr = %addr, "new connection");
                    tokio::spawn(handle_connection(
                        stream,
                        registry.clone(),
                        config.clone(),
                    ));
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            },
            _ = shutdown_rx.recv() => {
                info!("accept loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pewter_core::NoHooks;

    fn loopback_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let server = RelayServer::listen(loopback_config(), NoHooks)
            .await
            .unwrap();
        assert!(server.addr().port() > 0);
        assert_eq!(server.client_count().await, 0);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let server = RelayServer::listen(loopback_config(), NoHooks)
            .await
            .unwrap();
        server.shutdown().await;
        server.shutdown().await;
    }
}
