//! Warble production server.
//!
//! Serves the legacy AIM/ICQ OSCAR protocol over plain TCP on two endpoints:
//! the main (BOS) service carrying login, presence, messaging, buddy lists,
//! and room navigation, and the chat service carrying in-room traffic after
//! a cookie handoff.
//!
//! # Architecture
//!
//! [`warble_proto`] is the pure codec and [`warble_core`] the pure state
//! layer; this crate is the glue: TCP accept loops, per-connection reader and
//! writer tasks, the per-food-group services, and the dispatcher's routing
//! tables. [`ServerState`] wires every service to shared registries and the
//! configured stores; [`Server`] owns the listeners.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod presence;
pub mod services;
pub mod system_env;
pub mod transport;

use std::sync::Arc;

pub use config::Config;
pub use dispatcher::{MemoryServerState, ServerState};
pub use error::ServerError;
pub use presence::PresenceNotifier;
pub use system_env::SystemEnv;
use tokio::net::TcpListener;
use warble_core::{MemoryFeedbagStore, MemoryProfileStore, MemoryUserStore};

/// Production server: both listeners plus the shared state.
pub struct Server {
    state: Arc<MemoryServerState>,
    bos_listener: TcpListener,
    chat_listener: TcpListener,
}

impl Server {
    /// Bind both service endpoints.
    ///
    /// Listens on the configured ports on all interfaces; the hostname in
    /// the config is only what gets advertised to clients.
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let state = Arc::new(ServerState::new(
            SystemEnv::new(),
            config.clone(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryFeedbagStore::new()),
            Arc::new(MemoryProfileStore::new()),
        ));

        let bos_listener = TcpListener::bind(("0.0.0.0", config.bos_port)).await?;
        let chat_listener = TcpListener::bind(("0.0.0.0", config.chat_port)).await?;
        tracing::info!(
            bos = %config.bos_address(),
            chat = %config.chat_address(),
            "listeners bound"
        );

        Ok(Self { state, bos_listener, chat_listener })
    }

    /// Shared server state, for tests and tooling.
    #[must_use]
    pub fn state(&self) -> Arc<MemoryServerState> {
        Arc::clone(&self.state)
    }

    /// Local address of the main listener.
    pub fn bos_local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.bos_listener.local_addr()?)
    }

    /// Local address of the chat listener.
    pub fn chat_local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.chat_listener.local_addr()?)
    }

    /// Accept and serve connections on both endpoints until failure.
    pub async fn run(self) -> Result<(), ServerError> {
        let bos_state = Arc::clone(&self.state);
        let bos = tokio::spawn(accept_loop(self.bos_listener, bos_state, Endpoint::Bos));

        let chat_state = Arc::clone(&self.state);
        let chat = tokio::spawn(accept_loop(self.chat_listener, chat_state, Endpoint::Chat));

        // Both loops run forever; the first to fail takes the server down.
        tokio::select! {
            result = bos => result.unwrap_or(Ok(())),
            result = chat => result.unwrap_or(Ok(())),
        }
    }
}

#[derive(Clone, Copy)]
enum Endpoint {
    Bos,
    Chat,
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<MemoryServerState>,
    endpoint: Endpoint,
) -> Result<(), ServerError> {
    loop {
        let (stream, _) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            match endpoint {
                Endpoint::Bos => state.serve_bos_connection(stream).await,
                Endpoint::Chat => state.serve_chat_connection(stream).await,
            }
        });
    }
}
