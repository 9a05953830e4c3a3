//! `DicehallServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry → rooms.

use std::sync::Arc;

use dicehall_protocol::{Codec, JsonCodec};
use dicehall_room::RoomRegistry;
use dicehall_round::PhaseDelays;
use dicehall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::DicehallError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// The registry only maps room codes to actor handles — all game state
/// lives inside the room actors, so this lock is held briefly.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Dicehall server.
///
/// # Example
///
/// ```rust,ignore
/// let server = DicehallServer::builder()
///     .bind("0.0.0.0:9000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DicehallServerBuilder {
    bind_addr: String,
    delays: PhaseDelays,
}

impl DicehallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            delays: PhaseDelays::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the round pacing. Tests shrink these to milliseconds.
    pub fn delays(mut self, delays: PhaseDelays) -> Self {
        self.delays = delays;
        self
    }

    /// Binds the transport and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(
        self,
    ) -> Result<DicehallServer<JsonCodec>, DicehallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.delays)),
            codec: JsonCodec,
        });

        Ok(DicehallServer { transport, state })
    }
}

impl Default for DicehallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Dicehall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DicehallServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C> DicehallServer<C>
where
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> DicehallServerBuilder {
        DicehallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// One connection's failure never touches another's: handler errors
    /// are logged and the task ends.
    pub async fn run(mut self) -> Result<(), DicehallError> {
        tracing::info!("Dicehall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
