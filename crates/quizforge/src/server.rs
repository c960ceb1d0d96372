//! `QuizServer` builder and server loop.
//!
//! This is the entry point for running a Quizforge server. It ties the
//! layers together: transport → protocol → room registry → room actors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use quizforge_protocol::{Codec, JsonCodec};
use quizforge_room::{RoomConfig, RoomRegistry};
use quizforge_session::QuestionBank;
use quizforge_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::handler::handle_connection;
use crate::status;
use crate::{QuizforgeError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) started: Instant,
}

/// Builder for configuring and starting a Quizforge server.
///
/// # Example
///
/// ```rust,ignore
/// use quizforge::prelude::*;
///
/// let server = QuizServer::builder()
///     .bind("0.0.0.0:3000")
///     .question_bank("questions.json")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct QuizServerBuilder {
    config: ServerConfig,
    bank: Option<QuestionBank>,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            bank: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-room configuration.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Loads questions from this JSON file at build time.
    pub fn question_bank(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.question_bank = Some(path.into());
        self
    }

    /// Uses an already-built bank, ignoring any configured file.
    pub fn questions(mut self, bank: QuestionBank) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Also serves `GET /` and `GET /health` over plain HTTP on `addr`.
    pub fn status_bind(mut self, addr: &str) -> Self {
        self.config.status_bind = Some(addr.to_string());
        self
    }

    /// Loads the question bank and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<QuizServer<JsonCodec>, QuizforgeError> {
        let bank = match (self.bank, &self.config.question_bank) {
            (Some(bank), _) => bank,
            (None, Some(path)) => QuestionBank::load(path)?,
            (None, None) => QuestionBank::builtin()?,
        };
        tracing::info!(questions = bank.len(), "question bank ready");

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let status = match &self.config.status_bind {
            Some(addr) => {
                let listener = TcpListener::bind(addr).await?;
                tracing::info!(addr = ?listener.local_addr().ok(), "status endpoint listening");
                Some(listener)
            }
            None => None,
        };

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(self.config.room.clone(), Arc::new(bank)),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
            started: Instant::now(),
        });

        Ok(QuizServer {
            transport,
            status,
            state,
            sweep_interval: self.config.sweep_interval,
        })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quizforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizServer<C: Codec> {
    transport: WebSocketTransport,
    status: Option<TcpListener>,
    state: Arc<ServerState<C>>,
    sweep_interval: Duration,
}

impl QuizServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }
}

impl<C: Codec> QuizServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Address of the HTTP status listener, if one was configured.
    pub fn status_addr(&self) -> Option<std::net::SocketAddr> {
        self.status.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Runs the accept loop, with the periodic empty-room sweep and the
    /// status endpoint beside it.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), QuizforgeError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            "Quizforge server running"
        );

        let sweeper = tokio::spawn(sweep_loop(Arc::clone(&self.state), self.sweep_interval));
        let status = self
            .status
            .take()
            .map(|listener| tokio::spawn(status::serve(listener, Arc::clone(&self.state))));

        let result = loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(quizforge_transport::TransportError::Shutdown) => break Ok(()),
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        };

        sweeper.abort();
        if let Some(status) = status {
            status.abort();
        }
        result
    }
}

async fn sweep_loop<C: Codec>(state: Arc<ServerState<C>>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        interval.tick().await;
        let removed = state.registry.sweep_empty().await;
        if removed > 0 {
            tracing::info!(removed, rooms = state.registry.room_count(), "swept empty rooms");
        }
    }
}
