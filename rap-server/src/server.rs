//! Background server worker.

use crate::error::ServerError;
use crate::handler::CommandHandler;
use rap_core::RegisterTarget;
use rap_protocol::{Codec, Profile};
use rap_transport::{CancelToken, Transport, TransportError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What the worker does with a message that does not decode as a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log and count the message, then keep listening.
    #[default]
    Drop,
    /// Stop the worker with the decode error.
    Terminate,
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(MalformedPolicy::Drop),
            "terminate" => Ok(MalformedPolicy::Terminate),
            other => Err(format!("unknown malformed policy '{}'", other)),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub on_malformed: MalformedPolicy,
    /// Name of the worker thread.
    pub thread_name: String,
    /// Receive timeout applied to the transport at start. `None` keeps the
    /// transport's own setting.
    pub recv_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            on_malformed: MalformedPolicy::Drop,
            thread_name: "rap-server".to_string(),
            recv_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }
}

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub commands_total: AtomicU64,
    pub naks_total: AtomicU64,
    pub malformed_total: AtomicU64,
}

/// A register server running on its own thread.
///
/// The worker owns the transport. It stops when cancelled, when the
/// transport closes, or on a fatal error. Dropping the server cancels and
/// joins the worker.
pub struct Server {
    cancel: CancelToken,
    stats: Arc<ServerStats>,
    worker: Option<JoinHandle<Result<(), ServerError>>>,
}

impl Server {
    /// Spawns the worker serving `target` over `transport`.
    pub fn start<T>(
        mut transport: Box<dyn Transport>,
        target: Arc<T>,
        profile: Profile,
        config: ServerConfig,
    ) -> Result<Self, ServerError>
    where
        T: RegisterTarget + 'static,
    {
        let codec = Codec::new(profile, transport.max_message_size())?;
        if let Some(timeout) = config.recv_timeout {
            transport.set_timeout(Some(timeout))?;
        }

        let stats = Arc::new(ServerStats::default());
        let cancel = CancelToken::new();
        let worker = Worker {
            transport,
            handler: CommandHandler::with_stats(target, codec, stats.clone()),
            cancel: cancel.clone(),
            policy: config.on_malformed,
        };

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())?;
        info!(
            thread = %config.thread_name,
            on_malformed = ?config.on_malformed,
            "server started"
        );

        Ok(Self {
            cancel,
            stats,
            worker: Some(handle),
        })
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// A token that stops the worker when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Signals the worker to stop. A receive in progress returns promptly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Waits for the worker to exit and returns how it ended.
    pub fn join(mut self) -> Result<(), ServerError> {
        self.join_worker()
    }

    fn join_worker(&mut self) -> Result<(), ServerError> {
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| ServerError::WorkerPanicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
            if let Err(e) = self.join_worker() {
                warn!(error = %e, "server worker ended with error");
            }
        }
    }
}

struct Worker<T: RegisterTarget> {
    transport: Box<dyn Transport>,
    handler: CommandHandler<T>,
    cancel: CancelToken,
    policy: MalformedPolicy,
}

impl<T: RegisterTarget> Worker<T> {
    fn run(mut self) -> Result<(), ServerError> {
        let result = self.serve();
        match &result {
            Ok(()) => info!("server stopped"),
            Err(e) => error!(error = %e, "server stopped with error"),
        }
        result
    }

    fn serve(&mut self) -> Result<(), ServerError> {
        loop {
            let message = match self.transport.recv_cancellable(&self.cancel) {
                Ok(Some(message)) => message,
                Ok(None) => {
                    debug!("server cancelled");
                    return Ok(());
                }
                Err(TransportError::Timeout) => continue,
                Err(TransportError::Closed) => {
                    debug!("transport closed");
                    return Ok(());
                }
                Err(e @ TransportError::Oversized { .. }) => {
                    self.malformed(e.into())?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let command = match self.handler.codec().decode_command(&message) {
                Ok(command) => command,
                Err(e) => {
                    self.malformed(e.into())?;
                    continue;
                }
            };

            let frame = self.handler.respond(&command)?;
            if let Err(e) = self.transport.send(&frame) {
                warn!(txn = command.txn(), error = %e, "failed to send response");
            }
        }
    }

    /// Applies the malformed-message policy. `Err` ends the worker.
    fn malformed(&self, err: ServerError) -> Result<(), ServerError> {
        self.handler
            .stats()
            .malformed_total
            .fetch_add(1, Ordering::Relaxed);
        match self.policy {
            MalformedPolicy::Drop => {
                warn!(error = %err, "dropping malformed command");
                Ok(())
            }
            MalformedPolicy::Terminate => Err(err),
        }
    }
}
