//! Transport-agnostic request handling: lifecycle, size limits, auth, rate
//! limiting, concurrency admission and per-request timeout, wrapping
//! [`crate::protocol::dispatch`] (spec §4.C10).

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use astdb_domain::ports::query_server::{QueryRequestHandler, RequestEnvelope, ResponseEnvelope, ResponseError, ServerLifecycle};
use astdb_infrastructure::{QueryServerConfig, TransportType};

use crate::auth::check_bearer;
use crate::concurrency::ConcurrencyLimiter;
use crate::rate_limit::RateLimiter;

fn lifecycle_to_code(state: ServerLifecycle) -> u8 {
    match state {
        ServerLifecycle::Starting => 0,
        ServerLifecycle::Running => 1,
        ServerLifecycle::Draining => 2,
        ServerLifecycle::Stopped => 3,
        ServerLifecycle::Error => 4,
    }
}

fn code_to_lifecycle(code: u8) -> ServerLifecycle {
    match code {
        0 => ServerLifecycle::Starting,
        1 => ServerLifecycle::Running,
        2 => ServerLifecycle::Draining,
        3 => ServerLifecycle::Stopped,
        _ => ServerLifecycle::Error,
    }
}

fn error_response(id: String, code: &str, message: impl Into<String>) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        result: None,
        error: Some(ResponseError { code: code.to_string(), message: message.into(), data: None }),
    }
}

/// Owns the cross-cutting concerns shared by every transport: lifecycle
/// state, request admission, auth and rate limiting. Transports
/// (`transport::stdio`, `transport::http`) only frame bytes into
/// [`RequestEnvelope`]s and call [`QueryServer::handle_request`].
pub struct QueryServer {
    handler: Arc<dyn QueryRequestHandler>,
    config: QueryServerConfig,
    concurrency: ConcurrencyLimiter,
    rate_limiter: Option<RateLimiter>,
    lifecycle: Arc<AtomicU8>,
}

impl QueryServer {
    /// Build a server around `handler`. `lifecycle` is shared with whatever
    /// built `handler` so `index_status` reports the same state this server
    /// enforces requests against.
    #[must_use]
    pub fn new(handler: Arc<dyn QueryRequestHandler>, config: QueryServerConfig, lifecycle: Arc<AtomicU8>) -> Self {
        let rate_limiter = config
            .enable_rate_limit
            .then(|| RateLimiter::new(config.rate_limit_requests, config.rate_limit_window_secs));
        let concurrency = ConcurrencyLimiter::new(config.max_concurrent_requests, config.request_queue_size);
        Self { handler, config, concurrency, rate_limiter, lifecycle }
    }

    #[must_use]
    pub fn config(&self) -> &QueryServerConfig {
        &self.config
    }

    #[must_use]
    pub fn lifecycle(&self) -> ServerLifecycle {
        code_to_lifecycle(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn set_lifecycle(&self, state: ServerLifecycle) {
        self.lifecycle.store(lifecycle_to_code(state), Ordering::Release);
    }

    /// Handle one request: validates size, lifecycle, auth and rate limit,
    /// admits it under the concurrency cap, then dispatches with a
    /// per-request timeout. Never panics; always returns a valid envelope.
    pub async fn handle_request(
        &self,
        id: String,
        raw_len_bytes: usize,
        auth_header: Option<&str>,
        client_key: &str,
        request: RequestEnvelope,
    ) -> ResponseEnvelope {
        if raw_len_bytes > self.config.max_message_size_bytes {
            return error_response(id, "validation", "request exceeds the configured maximum message size");
        }

        match self.lifecycle() {
            ServerLifecycle::Running => {}
            ServerLifecycle::Starting => return error_response(id, "protocol", "server is still starting"),
            ServerLifecycle::Draining => return error_response(id, "protocol", "server is draining, no longer accepting requests"),
            ServerLifecycle::Stopped | ServerLifecycle::Error => {
                return error_response(id, "protocol", "server is not running");
            }
        }

        if self.config.enable_auth && !check_bearer(auth_header, self.config.auth_token.as_deref()) {
            return error_response(id, "unauthorized", "missing or invalid bearer token");
        }

        if let Some(limiter) = &self.rate_limiter {
            if !limiter.check(client_key) {
                return error_response(id, "rate_limited", "too many requests, slow down");
            }
        }

        let Some(admission) = self.concurrency.admit().await else {
            return error_response(id, "overloaded", "too many concurrent requests");
        };

        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let handler = Arc::clone(&self.handler);
        let dispatched = tokio::time::timeout(timeout, crate::protocol::dispatch(handler.as_ref(), request)).await;
        drop(admission);

        match dispatched {
            Ok(response) => response,
            Err(_) => error_response(id, "timeout", "request exceeded its deadline"),
        }
    }
}

/// Transition to `running` and serve on whichever transport the config
/// names, transitioning to `stopped` when the listener exits.
pub async fn run(server: Arc<QueryServer>) -> std::io::Result<()> {
    server.set_lifecycle(ServerLifecycle::Running);

    let result = match server.config().transport {
        TransportType::Stdio => crate::transport::stdio::serve(Arc::clone(&server)).await,
        TransportType::Http => {
            let addr = format!("{}:{}", server.config().host, server.config().port)
                .parse()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
            crate::transport::http::serve(addr, Arc::clone(&server)).await
        }
        TransportType::Websocket => {
            let addr = format!("{}:{}", server.config().host, server.config().port)
                .parse()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
            crate::transport::websocket::serve(addr, Arc::clone(&server)).await
        }
    };

    server.set_lifecycle(ServerLifecycle::Stopped);
    result
}
