//! HTTP/1.1 host for a middleware [`Pipeline`].
//!
//! Every request gets a fresh [`MiddlewareContext`] and [`ResponseWriter`];
//! the pipeline and handler run against them and the writer becomes the
//! HTTP response. An error returned up the chain becomes a JSON error body
//! unless the writer was already committed; either way the headers the
//! chain set are kept. `GET /health` is answered before the pipeline runs.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use heron_config::ServerConfig;
use heron_core::{ResponseBody, ResponseHandle};
use heron_middleware::{
    json_error, FnHandler, Handler, HttpResponse, MiddlewareContext, Pipeline, Request,
    ResponseWriter,
};
use heron_telemetry::{record_request, InFlightGuard};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be parsed.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Hosts a pipeline and a terminal handler.
///
/// # Example
///
/// ```rust,ignore
/// use heron_middleware::{FnHandler, Pipeline};
/// use heron_middleware::stages::ResponseHeadersMiddleware;
/// use heron_server::Server;
///
/// let server = Server::builder()
///     .http_addr("127.0.0.1:8080")
///     .pipeline(
///         Pipeline::builder()
///             .stage(ResponseHeadersMiddleware::from_params([("x-frame-options", "DENY")]))
///             .build(),
///     )
///     .handler(FnHandler::new(|_ctx, _req, response| {
///         response.write_text("hello")?;
///         Ok(())
///     }))
///     .build();
///
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    pipeline: Arc<Pipeline>,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the pipeline every request runs through.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits for open connections to drain.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                addr = %addr,
                stages = ?self.pipeline.stage_names(),
                "Server listening"
            );
        }

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(remote_addr = %remote_addr, error = %e, "Connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = Duration::from_secs(server.config.shutdown_timeout_secs);
        tracing::info!(
            timeout = ?timeout,
            active = tracker.active_connections(),
            "Waiting for connections to close"
        );

        tokio::select! {
            () = tracker.drained() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "Shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("Server stopped");
    }

    fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.config
            .http_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
                addr: self.config.http_addr.clone(),
                reason: e.to_string(),
            })
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote_addr = %remote_addr, "Closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles one request with any body type.
    ///
    /// This is the whole per-request path, minus the connection, and can
    /// be driven directly in tests.
    pub async fn handle<B>(&self, req: http::Request<B>) -> HttpResponse
    where
        B: hyper::body::Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let _in_flight = InFlightGuard::new();
        let mut ctx = MiddlewareContext::new();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = if method == Method::GET && path == "/health" {
            health_response()
        } else {
            self.dispatch(&mut ctx, req).await
        };

        let elapsed = ctx.elapsed();
        record_request(response.status().as_u16(), elapsed);
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed = ?elapsed,
            "Request completed"
        );

        response
    }

    async fn dispatch<B>(&self, ctx: &mut MiddlewareContext, req: http::Request<B>) -> HttpResponse
    where
        B: hyper::body::Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let timeout = Duration::from_millis(self.config.request_timeout_ms);
        let (parts, body) = req.into_parts();

        let body = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(request_id = %ctx.request_id(), error = %e, "Failed to read request body");
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "BODY_READ_ERROR",
                    &format!("Failed to read request body: {e}"),
                );
            }
            Err(_) => {
                tracing::warn!(request_id = %ctx.request_id(), "Request body read timed out");
                return json_error(
                    StatusCode::REQUEST_TIMEOUT,
                    "REQUEST_TIMEOUT",
                    "Request body read timed out",
                );
            }
        };

        let request = Request::from_parts(parts, Full::new(body));
        let mut writer = ResponseWriter::new();

        match self
            .pipeline
            .process(ctx, request, self.handler.as_ref(), &mut writer)
            .await
        {
            Ok(()) => writer.into_response(),
            Err(err) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    code = err.code(),
                    error = %err,
                    committed = writer.is_committed(),
                    "Request failed"
                );
                writer.into_error_response(&err)
            }
        }
    }
}

fn health_response() -> HttpResponse {
    let body = serde_json::json!({ "status": "ok" }).to_string();
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config: ServerConfig,
    pipeline: Pipeline,
    handler: Arc<dyn Handler>,
}

impl ServerBuilder {
    /// Creates a builder with default config, an empty pipeline and a
    /// handler that answers `404 Not Found`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            pipeline: Pipeline::default(),
            handler: Arc::new(FnHandler::new(|_ctx, _req, response| {
                response.set_status(StatusCode::NOT_FOUND)?;
                Ok(())
            })),
        }
    }

    /// Replaces the whole server config section.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the listen address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets how long reading a request body may take.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the middleware pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Sets the terminal handler.
    #[must_use]
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            config: self.config,
            pipeline: Arc::new(self.pipeline),
            handler: self.handler,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
