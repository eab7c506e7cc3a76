//! Response header injection stage.
//!
//! Applies a fixed [`HeaderSpec`] to every response passing through the
//! chain, either before the downstream stages run or after they return.
//!
//! ## Buffering
//!
//! A [`ResponseWriter`](crate::ResponseWriter) commits as soon as the
//! handler writes body bytes, after which no header can be added. When the
//! spec applies headers after downstream, that would always fail, so by
//! default the stage hands downstream a [`BufferedResponse`] and only
//! releases the body once the post phase is done. Hosts whose responses
//! never commit early can opt out with
//! [`ResponseHeadersMiddleware::without_buffering`].
//!
//! ## Example
//!
//! ```
//! use heron_middleware::stages::ResponseHeadersMiddleware;
//! use heron_middleware::Middleware;
//!
//! let stage = ResponseHeadersMiddleware::from_params([
//!     ("setHeadersAfterServlet", "true"),
//!     ("appendValues", "true"),
//!     ("cache-control", "no-store"),
//! ]);
//!
//! assert_eq!(stage.name(), "response_headers");
//! assert!(stage.spec().apply_after_downstream());
//! ```

use std::sync::Arc;

use heron_core::{ApplyObserver, BufferedResponse, HeaderApplicator, HeaderSpec, ResponseHandle};

use crate::context::MiddlewareContext;
use crate::error::MiddlewareResult;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::Request;

/// Middleware that writes configured headers into every response.
#[derive(Debug, Clone)]
pub struct ResponseHeadersMiddleware {
    applicator: HeaderApplicator,
    buffered: bool,
}

impl ResponseHeadersMiddleware {
    /// Creates the stage for a shared spec, with buffering enabled.
    pub fn new(spec: impl Into<Arc<HeaderSpec>>) -> Self {
        Self {
            applicator: HeaderApplicator::new(spec),
            buffered: true,
        }
    }

    /// Parses filter parameters and creates the stage.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::new(HeaderSpec::from_params(params))
    }

    /// Reports header activity to `observer` instead of `tracing`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ApplyObserver>) -> Self {
        self.applicator = self.applicator.with_observer(observer);
        self
    }

    /// Passes the live response downstream without buffering the body.
    #[must_use]
    pub fn without_buffering(mut self) -> Self {
        self.buffered = false;
        self
    }

    /// Returns the spec being applied.
    #[must_use]
    pub fn spec(&self) -> &HeaderSpec {
        self.applicator.spec()
    }

    /// Returns `true` if downstream writes are buffered.
    #[must_use]
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    async fn process_unbuffered(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        response: &mut dyn ResponseHandle,
        next: Next<'_>,
    ) -> MiddlewareResult {
        self.applicator.before_downstream(&mut *response)?;
        next.run(ctx, request, &mut *response).await?;
        self.applicator.after_downstream(&mut *response)?;
        Ok(())
    }

    async fn process_buffered(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        response: &mut dyn ResponseHandle,
        next: Next<'_>,
    ) -> MiddlewareResult {
        let request_id = ctx.request_id();
        let mut buffered = BufferedResponse::acquire(response);
        self.applicator.before_downstream(&mut buffered)?;

        let outcome = next.run(ctx, request, &mut buffered).await;
        match outcome {
            Ok(()) => {
                self.applicator.after_downstream(&mut buffered)?;
                tracing::debug!(
                    request_id = %request_id,
                    bytes = buffered.len(),
                    "Releasing buffered response"
                );
                buffered.release()?;
                Ok(())
            }
            Err(err) => {
                tracing::debug!(
                    request_id = %request_id,
                    error = %err,
                    "Downstream failed, skipping post-downstream headers"
                );
                if let Err(release_err) = buffered.release() {
                    tracing::warn!(
                        request_id = %request_id,
                        error = %release_err,
                        "Failed to release buffered response after downstream error"
                    );
                }
                Err(err)
            }
        }
    }
}

impl Middleware for ResponseHeadersMiddleware {
    fn name(&self) -> &'static str {
        "response_headers"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        response: &'a mut dyn ResponseHandle,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            if self.buffered {
                self.process_buffered(ctx, request, response, next).await
            } else {
                self.process_unbuffered(ctx, request, response, next).await
            }
        })
    }
}
