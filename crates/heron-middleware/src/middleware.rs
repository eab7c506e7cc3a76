//! Core middleware trait and types.
//!
//! Every stage receives the per-request context, the request, the live
//! response and a [`Next`] continuation. The response is passed down as
//! `&mut dyn ResponseHandle`, so a stage may hand a decorated response
//! (for example a [`heron_core::BufferedResponse`]) to the rest of the chain.
//!
//! # Example
//!
//! ```
//! use heron_core::{ResponseHandle, ResponseHeaders};
//! use heron_middleware::{BoxFuture, Middleware, MiddlewareContext, MiddlewareResult, Next, Request};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         response: &'a mut dyn ResponseHandle,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, MiddlewareResult> {
//!         Box::pin(async move {
//!             response.set_header("x-powered-by", "heron")?;
//!             next.run(ctx, request, response).await
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use heron_core::ResponseHandle;

use crate::context::MiddlewareContext;
use crate::error::MiddlewareResult;
use crate::types::Request;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware MUST call `next.run()` at most once
/// - Middleware SHOULD NOT suppress errors from downstream
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        response: &'a mut dyn ResponseHandle,
        next: Next<'a>,
    ) -> BoxFuture<'a, MiddlewareResult>;
}

/// The terminal stage of a chain: produces the response body.
pub trait Handler: Send + Sync {
    /// Handles the request, writing into `response`.
    fn call<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        response: &'a mut dyn ResponseHandle,
    ) -> BoxFuture<'a, MiddlewareResult>;
}

/// A [`Handler`] built from a synchronous closure.
///
/// # Example
///
/// ```
/// use heron_core::ResponseBody;
/// use heron_middleware::FnHandler;
///
/// let handler = FnHandler::new(|_ctx, _request, response| {
///     response.write_text("ok")?;
///     Ok(())
/// });
/// ```
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&MiddlewareContext, &Request, &mut dyn ResponseHandle) -> MiddlewareResult
        + Send
        + Sync
        + 'static,
{
    /// Wraps `func` as a handler.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&MiddlewareContext, &Request, &mut dyn ResponseHandle) -> MiddlewareResult
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        response: &'a mut dyn ResponseHandle,
    ) -> BoxFuture<'a, MiddlewareResult> {
        let result = (self.func)(ctx, &request, response);
        Box::pin(std::future::ready(result))
    }
}

/// Continuation that invokes the rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be called once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a dyn Handler),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware or the handler.
    pub async fn run(
        self,
        ctx: &mut MiddlewareContext,
        request: Request,
        response: &mut dyn ResponseHandle,
    ) -> MiddlewareResult {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, response, *next).await
            }
            NextInner::Handler(handler) => handler.call(ctx, request, response).await,
        }
    }
}
