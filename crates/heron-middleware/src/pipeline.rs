//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is built once at startup and then shared by every request.
//! Stages run in the order they were added; the handler runs last.
//!
//! ```text
//! Request → stage 1 → stage 2 → … → Handler
//!                                     ↓
//! Response ← stage 1 ← stage 2 ← … ←──┘
//! ```

use std::sync::Arc;

use heron_core::ResponseHandle;

use crate::context::MiddlewareContext;
use crate::error::MiddlewareResult;
use crate::middleware::{Handler, Middleware, Next};
use crate::types::Request;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered chain of middleware stages.
///
/// # Example
///
/// ```
/// use heron_core::{HeaderSpec, ResponseBody};
/// use heron_middleware::stages::ResponseHeadersMiddleware;
/// use heron_middleware::{FnHandler, MiddlewareContext, Pipeline, ResponseWriter};
/// # use bytes::Bytes;
/// # use http_body_util::Full;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .stage(ResponseHeadersMiddleware::from_params([("x-frame-options", "DENY")]))
///     .build();
/// let handler = FnHandler::new(|_ctx, _req, response| {
///     response.write_text("hello")?;
///     Ok(())
/// });
///
/// let request = http::Request::new(Full::new(Bytes::new()));
/// let mut response = ResponseWriter::new();
/// pipeline
///     .process(&mut MiddlewareContext::new(), request, &handler, &mut response)
///     .await
///     .unwrap();
///
/// assert_eq!(response.headers()["x-frame-options"], "DENY");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every stage and then `handler`.
    pub async fn process(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
        handler: &dyn Handler,
        response: &mut dyn ResponseHandle,
    ) -> MiddlewareResult {
        let next = self.build_chain(handler);
        next.run(ctx, request, response).await
    }

    fn build_chain<'a>(&'a self, handler: &'a dyn Handler) -> Next<'a> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        tracing::debug!(stages = self.stages.len(), "Middleware pipeline built");
        Pipeline {
            stages: self.stages,
        }
    }
}
