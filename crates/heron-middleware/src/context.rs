//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the chain:
//! the request ID used to correlate log lines, the start time, and typed
//! extensions middleware can hand to later stages or the handler.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

use uuid::Uuid;

/// Context that flows through the middleware chain.
///
/// # Example
///
/// ```
/// use heron_middleware::context::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new();
/// assert_eq!(ctx.request_id().get_version_num(), 7);
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous one.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_middleware::context::MiddlewareContext;
    ///
    /// struct Tenant(&'static str);
    ///
    /// let mut ctx = MiddlewareContext::new();
    /// ctx.set_extension(Tenant("acme"));
    /// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
