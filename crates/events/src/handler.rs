//! Handler types accepted by the bus.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Opaque identifier returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Boxed future returned by a handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// A subscribed handler. Sync and async handlers share this shape.
pub type Handler<M> = Arc<dyn Fn(M) -> HandlerFuture + Send + Sync + 'static>;

/// Wrap a synchronous closure as a handler.
///
/// The closure runs inside the task the bus spawns for it, so a panic is
/// contained the same way as an async handler's.
pub fn handler_fn<M, F>(f: F) -> Handler<M>
where
    M: Send + 'static,
    F: Fn(M) -> anyhow::Result<()> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |message: M| -> HandlerFuture {
        let f = Arc::clone(&f);
        Box::pin(async move { f(message) })
    })
}

/// Wrap an async closure as a handler.
pub fn async_handler<M, F, Fut>(f: F) -> Handler<M>
where
    F: Fn(M) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |message: M| -> HandlerFuture { Box::pin(f(message)) })
}
