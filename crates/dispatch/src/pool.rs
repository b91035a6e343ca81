use crate::context::Context;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Idle contexts kept for reuse between requests.
///
/// The pool is bounded: contexts released while it is full are dropped. A
/// context taken from the pool must be [reset](Context::reset) before use.
#[derive(Debug)]
pub struct ContextPool {
    contexts: Mutex<Vec<Context>>,
    capacity: usize,
}

impl ContextPool {
    pub fn new(capacity: usize) -> Self {
        Self { contexts: Mutex::new(Vec::with_capacity(capacity)), capacity }
    }

    pub fn acquire(&self) -> Option<Context> {
        self.lock().pop()
    }

    pub fn release(&self, ctx: Context) {
        let mut contexts = self.lock();
        if contexts.len() < self.capacity {
            contexts.push(ctx);
        } else {
            trace!(capacity = self.capacity, "context pool is full, context dropped");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // a panic while holding the lock leaves a plain Vec behind, still usable
    fn lock(&self) -> MutexGuard<'_, Vec<Context>> {
        self.contexts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::ContextPool;
    use crate::context::tests::{context, request};
    use http::Method;

    #[test]
    fn bounded() {
        let pool = ContextPool::new(1);
        assert!(pool.acquire().is_none());

        pool.release(context(request(Method::GET, "/a")));
        pool.release(context(request(Method::GET, "/b")));
        assert_eq!(pool.len(), 1);

        let ctx = pool.acquire().unwrap();
        assert_eq!(ctx.request().uri(), "/a");
        assert!(pool.is_empty());
    }

    #[test]
    fn zero_capacity_never_keeps_contexts() {
        let pool = ContextPool::new(0);
        pool.release(context(request(Method::GET, "/")));
        assert!(pool.acquire().is_none());
    }
}
