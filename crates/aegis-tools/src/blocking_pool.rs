//! A bounded pool for synchronous tool executors. `tokio::task::spawn_blocking`
//! already runs on its own thread pool, but that pool is shared process-wide;
//! this semaphore caps how many blocking tool calls run at once so a burst of
//! filesystem tools can't starve the rest of the process. Sized `num_cpus::get()`
//! per the registry/executor contract.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;

#[derive(Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
}

impl Default for BlockingPool {
    fn default() -> Self {
        Self::new(num_cpus::get().max(1))
    }
}

impl BlockingPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Run `f` on the blocking thread pool, bounded by this pool's capacity.
    pub async fn run<F, R>(&self, f: F) -> Result<R, JoinError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_closure_and_returns_value() {
        let pool = BlockingPool::new(2);
        let result = pool.run(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }
}
