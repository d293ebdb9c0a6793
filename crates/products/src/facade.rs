//! Retry facade over [`ProductInventoryUpdateUseCase`].
//!
//! Stock conflicts are retried without an attempt cap: a conflict means some
//! other writer made progress, so the loop converges as contention drains.
//! Callers that need to give up trigger an [`InterruptHandle`].

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::inventory::{InventoryError, ProductInventoryUpdateCommand, ProductInventoryUpdateUseCase};
use crate::product::Product;

/// Delay strategy between conflicting attempts.
pub trait Backoff: Send + Sync {
    /// Delay to wait after the `attempt`-th failed attempt (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Retry immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl Backoff for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Doubling delay, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

impl<B: Backoff + ?Sized> Backoff for Arc<B> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

impl Backoff for Box<dyn Backoff> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

/// Cross-thread cancellation flag for a retry loop.
///
/// Once triggered it stays triggered; clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for up to `timeout`. Returns `true` if interrupted before or during the wait.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut interrupted = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*interrupted {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            interrupted = cvar
                .wait_timeout(interrupted, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *interrupted
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InventoryRetryError {
    #[error("stock update interrupted after {attempts} attempt(s)")]
    Interrupted { attempts: u32 },

    #[error(transparent)]
    Failed(#[from] InventoryError),
}

impl InventoryRetryError {
    pub fn code(&self) -> &'static str {
        match self {
            InventoryRetryError::Interrupted { .. } => "interrupted",
            InventoryRetryError::Failed(err) => err.code(),
        }
    }
}

pub struct ProductInventoryFacade<U, B = NoBackoff> {
    use_case: U,
    backoff: B,
}

impl<U: ProductInventoryUpdateUseCase> ProductInventoryFacade<U> {
    pub fn new(use_case: U) -> Self {
        Self {
            use_case,
            backoff: NoBackoff,
        }
    }
}

impl<U, B> ProductInventoryFacade<U, B>
where
    U: ProductInventoryUpdateUseCase,
    B: Backoff,
{
    pub fn with_backoff(use_case: U, backoff: B) -> Self {
        Self { use_case, backoff }
    }

    /// Retry until the update succeeds or fails with a non-conflict error.
    pub fn update_stock_with_retry(
        &self,
        cmd: &ProductInventoryUpdateCommand,
    ) -> Result<Product, InventoryRetryError> {
        self.update_stock_with_retry_interruptible(cmd, &InterruptHandle::new())
    }

    /// As [`update_stock_with_retry`](Self::update_stock_with_retry), giving up
    /// with [`InventoryRetryError::Interrupted`] once `interrupt` fires.
    pub fn update_stock_with_retry_interruptible(
        &self,
        cmd: &ProductInventoryUpdateCommand,
        interrupt: &InterruptHandle,
    ) -> Result<Product, InventoryRetryError> {
        let mut attempts: u32 = 0;

        loop {
            if interrupt.is_interrupted() {
                tracing::warn!(
                    product_id = %cmd.product_id(),
                    attempts,
                    "stock update interrupted"
                );
                return Err(InventoryRetryError::Interrupted { attempts });
            }

            attempts = attempts.saturating_add(1);

            match self.use_case.update_stock(cmd) {
                Ok(product) => {
                    if attempts > 1 {
                        tracing::info!(
                            product_id = %cmd.product_id(),
                            attempts,
                            "stock update succeeded after retry"
                        );
                    }
                    return Ok(product);
                }
                Err(err) if err.is_retryable() => {
                    let delay = self.backoff.delay(attempts);
                    tracing::warn!(
                        product_id = %cmd.product_id(),
                        attempt = attempts,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "stock conflict, retrying"
                    );
                    if !delay.is_zero() && interrupt.wait(delay) {
                        return Err(InventoryRetryError::Interrupted { attempts });
                    }
                }
                Err(err) => return Err(InventoryRetryError::Failed(err)),
            }
        }
    }
}
