use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::error::{AppError, Result};

/// Admission gate that grants at most `capacity` permits per `period`.
///
/// Permits are consumed, never handed back: a background task resets the
/// pool to `capacity` on every tick, whatever was used during the window.
/// Meant to be created once and shared by every submission path.
///
/// Blocked acquirers are woken in the semaphore's queue order, but callers
/// should not rely on any particular order.
#[derive(Debug)]
pub struct PermitGate {
    capacity: usize,
    period: Duration,
    semaphore: Arc<Semaphore>,
    refills: Arc<AtomicU64>,
    refill_task: Mutex<Option<RefillTask>>,
}

#[derive(Debug)]
struct RefillTask {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
}

impl PermitGate {
    /// Create a full gate and start its refill timer on the current runtime.
    pub fn new(capacity: usize, period: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(AppError::InvalidCapacity(capacity));
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(AppError::Init(format!(
                "Request limit {} exceeds maximum {}",
                capacity,
                Semaphore::MAX_PERMITS
            )));
        }
        if period.is_zero() {
            return Err(AppError::InvalidPeriod);
        }

        let runtime = Handle::try_current()
            .map_err(|e| AppError::Init(format!("Permit gate needs a tokio runtime: {}", e)))?;

        let semaphore = Arc::new(Semaphore::new(capacity));
        let refills = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = runtime.spawn(run_refill(
            semaphore.clone(),
            refills.clone(),
            capacity,
            period,
            shutdown_rx,
        ));

        debug!("Permit gate started: {} permits every {:?}", capacity, period);

        Ok(Self {
            capacity,
            period,
            semaphore,
            refills,
            refill_task: Mutex::new(Some(RefillTask { handle, shutdown_tx })),
        })
    }

    /// Wait for a permit and consume it.
    ///
    /// Cancel safe: dropping the returned future before it resolves
    /// consumes nothing. Fails only once the gate is shut down.
    pub async fn acquire(&self) -> Result<()> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AppError::GateClosed)?;
        permit.forget();
        Ok(())
    }

    /// Like [`acquire`](Self::acquire), but gives up with
    /// [`AppError::Cancelled`] as soon as `cancel` resolves.
    pub async fn acquire_or_cancel<C>(&self, cancel: C) -> Result<()>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            // Prefer the permit when both are ready.
            biased;
            result = self.acquire() => result,
            _ = cancel => {
                trace!("Permit wait cancelled");
                Err(AppError::Cancelled)
            }
        }
    }

    /// Consume a permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        match self.semaphore.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Permits left in the current window.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of timer ticks that have reset the pool so far.
    pub fn refills(&self) -> u64 {
        self.refills.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Stop the refill timer and close the gate.
    ///
    /// Waiters still blocked in `acquire` get [`AppError::GateClosed`].
    /// Calling this more than once is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.refill_task.lock().take();
        self.semaphore.close();

        let Some(RefillTask { handle, shutdown_tx }) = task else {
            return Ok(());
        };

        // The task may already be gone if the runtime is shutting down.
        let _ = shutdown_tx.send(());
        handle.await?;

        info!("Permit gate shut down after {} refills", self.refills());
        Ok(())
    }
}

impl Drop for PermitGate {
    fn drop(&mut self) {
        if let Some(task) = self.refill_task.get_mut().take() {
            task.handle.abort();
            self.semaphore.close();
            debug!("Permit gate dropped without shutdown; refill task aborted");
        }
    }
}

async fn run_refill(
    semaphore: Arc<Semaphore>,
    refills: Arc<AtomicU64>,
    capacity: usize,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    // A late refill still lands on a multiple of `period`; missed ticks are
    // dropped since a second reset restores nothing.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let restored = refill(&semaphore, capacity);
                refills.fetch_add(1, Ordering::Relaxed);
                trace!("Refilled {} permits", restored);
            }
            _ = &mut shutdown_rx => break,
        }
    }
}

/// Top the pool back up to `capacity`. Returns how many permits were added.
///
/// Only the refill task adds permits, and acquirers can only lower the
/// count between the read and the add, so the pool never exceeds
/// `capacity`.
fn refill(semaphore: &Semaphore, capacity: usize) -> usize {
    let missing = capacity.saturating_sub(semaphore.available_permits());
    if missing > 0 {
        semaphore.add_permits(missing);
    }
    missing
}
