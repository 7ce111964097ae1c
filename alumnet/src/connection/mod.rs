//! Lazily established, shared store connection.
//!
//! [`ConnectionManager`] keeps two slots: the established handle and the
//! attempt currently in flight. Callers that arrive while an attempt is
//! running await that same attempt, so concurrent callers never open more
//! than one connection. A failed attempt empties both slots and the next call
//! starts over (subject to the optional [`ReconnectPolicy`]).

mod backoff;

pub use backoff::ReconnectPolicy;

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{error, info, warn};
use tokio::time::Instant;

use crate::{errors::StoreError, store::Connector};

/// Failure of a shared attempt; cloned out to every caller that awaited it.
#[derive(Debug, Clone)]
struct AttemptFailure {
    message: String,
}

type Attempt<H> = Shared<BoxFuture<'static, Result<H, AttemptFailure>>>;

struct Slots<H> {
    established: Option<H>,
    in_flight: Option<(u64, Attempt<H>)>,
    generation: u64,
    consecutive_failures: u32,
    retry_after: Option<Instant>,
}

impl<H> Default for Slots<H> {
    fn default() -> Self {
        Self {
            established: None,
            in_flight: None,
            generation: 0,
            consecutive_failures: 0,
            retry_after: None,
        }
    }
}

pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    policy: ReconnectPolicy,
    slots: Mutex<Slots<C::Handle>>,
    attempts: AtomicUsize,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self::with_policy(connector, ReconnectPolicy::default())
    }

    pub fn with_policy(connector: C, policy: ReconnectPolicy) -> Self {
        Self {
            connector: Arc::new(connector),
            policy,
            slots: Mutex::new(Slots::default()),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Number of underlying connection attempts started so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().established.is_some()
    }

    /// Forget the established handle so the next [`connect`](Self::connect) opens a new one.
    pub fn invalidate(&self) {
        let mut slots = self.lock();
        if slots.established.take().is_some() {
            warn!("store connection invalidated");
        }
    }

    /// Return the established handle, join the attempt in flight, or start a new attempt.
    pub async fn connect(&self) -> Result<C::Handle, StoreError> {
        let (generation, attempt) = {
            let mut slots = self.lock();
            if let Some(handle) = &slots.established {
                return Ok(handle.clone());
            }
            match &slots.in_flight {
                Some((generation, attempt)) => (*generation, attempt.clone()),
                None => {
                    if let Some(retry_after) = slots.retry_after {
                        let now = Instant::now();
                        if now < retry_after {
                            return Err(StoreError::connection(format!(
                                "reconnect backoff active after {} failed attempt(s), retry in {:?}",
                                slots.consecutive_failures,
                                retry_after - now
                            )));
                        }
                    }
                    slots.generation += 1;
                    let generation = slots.generation;
                    let attempt = self.start_attempt();
                    slots.in_flight = Some((generation, attempt.clone()));
                    (generation, attempt)
                }
            }
        };

        let outcome = attempt.await;

        let mut slots = self.lock();
        let is_current = matches!(&slots.in_flight, Some((current, _)) if *current == generation);
        match outcome {
            Ok(handle) => {
                if is_current {
                    slots.in_flight = None;
                    slots.consecutive_failures = 0;
                    slots.retry_after = None;
                    slots.established = Some(handle.clone());
                    info!("connected to document store");
                }
                Ok(handle)
            }
            Err(failure) => {
                if is_current {
                    slots.in_flight = None;
                    slots.consecutive_failures = slots.consecutive_failures.saturating_add(1);
                    slots.retry_after = self
                        .policy
                        .delay_after(slots.consecutive_failures)
                        .map(|delay| Instant::now() + delay);
                    error!("error connecting to document store: {}", failure.message);
                }
                Err(StoreError::Connection {
                    message: failure.message,
                })
            }
        }
    }

    fn start_attempt(&self) -> Attempt<C::Handle> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let connector = Arc::clone(&self.connector);
        async move {
            connector.connect().await.map_err(|err| AttemptFailure {
                message: match err {
                    StoreError::Connection { message } => message,
                    other => other.to_string(),
                },
            })
        }
        .boxed()
        .shared()
    }

    fn lock(&self) -> MutexGuard<'_, Slots<C::Handle>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
