//! Batch fetch: N descriptors in, N derived values out in input order, or the
//! first failure.
//!
//! [`FetchMode::Sequential`] fetches one descriptor at a time and stops at the
//! first error. [`FetchMode::Concurrent`] spawns one task per descriptor on a
//! [`JoinSet`], optionally capped by a semaphore. The first failure raises a
//! shared [`CancellationToken`]; every unit races its fetch against that
//! token, and the join drains all units before returning so nothing outlives
//! the call.

use std::{num::NonZeroUsize, sync::Arc};

use shared::{
    domain::{BatchPhase, FetchDescriptor},
    error::FetchError,
};
use tokio::{
    sync::{watch, Semaphore},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::Fetcher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchMode {
    #[default]
    Sequential,
    Concurrent {
        /// `None` launches every descriptor at once.
        max_in_flight: Option<NonZeroUsize>,
    },
}

impl FetchMode {
    pub fn unbounded() -> Self {
        Self::Concurrent {
            max_in_flight: None,
        }
    }

    pub fn bounded(max_in_flight: NonZeroUsize) -> Self {
        Self::Concurrent {
            max_in_flight: Some(max_in_flight),
        }
    }
}

/// Outcome of one unit of concurrent work.
enum UnitOutcome<T> {
    Fetched(T),
    Failed(FetchError),
    Cancelled,
}

#[derive(Clone)]
pub struct FetchPipeline {
    fetcher: Arc<dyn Fetcher>,
    mode: FetchMode,
}

impl FetchPipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, mode: FetchMode) -> Self {
        Self { fetcher, mode }
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Fetches every descriptor and maps each payload through `derive`.
    ///
    /// `derive` runs once per successful fetch and cannot fail; decode
    /// problems must be folded into its output.
    pub async fn run<T, D>(
        &self,
        descriptors: Vec<FetchDescriptor>,
        derive: D,
    ) -> Result<Vec<T>, FetchError>
    where
        T: Send + 'static,
        D: Fn(&FetchDescriptor, Vec<u8>) -> T + Send + Sync + 'static,
    {
        match self.mode {
            FetchMode::Sequential => self.run_sequential(descriptors, derive).await,
            FetchMode::Concurrent { max_in_flight } => {
                self.run_concurrent(descriptors, Arc::new(derive), max_in_flight)
                    .await
            }
        }
    }

    async fn run_sequential<T, D>(
        &self,
        descriptors: Vec<FetchDescriptor>,
        derive: D,
    ) -> Result<Vec<T>, FetchError>
    where
        D: Fn(&FetchDescriptor, Vec<u8>) -> T,
    {
        let mut values = Vec::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            let bytes = self
                .fetcher
                .fetch(&descriptor.locator)
                .await
                .inspect_err(|err| {
                    tracing::warn!(position, id = descriptor.id.0, error = %err, "fetch failed; abandoning batch");
                })?;
            values.push(derive(descriptor, bytes));
        }
        Ok(values)
    }

    async fn run_concurrent<T, D>(
        &self,
        descriptors: Vec<FetchDescriptor>,
        derive: Arc<D>,
        max_in_flight: Option<NonZeroUsize>,
    ) -> Result<Vec<T>, FetchError>
    where
        T: Send + 'static,
        D: Fn(&FetchDescriptor, Vec<u8>) -> T + Send + Sync + 'static,
    {
        let locators: Vec<Url> = descriptors.iter().map(|descriptor| descriptor.locator.clone()).collect();
        let cancel = CancellationToken::new();
        let limiter = max_in_flight.map(|limit| Arc::new(Semaphore::new(limit.get())));
        let mut units = JoinSet::new();

        for (position, descriptor) in descriptors.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let derive = Arc::clone(&derive);
            let cancel = cancel.clone();
            let limiter = limiter.clone();
            units.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return (position, UnitOutcome::Cancelled),
                        permit = limiter.acquire_owned() => match permit {
                            Ok(permit) => Some(permit),
                            Err(_) => return (position, UnitOutcome::Cancelled),
                        },
                    },
                    None => None,
                };
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => UnitOutcome::Cancelled,
                    fetched = fetcher.fetch(&descriptor.locator) => match fetched {
                        Ok(_) if cancel.is_cancelled() => UnitOutcome::Cancelled,
                        Ok(bytes) => UnitOutcome::Fetched(derive(&descriptor, bytes)),
                        Err(err) => UnitOutcome::Failed(err),
                    },
                };
                (position, outcome)
            });
        }

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None)
            .take(locators.len())
            .collect();
        let mut failure: Option<FetchError> = None;
        while let Some(joined) = units.join_next().await {
            let (position, outcome) = match joined {
                Ok(done) => done,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    tracing::warn!(error = %err, "fetch unit ended without an outcome");
                    continue;
                }
            };
            match outcome {
                UnitOutcome::Fetched(value) => {
                    if failure.is_none() {
                        slots[position] = Some(value);
                    }
                }
                UnitOutcome::Failed(err) => {
                    if failure.is_none() {
                        tracing::warn!(position, error = %err, "fetch failed; cancelling remaining units");
                        cancel.cancel();
                        failure = Some(err);
                    } else {
                        tracing::debug!(position, error = %err, "additional failure after cancellation");
                    }
                }
                UnitOutcome::Cancelled => {
                    tracing::trace!(position, "unit cancelled");
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        assemble(slots, &locators)
    }
}

/// One value per descriptor, in input order. A slot left empty by a unit that
/// never reported fails the batch rather than shortening it.
fn assemble<T>(slots: Vec<Option<T>>, locators: &[Url]) -> Result<Vec<T>, FetchError> {
    slots
        .into_iter()
        .zip(locators)
        .map(|(slot, locator)| {
            slot.ok_or_else(|| FetchError::transport(locator, "fetch task ended without a result"))
        })
        .collect()
}

/// A batch with an observable [`BatchPhase`]. Running consumes the batch, so
/// a terminal phase is final.
pub struct FetchBatch {
    descriptors: Vec<FetchDescriptor>,
    phase: watch::Sender<BatchPhase>,
}

impl FetchBatch {
    pub fn new(descriptors: Vec<FetchDescriptor>) -> Self {
        let (phase, _) = watch::channel(BatchPhase::NotStarted);
        Self { descriptors, phase }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn phase(&self) -> BatchPhase {
        *self.phase.borrow()
    }

    pub fn phases(&self) -> watch::Receiver<BatchPhase> {
        self.phase.subscribe()
    }

    pub async fn run<T, D>(self, pipeline: &FetchPipeline, derive: D) -> Result<Vec<T>, FetchError>
    where
        T: Send + 'static,
        D: Fn(&FetchDescriptor, Vec<u8>) -> T + Send + Sync + 'static,
    {
        let Self { descriptors, phase } = self;
        let count = descriptors.len();
        phase.send_replace(BatchPhase::Running);
        tracing::debug!(count, mode = ?pipeline.mode(), "batch running");

        let result = pipeline.run(descriptors, derive).await;
        match &result {
            Ok(_) => {
                phase.send_replace(BatchPhase::Completed);
                tracing::info!(count, "batch completed");
            }
            Err(err) => {
                phase.send_replace(BatchPhase::Failed);
                tracing::error!(count, error = %err, "batch failed");
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
