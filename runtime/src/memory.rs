use std::any::Any;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

use tracing::error;

use crate::aggregator::{downcast_ref, BoxedAccumulator};
use crate::combiner_error::{CombinerError, CombinerResult};
use crate::multi_aggregator::CompositeAccumulator;

/// Bookkeeping cost of the composite container itself, independent of its entries.
pub const COMPOSITE_OVERHEAD_BYTES: u64 = size_of::<Vec<BoxedAccumulator>>() as u64;

/// Estimates the in-memory size of an accumulator value, in bytes.
///
/// Memory bounded combiner caches use the estimate to decide when accumulated
/// state must be flushed.
pub trait MemoryUsageEstimator<T: ?Sized>: Send + Sync {
    fn estimate_memory_size(&self, item: &T) -> CombinerResult<u64>;
}

impl<T, F> MemoryUsageEstimator<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> u64 + Send + Sync,
{
    fn estimate_memory_size(&self, item: &T) -> CombinerResult<u64> {
        Ok(self(item))
    }
}

pub(crate) trait DynMemoryEstimator: Send + Sync {
    fn estimate_memory_size(&self, acc: &BoxedAccumulator) -> CombinerResult<u64>;
}

pub(crate) struct ErasedEstimator<T, E> {
    estimator: E,
    _marker: PhantomData<fn(&T)>,
}

impl<T, E> ErasedEstimator<T, E> {
    pub(crate) fn new(estimator: E) -> Self {
        Self {
            estimator,
            _marker: PhantomData,
        }
    }
}

impl<T, E> DynMemoryEstimator for ErasedEstimator<T, E>
where
    T: Any,
    E: MemoryUsageEstimator<T>,
{
    fn estimate_memory_size(&self, acc: &BoxedAccumulator) -> CombinerResult<u64> {
        self.estimator.estimate_memory_size(downcast_ref::<T>(acc)?)
    }
}

/// Memory estimate for a [`CompositeAccumulator`]: a fixed container overhead
/// plus the estimate of every composed aggregator applied to its own entry.
///
/// Every composed aggregator must carry an estimator. A missing one is a
/// configuration error and is reported on every call, never replaced by a
/// partial or zero estimate.
#[derive(Clone)]
pub struct CompositeMemoryEstimator {
    estimators: Vec<Option<Arc<dyn DynMemoryEstimator>>>,
}

impl CompositeMemoryEstimator {
    pub(crate) fn new(estimators: Vec<Option<Arc<dyn DynMemoryEstimator>>>) -> Self {
        Self { estimators }
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }

    /// Index of the first composed aggregator without an estimator.
    pub fn first_missing(&self) -> Option<usize> {
        self.estimators.iter().position(Option::is_none)
    }
}

impl MemoryUsageEstimator<CompositeAccumulator> for CompositeMemoryEstimator {
    fn estimate_memory_size(&self, items: &CompositeAccumulator) -> CombinerResult<u64> {
        if items.len() != self.estimators.len() {
            return Err(CombinerError::CompositeWidthMismatch {
                expected: self.estimators.len(),
                actual: items.len(),
            });
        }
        let mut size = COMPOSITE_OVERHEAD_BYTES;
        for (index, (estimator, item)) in self.estimators.iter().zip(items.iter()).enumerate() {
            let Some(estimator) = estimator else {
                error!(index, "memory bound cache used for combining without a memory estimator");
                return Err(CombinerError::MissingMemoryEstimator { index });
            };
            size += DynMemoryEstimator::estimate_memory_size(estimator.as_ref(), item)?;
        }
        Ok(size)
    }
}
