use std::any::{type_name, Any};

use combiner_common::tuple::{Tuple, TupleEntry};

use crate::combiner_error::{CombinerError, CombinerResult};

/// Two-phase accumulation contract implemented by every aggregation algorithm.
///
/// A combiner drives one accumulator per aggregation key:
///
/// * [`initialize`](Aggregator::initialize) once when the key is first seen,
/// * [`partial_aggregate`](Aggregator::partial_aggregate) for every raw record of the key,
/// * [`to_partial_tuple`](Aggregator::to_partial_tuple) when the accumulator is flushed downstream,
/// * [`final_aggregate`](Aggregator::final_aggregate) for every partial record during the merge,
/// * [`to_final_tuple`](Aggregator::to_final_tuple) once the key is complete.
///
/// Folding must be associative and commutative: records arrive in any order and
/// partial results produced on different nodes are merged later.
///
/// Records whose width or value types do not match what the aggregator expects
/// are rejected with an error rather than truncated or padded.
pub trait Aggregator {
    type Accumulator;

    /// A fresh, empty accumulator. Called once per key, so must stay cheap.
    fn initialize(&self) -> Self::Accumulator;

    fn partial_aggregate(
        &mut self,
        acc: &mut Self::Accumulator,
        record: &TupleEntry,
    ) -> CombinerResult<()>;

    fn to_partial_tuple(&self, acc: &Self::Accumulator) -> CombinerResult<Tuple>;

    /// Merges one record produced by `to_partial_tuple` of another accumulator.
    fn final_aggregate(
        &mut self,
        acc: &mut Self::Accumulator,
        partial: &TupleEntry,
    ) -> CombinerResult<()>;

    fn to_final_tuple(&self, acc: &Self::Accumulator) -> CombinerResult<Tuple>;
}

/// Type-erased accumulator held by a composite.
pub type BoxedAccumulator = Box<dyn Any + Send>;

/// Object-safe view of an [`Aggregator`] over boxed accumulators.
pub(crate) trait DynAggregator: Send {
    fn name(&self) -> &'static str;
    fn initialize(&self) -> BoxedAccumulator;
    fn partial_aggregate(
        &mut self,
        acc: &mut BoxedAccumulator,
        record: &TupleEntry,
    ) -> CombinerResult<()>;
    fn to_partial_tuple(&self, acc: &BoxedAccumulator) -> CombinerResult<Tuple>;
    fn final_aggregate(
        &mut self,
        acc: &mut BoxedAccumulator,
        partial: &TupleEntry,
    ) -> CombinerResult<()>;
    fn to_final_tuple(&self, acc: &BoxedAccumulator) -> CombinerResult<Tuple>;
}

pub(crate) struct ErasedAggregator<A>(pub A);

impl<A> DynAggregator for ErasedAggregator<A>
where
    A: Aggregator + Send,
    A::Accumulator: Any + Send,
{
    fn name(&self) -> &'static str {
        type_name::<A>()
    }

    fn initialize(&self) -> BoxedAccumulator {
        Box::new(self.0.initialize())
    }

    fn partial_aggregate(
        &mut self,
        acc: &mut BoxedAccumulator,
        record: &TupleEntry,
    ) -> CombinerResult<()> {
        let acc = downcast_mut::<A::Accumulator>(acc)?;
        self.0.partial_aggregate(acc, record)
    }

    fn to_partial_tuple(&self, acc: &BoxedAccumulator) -> CombinerResult<Tuple> {
        self.0.to_partial_tuple(downcast_ref::<A::Accumulator>(acc)?)
    }

    fn final_aggregate(
        &mut self,
        acc: &mut BoxedAccumulator,
        partial: &TupleEntry,
    ) -> CombinerResult<()> {
        let acc = downcast_mut::<A::Accumulator>(acc)?;
        self.0.final_aggregate(acc, partial)
    }

    fn to_final_tuple(&self, acc: &BoxedAccumulator) -> CombinerResult<Tuple> {
        self.0.to_final_tuple(downcast_ref::<A::Accumulator>(acc)?)
    }
}

pub(crate) fn downcast_ref<T: Any>(acc: &BoxedAccumulator) -> CombinerResult<&T> {
    (**acc)
        .downcast_ref::<T>()
        .ok_or(CombinerError::AccumulatorMismatch {
            expected: type_name::<T>(),
        })
}

pub(crate) fn downcast_mut<T: Any>(acc: &mut BoxedAccumulator) -> CombinerResult<&mut T> {
    (**acc)
        .downcast_mut::<T>()
        .ok_or(CombinerError::AccumulatorMismatch {
            expected: type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use combiner_common::tuple::{Fields, TupleEntry};

    use super::*;
    use crate::aggregators::{CountAggregator, SumAggregator};

    #[test]
    fn test_erased_aggregator_rejects_foreign_accumulator() {
        let mut sum = ErasedAggregator(SumAggregator);
        let count = ErasedAggregator(CountAggregator);

        let mut acc = count.initialize();
        let record = TupleEntry::scratch(Fields::new(["x"]).unwrap());
        let err = sum.partial_aggregate(&mut acc, &record).unwrap_err();
        assert!(matches!(err, CombinerError::AccumulatorMismatch { .. }));
        assert!(sum.to_final_tuple(&acc).is_err());
    }
}
