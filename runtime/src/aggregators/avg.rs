use std::mem::size_of;

use combiner_common::tuple::{Tuple, TupleEntry, Value};

use super::{expect_arity, type_mismatch};
use crate::aggregator::Aggregator;
use crate::combiner_error::{CombinerError, CombinerResult};
use crate::memory::MemoryUsageEstimator;

const NAME: &str = "avg";

/// Mean of one numeric field. Nulls are skipped.
///
/// Partial tuples carry `[sum, count]`, so the merge needs two intermediate fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvgAggregator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvgState {
    sum: f64,
    count: i64,
}

impl AvgState {
    pub fn value(&self) -> Value {
        if self.count == 0 {
            return Value::Null;
        }
        Value::Float(self.sum / self.count as f64)
    }

    fn merge(&mut self, sum: f64, count: i64) -> CombinerResult<()> {
        self.count = self
            .count
            .checked_add(count)
            .ok_or(CombinerError::CountOverflow { aggregator: NAME })?;
        self.sum += sum;
        Ok(())
    }
}

impl Aggregator for AvgAggregator {
    type Accumulator = AvgState;

    fn initialize(&self) -> AvgState {
        AvgState::default()
    }

    fn partial_aggregate(&mut self, acc: &mut AvgState, record: &TupleEntry) -> CombinerResult<()> {
        expect_arity(NAME, record, 1)?;
        let value = record.get(0)?;
        if value.is_null() {
            return Ok(());
        }
        let Some(v) = value.as_f64() else {
            return Err(type_mismatch(NAME, record, 0, "number", value));
        };
        acc.merge(v, 1)
    }

    fn to_partial_tuple(&self, acc: &AvgState) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![Value::Float(acc.sum), Value::Int(acc.count)]))
    }

    fn final_aggregate(&mut self, acc: &mut AvgState, partial: &TupleEntry) -> CombinerResult<()> {
        expect_arity(NAME, partial, 2)?;
        let sum = partial.get(0)?;
        let Some(sum) = sum.as_f64() else {
            return Err(type_mismatch(NAME, partial, 0, "number", sum));
        };
        let count = partial.get(1)?;
        let Some(count) = count.as_i64() else {
            return Err(type_mismatch(NAME, partial, 1, "int", count));
        };
        acc.merge(sum, count)
    }

    fn to_final_tuple(&self, acc: &AvgState) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![acc.value()]))
    }
}

impl MemoryUsageEstimator<AvgState> for AvgAggregator {
    fn estimate_memory_size(&self, _item: &AvgState) -> CombinerResult<u64> {
        Ok(size_of::<AvgState>() as u64)
    }
}
