use std::mem::size_of;

use combiner_common::tuple::{Tuple, TupleEntry, Value};

use super::{expect_arity, type_mismatch};
use crate::aggregator::Aggregator;
use crate::combiner_error::{CombinerError, CombinerResult};
use crate::memory::MemoryUsageEstimator;

const NAME: &str = "count";

/// Counts records, whatever their routed values. Partial counts merge by addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountAggregator;

fn add_count(acc: &mut i64, count: i64) -> CombinerResult<()> {
    *acc = acc
        .checked_add(count)
        .ok_or(CombinerError::CountOverflow { aggregator: NAME })?;
    Ok(())
}

impl Aggregator for CountAggregator {
    type Accumulator = i64;

    fn initialize(&self) -> i64 {
        0
    }

    fn partial_aggregate(&mut self, acc: &mut i64, _record: &TupleEntry) -> CombinerResult<()> {
        add_count(acc, 1)
    }

    fn to_partial_tuple(&self, acc: &i64) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![Value::Int(*acc)]))
    }

    fn final_aggregate(&mut self, acc: &mut i64, partial: &TupleEntry) -> CombinerResult<()> {
        expect_arity(NAME, partial, 1)?;
        match partial.get(0)? {
            Value::Int(count) => add_count(acc, *count),
            other => Err(type_mismatch(NAME, partial, 0, "int", other)),
        }
    }

    fn to_final_tuple(&self, acc: &i64) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![Value::Int(*acc)]))
    }
}

impl MemoryUsageEstimator<i64> for CountAggregator {
    fn estimate_memory_size(&self, _item: &i64) -> CombinerResult<u64> {
        Ok(size_of::<i64>() as u64)
    }
}
