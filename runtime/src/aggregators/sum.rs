use std::mem::size_of;

use combiner_common::tuple::{Tuple, TupleEntry, Value};

use super::{expect_arity, type_mismatch};
use crate::aggregator::Aggregator;
use crate::combiner_error::CombinerResult;
use crate::memory::MemoryUsageEstimator;

const NAME: &str = "sum";

/// Sums one numeric field. Nulls are skipped.
///
/// The result stays an int while every input is an int and the sum fits in
/// an `i64`, and becomes a float otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumAggregator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SumState {
    int_sum: i64,
    float_sum: f64,
    is_float: bool,
    has_value: bool,
}

impl SumState {
    fn add(&mut self, record: &TupleEntry) -> CombinerResult<()> {
        expect_arity(NAME, record, 1)?;
        match record.get(0)? {
            Value::Null => {}
            Value::Int(v) => {
                match self.int_sum.checked_add(*v) {
                    Some(sum) => self.int_sum = sum,
                    None => {
                        self.float_sum += self.int_sum as f64 + *v as f64;
                        self.int_sum = 0;
                        self.is_float = true;
                    }
                }
                self.has_value = true;
            }
            Value::Float(v) => {
                self.float_sum += v;
                self.is_float = true;
                self.has_value = true;
            }
            other => return Err(type_mismatch(NAME, record, 0, "number", other)),
        }
        Ok(())
    }

    pub fn value(&self) -> Value {
        if !self.has_value {
            Value::Null
        } else if self.is_float {
            Value::Float(self.float_sum + self.int_sum as f64)
        } else {
            Value::Int(self.int_sum)
        }
    }
}

impl Aggregator for SumAggregator {
    type Accumulator = SumState;

    fn initialize(&self) -> SumState {
        SumState::default()
    }

    fn partial_aggregate(&mut self, acc: &mut SumState, record: &TupleEntry) -> CombinerResult<()> {
        acc.add(record)
    }

    fn to_partial_tuple(&self, acc: &SumState) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![acc.value()]))
    }

    fn final_aggregate(&mut self, acc: &mut SumState, partial: &TupleEntry) -> CombinerResult<()> {
        acc.add(partial)
    }

    fn to_final_tuple(&self, acc: &SumState) -> CombinerResult<Tuple> {
        Ok(Tuple::from(vec![acc.value()]))
    }
}

impl MemoryUsageEstimator<SumState> for SumAggregator {
    fn estimate_memory_size(&self, _item: &SumState) -> CombinerResult<u64> {
        Ok(size_of::<SumState>() as u64)
    }
}
