use std::cmp::Ordering;
use std::mem::size_of;

use combiner_common::tuple::{Tuple, TupleEntry, Value};

use super::{expect_arity, type_mismatch};
use crate::aggregator::Aggregator;
use crate::combiner_error::CombinerResult;
use crate::memory::MemoryUsageEstimator;

/// Smallest value of one field. Nulls and NaNs are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinAggregator;

/// Largest value of one field. Nulls and NaNs are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxAggregator;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtremumState {
    value: Option<Value>,
}

impl ExtremumState {
    /// Keeps the candidate when it orders as `keep` against the current value.
    fn update(
        &mut self,
        name: &'static str,
        record: &TupleEntry,
        keep: Ordering,
    ) -> CombinerResult<()> {
        expect_arity(name, record, 1)?;
        let candidate = record.get(0)?;
        if is_missing(candidate) {
            return Ok(());
        }
        match &self.value {
            None => self.value = Some(candidate.clone()),
            Some(current) => match candidate.try_cmp(current) {
                Some(ord) if ord == keep => self.value = Some(candidate.clone()),
                Some(_) => {}
                None => {
                    return Err(type_mismatch(
                        name,
                        record,
                        0,
                        current.type_name(),
                        candidate,
                    ))
                }
            },
        }
        Ok(())
    }

    pub fn value(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }
}

fn is_missing(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Float(f) => f.is_nan(),
        _ => false,
    }
}

macro_rules! extremum_aggregator {
    ($agg:ident, $name:literal, $keep:expr) => {
        impl Aggregator for $agg {
            type Accumulator = ExtremumState;

            fn initialize(&self) -> ExtremumState {
                ExtremumState::default()
            }

            fn partial_aggregate(
                &mut self,
                acc: &mut ExtremumState,
                record: &TupleEntry,
            ) -> CombinerResult<()> {
                acc.update($name, record, $keep)
            }

            fn to_partial_tuple(&self, acc: &ExtremumState) -> CombinerResult<Tuple> {
                Ok(Tuple::from(vec![acc.value()]))
            }

            fn final_aggregate(
                &mut self,
                acc: &mut ExtremumState,
                partial: &TupleEntry,
            ) -> CombinerResult<()> {
                acc.update($name, partial, $keep)
            }

            fn to_final_tuple(&self, acc: &ExtremumState) -> CombinerResult<Tuple> {
                Ok(Tuple::from(vec![acc.value()]))
            }
        }

        impl MemoryUsageEstimator<ExtremumState> for $agg {
            fn estimate_memory_size(&self, item: &ExtremumState) -> CombinerResult<u64> {
                let heap = item
                    .value
                    .as_ref()
                    .map(|v| v.memory_size() - size_of::<Value>())
                    .unwrap_or(0);
                Ok((size_of::<ExtremumState>() + heap) as u64)
            }
        }
    };
}

extremum_aggregator!(MinAggregator, "min", Ordering::Less);
extremum_aggregator!(MaxAggregator, "max", Ordering::Greater);

#[cfg(test)]
mod tests {
    use combiner_common::tuple;
    use combiner_common::tuple::{Fields, TupleEntry, Value};
    use test_case::test_case;

    use super::{MaxAggregator, MinAggregator};
    use crate::aggregator::Aggregator;
    use crate::combiner_error::CombinerError;

    fn fold<A: Aggregator>(agg: &mut A, values: &[Value]) -> A::Accumulator {
        let fields = Fields::new(["v"]).unwrap();
        let mut acc = agg.initialize();
        for v in values {
            let record = TupleEntry::new(fields.clone(), tuple![v.clone()]).unwrap();
            agg.partial_aggregate(&mut acc, &record).unwrap();
        }
        acc
    }

    #[test_case(&[Value::Int(4), Value::Int(-2), Value::Null, Value::Int(9)], Value::Int(-2), Value::Int(9) ; "ints")]
    #[test_case(&[Value::Float(f64::NAN), Value::Float(1.5), Value::Int(3)], Value::Float(1.5), Value::Int(3) ; "mixed numbers")]
    #[test_case(&[Value::from("pear"), Value::from("apple")], Value::from("apple"), Value::from("pear") ; "strings")]
    #[test_case(&[Value::Null], Value::Null, Value::Null ; "only nulls")]
    fn test_extrema(values: &[Value], min: Value, max: Value) {
        let mut agg = MinAggregator;
        let acc = fold(&mut agg, values);
        assert_eq!(agg.to_final_tuple(&acc).unwrap(), tuple![min]);

        let mut agg = MaxAggregator;
        let acc = fold(&mut agg, values);
        assert_eq!(agg.to_final_tuple(&acc).unwrap(), tuple![max]);
    }

    #[test]
    fn test_incomparable_values() {
        let mut agg = MinAggregator;
        let mut acc = fold(&mut agg, &[Value::Int(1)]);
        let record = TupleEntry::new(Fields::new(["v"]).unwrap(), tuple!["one"]).unwrap();
        let err = agg.partial_aggregate(&mut acc, &record).unwrap_err();
        assert!(matches!(err, CombinerError::TypeMismatch { aggregator: "min", .. }));
    }

    #[test]
    fn test_merge_partials() {
        let mut agg = MaxAggregator;
        let left = fold(&mut agg, &[Value::Int(3)]);
        let right = fold(&mut agg, &[Value::Int(11)]);

        let fields = Fields::new(["v_max"]).unwrap();
        let mut merged = agg.initialize();
        for acc in [&left, &right] {
            let partial =
                TupleEntry::new(fields.clone(), agg.to_partial_tuple(acc).unwrap()).unwrap();
            agg.final_aggregate(&mut merged, &partial).unwrap();
        }
        assert_eq!(agg.to_final_tuple(&merged).unwrap(), tuple![11]);
    }
}
