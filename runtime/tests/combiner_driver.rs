//! Drives a composite the way a memory bounded map-side combiner does:
//! accumulate per key, flush partial tuples when the estimate exceeds the
//! limit, then merge every partial on the reduce side.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use test_case::test_case;

use combiner_common::tuple;
use combiner_common::tuple::{Fields, Tuple, TupleEntry, Value};
use combiner_runtime::aggregators::AggregatorKind;
use combiner_runtime::{
    Aggregator, CombinerConfig, CombinerResult, CompositeAccumulator, CompositeMemoryEstimator,
    MemoryUsageEstimator, MultiAggregator, ResolvedMultiAggregator,
};

fn input_schema() -> Fields {
    Fields::new(["user", "bytes", "path"]).unwrap()
}

fn build() -> (ResolvedMultiAggregator, Fields) {
    let multi = MultiAggregator::new(vec![
        AggregatorKind::Sum.spec(["bytes"], ["bytes_sum"]).unwrap(),
        AggregatorKind::Count.spec(["user"], ["requests"]).unwrap(),
        AggregatorKind::Max.spec(["path"], ["last_path"]).unwrap(),
        AggregatorKind::Avg.spec(["bytes"], ["bytes_total", "bytes_n"]).unwrap(),
    ])
    .unwrap();
    let intermediate = multi.intermediate_fields().unwrap();
    let resolved = multi.resolve(&input_schema(), &intermediate).unwrap();
    (resolved, intermediate)
}

fn records() -> Vec<TupleEntry> {
    let mut out = vec![];
    for i in 0..60_i64 {
        let user = format!("u{}", i % 4);
        let path = format!("/p{:02}", i % 13);
        let values = vec![Value::from(user), Value::Int(i * 10), Value::from(path)];
        out.push(TupleEntry::new(input_schema(), Tuple::from(values)).unwrap());
    }
    out
}

/// Map side: returns every flushed `(key, partial)` pair.
fn combine(
    multi: &mut ResolvedMultiAggregator,
    estimator: &CompositeMemoryEstimator,
    config: &CombinerConfig,
    records: &[TupleEntry],
) -> CombinerResult<Vec<(String, Tuple)>> {
    let mut cache: BTreeMap<String, CompositeAccumulator> = BTreeMap::new();
    let mut flushed = vec![];
    for record in records {
        let key = record.get(0)?.as_str().unwrap_or_default().to_string();
        let acc = cache.entry(key).or_insert_with(|| multi.initialize());
        multi.partial_aggregate(acc, record)?;

        if let Some(limit) = config.memory_limit_bytes {
            let mut used = 0;
            for acc in cache.values() {
                used += estimator.estimate_memory_size(acc)?;
            }
            if used > limit {
                for (key, acc) in std::mem::take(&mut cache) {
                    flushed.push((key, multi.to_partial_tuple(&acc)?));
                }
            }
        }
    }
    for (key, acc) in cache {
        flushed.push((key, multi.to_partial_tuple(&acc)?));
    }
    Ok(flushed)
}

/// Reduce side: merges partials per key into final tuples.
fn reduce(
    multi: &mut ResolvedMultiAggregator,
    intermediate: &Fields,
    partials: Vec<(String, Tuple)>,
) -> CombinerResult<BTreeMap<String, Tuple>> {
    let mut merged: BTreeMap<String, CompositeAccumulator> = BTreeMap::new();
    for (key, partial) in partials {
        let entry = TupleEntry::new(intermediate.clone(), partial)?;
        let acc = merged.entry(key).or_insert_with(|| multi.initialize());
        multi.final_aggregate(acc, &entry)?;
    }
    let mut out = BTreeMap::new();
    for (key, acc) in merged {
        out.insert(key, multi.to_final_tuple(&acc)?);
    }
    Ok(out)
}

#[test_case(CombinerConfig::default(), false ; "unbounded")]
#[test_case(CombinerConfig::memory_bounded(1), true ; "flush on every record")]
#[test_case(CombinerConfig::memory_bounded(200), true ; "flush occasionally")]
fn test_flushing_does_not_change_results(config: CombinerConfig, expect_flushes: bool) {
    let (mut multi, intermediate) = build();
    let estimator = multi.memory_estimator();
    let records = records();

    let partials = combine(&mut multi, &estimator, &config, &records).unwrap();
    assert_eq!(partials.len() > 4, expect_flushes);

    let finals = reduce(&mut multi, &intermediate, partials).unwrap();
    assert_eq!(finals.len(), 4);

    // u0 sees i = 0, 4, ..., 56
    let u0: Vec<i64> = (0..60).filter(|i| i % 4 == 0).collect();
    let bytes: i64 = u0.iter().map(|i| i * 10).sum();
    let max_path = u0.iter().map(|i| format!("/p{:02}", i % 13)).max().unwrap();
    assert_eq!(
        finals["u0"],
        tuple![
            bytes,
            u0.len() as i64,
            max_path,
            bytes as f64 / u0.len() as f64
        ]
    );
}

#[test]
fn test_memory_bound_requires_estimators() {
    use combiner_runtime::aggregators::SumAggregator;
    use combiner_runtime::{AggregatorSpec, CombinerError};

    let multi = MultiAggregator::new(vec![
        AggregatorKind::Count.spec(["user"], ["requests"]).unwrap(),
        AggregatorSpec::builder(SumAggregator)
            .input_fields(["bytes"])
            .intermediate_fields(["bytes_sum"])
            .build()
            .unwrap(),
    ])
    .unwrap();
    let config = CombinerConfig::memory_bounded(1024);
    assert_eq!(
        multi.validate(&config),
        Err(CombinerError::MissingMemoryEstimator { index: 1 })
    );

    let intermediate = multi.intermediate_fields().unwrap();
    let mut multi = multi.resolve(&input_schema(), &intermediate).unwrap();
    let estimator = multi.memory_estimator();
    let err = combine(&mut multi, &estimator, &config, &records()).unwrap_err();
    assert_eq!(err, CombinerError::MissingMemoryEstimator { index: 1 });
}
