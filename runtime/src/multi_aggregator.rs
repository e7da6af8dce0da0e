use std::any::Any;
use std::fmt::{Debug, Formatter};

use tracing::{debug, trace};

use combiner_common::tuple::{Fields, Tuple, TupleEntry};

use crate::aggregator::{Aggregator, BoxedAccumulator};
use crate::combiner_error::{CombinerError, CombinerResult};
use crate::config::CombinerConfig;
use crate::memory::CompositeMemoryEstimator;
use crate::router::FieldRouter;
use crate::spec::AggregatorSpec;

/// Accumulator of a [`ResolvedMultiAggregator`]: one entry per composed
/// aggregator, index-aligned with the spec list and never resized.
pub struct CompositeAccumulator {
    values: Vec<BoxedAccumulator>,
}

impl CompositeAccumulator {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed view of the entry owned by the aggregator at `index`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index).and_then(|v| (**v).downcast_ref::<T>())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoxedAccumulator> {
        self.values.iter()
    }
}

impl Debug for CompositeAccumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeAccumulator")
            .field("len", &self.values.len())
            .finish()
    }
}

/// An ordered composition of aggregators running side by side over disjoint
/// field subsets of the same record stream.
///
/// A composition must be [resolved](MultiAggregator::resolve) against the
/// schemas of the raw and partial records before it can aggregate.
#[derive(Debug)]
pub struct MultiAggregator {
    specs: Vec<AggregatorSpec>,
}

impl MultiAggregator {
    pub fn new(specs: Vec<AggregatorSpec>) -> CombinerResult<Self> {
        if specs.is_empty() {
            return Err(CombinerError::EmptySpecList);
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[AggregatorSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Checks the composition against the combiner settings. A memory bounded
    /// cache needs an estimator for every composed aggregator.
    pub fn validate(&self, config: &CombinerConfig) -> CombinerResult<()> {
        if !config.is_memory_bounded() {
            return Ok(());
        }
        match self.specs.iter().position(|spec| !spec.has_memory_estimator()) {
            Some(index) => Err(CombinerError::MissingMemoryEstimator { index }),
            None => Ok(()),
        }
    }

    /// The concatenated intermediate fields of every spec, in spec order.
    ///
    /// When each aggregator emits exactly its intermediate fields, this is the
    /// schema of the composite's partial tuple.
    pub fn intermediate_fields(&self) -> CombinerResult<Fields> {
        let mut fields = Fields::empty();
        for spec in &self.specs {
            fields = fields.append(spec.intermediate_fields())?;
        }
        Ok(fields)
    }

    /// Resolves the field positions of every spec against the raw record schema
    /// (`input_schema`) and the partial record schema (`intermediate_schema`).
    pub fn resolve(
        self,
        input_schema: &Fields,
        intermediate_schema: &Fields,
    ) -> CombinerResult<ResolvedMultiAggregator> {
        let mut input_routers = Vec::with_capacity(self.specs.len());
        let mut intermediate_routers = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            input_routers.push(FieldRouter::resolve(input_schema, spec.input_fields())?);
            intermediate_routers.push(FieldRouter::resolve(
                intermediate_schema,
                spec.intermediate_fields(),
            )?);
        }
        debug!(
            specs = self.specs.len(),
            input_schema = %input_schema,
            intermediate_schema = %intermediate_schema,
            "resolved multi-aggregator routing"
        );
        Ok(ResolvedMultiAggregator {
            specs: self.specs,
            input_routers,
            intermediate_routers,
        })
    }
}

/// A [`MultiAggregator`] whose routing is resolved.
///
/// It implements [`Aggregator`] over a [`CompositeAccumulator`], so a combiner
/// drives it like any single aggregator and it can itself be nested in an
/// [`AggregatorSpec`]. The scratch records are owned by the instance; workers
/// folding keys concurrently each need their own.
#[derive(Debug)]
pub struct ResolvedMultiAggregator {
    specs: Vec<AggregatorSpec>,
    input_routers: Vec<FieldRouter>,
    intermediate_routers: Vec<FieldRouter>,
}

impl ResolvedMultiAggregator {
    pub fn specs(&self) -> &[AggregatorSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn memory_estimator(&self) -> CompositeMemoryEstimator {
        CompositeMemoryEstimator::new(
            self.specs
                .iter()
                .map(AggregatorSpec::memory_estimator)
                .collect(),
        )
    }

    /// Drops the routing state, e.g. to resolve against other schemas.
    pub fn into_unresolved(self) -> MultiAggregator {
        MultiAggregator { specs: self.specs }
    }

    fn check_width(&self, acc: &CompositeAccumulator) -> CombinerResult<()> {
        if acc.len() != self.specs.len() {
            return Err(CombinerError::CompositeWidthMismatch {
                expected: self.specs.len(),
                actual: acc.len(),
            });
        }
        Ok(())
    }
}

/// Records are folded into each entry in spec order. When an aggregator fails,
/// the entries before it have already folded the record, so an accumulator that
/// returned an error must be discarded.
impl Aggregator for ResolvedMultiAggregator {
    type Accumulator = CompositeAccumulator;

    fn initialize(&self) -> CompositeAccumulator {
        CompositeAccumulator {
            values: self
                .specs
                .iter()
                .map(|spec| spec.aggregator().initialize())
                .collect(),
        }
    }

    fn partial_aggregate(
        &mut self,
        acc: &mut CompositeAccumulator,
        record: &TupleEntry,
    ) -> CombinerResult<()> {
        self.check_width(acc)?;
        trace!(specs = self.specs.len(), "partial aggregate");
        for ((spec, router), value) in self
            .specs
            .iter_mut()
            .zip(self.input_routers.iter_mut())
            .zip(acc.values.iter_mut())
        {
            let routed = router.route(record)?;
            spec.aggregator_mut().partial_aggregate(value, routed)?;
        }
        Ok(())
    }

    fn to_partial_tuple(&self, acc: &CompositeAccumulator) -> CombinerResult<Tuple> {
        self.check_width(acc)?;
        let mut tuple = Tuple::new();
        for (spec, value) in self.specs.iter().zip(acc.values.iter()) {
            tuple.add_all(spec.aggregator().to_partial_tuple(value)?);
        }
        Ok(tuple)
    }

    fn final_aggregate(
        &mut self,
        acc: &mut CompositeAccumulator,
        partial: &TupleEntry,
    ) -> CombinerResult<()> {
        self.check_width(acc)?;
        trace!(specs = self.specs.len(), "final aggregate");
        for ((spec, router), value) in self
            .specs
            .iter_mut()
            .zip(self.intermediate_routers.iter_mut())
            .zip(acc.values.iter_mut())
        {
            let routed = router.route(partial)?;
            spec.aggregator_mut().final_aggregate(value, routed)?;
        }
        Ok(())
    }

    fn to_final_tuple(&self, acc: &CompositeAccumulator) -> CombinerResult<Tuple> {
        self.check_width(acc)?;
        let mut tuple = Tuple::new();
        for (spec, value) in self.specs.iter().zip(acc.values.iter()) {
            tuple.add_all(spec.aggregator().to_final_tuple(value)?);
        }
        Ok(tuple)
    }
}
