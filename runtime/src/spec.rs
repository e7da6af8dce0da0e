use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use combiner_common::tuple::Fields;

use crate::aggregator::{Aggregator, DynAggregator, ErasedAggregator};
use crate::combiner_error::{CombinerError, CombinerResult};
use crate::memory::{DynMemoryEstimator, ErasedEstimator, MemoryUsageEstimator};

/// Binds one aggregator to the fields it consumes.
///
/// `input_fields` are read from raw records, `intermediate_fields` from partial
/// records during the merge. Both are fixed once the spec is built. The spec
/// exclusively owns its aggregator.
pub struct AggregatorSpec {
    input_fields: Fields,
    intermediate_fields: Fields,
    aggregator: Box<dyn DynAggregator>,
    memory_estimator: Option<Arc<dyn DynMemoryEstimator>>,
}

impl AggregatorSpec {
    pub fn builder<A>(aggregator: A) -> AggregatorSpecBuilder<A>
    where
        A: Aggregator + Send + 'static,
        A::Accumulator: Send + 'static,
    {
        AggregatorSpecBuilder {
            aggregator,
            input_fields: vec![],
            intermediate_fields: vec![],
            memory_estimator: None,
        }
    }

    pub fn input_fields(&self) -> &Fields {
        &self.input_fields
    }

    pub fn intermediate_fields(&self) -> &Fields {
        &self.intermediate_fields
    }

    pub fn has_memory_estimator(&self) -> bool {
        self.memory_estimator.is_some()
    }

    /// Type name of the owned aggregator.
    pub fn aggregator_name(&self) -> &'static str {
        self.aggregator.name()
    }

    pub(crate) fn aggregator(&self) -> &dyn DynAggregator {
        self.aggregator.as_ref()
    }

    pub(crate) fn aggregator_mut(&mut self) -> &mut dyn DynAggregator {
        self.aggregator.as_mut()
    }

    pub(crate) fn memory_estimator(&self) -> Option<Arc<dyn DynMemoryEstimator>> {
        self.memory_estimator.clone()
    }
}

impl Debug for AggregatorSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorSpec")
            .field("aggregator", &self.aggregator_name())
            .field("input_fields", &self.input_fields)
            .field("intermediate_fields", &self.intermediate_fields)
            .field("memory_estimator", &self.has_memory_estimator())
            .finish()
    }
}

pub struct AggregatorSpecBuilder<A: Aggregator> {
    aggregator: A,
    input_fields: Vec<String>,
    intermediate_fields: Vec<String>,
    memory_estimator: Option<Arc<dyn DynMemoryEstimator>>,
}

impl<A> AggregatorSpecBuilder<A>
where
    A: Aggregator + Send + 'static,
    A::Accumulator: Send + 'static,
{
    pub fn input_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn intermediate_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intermediate_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn memory_estimator<E>(mut self, estimator: E) -> Self
    where
        E: MemoryUsageEstimator<A::Accumulator> + 'static,
        A::Accumulator: Any,
    {
        let estimator: Arc<dyn DynMemoryEstimator> =
            Arc::new(ErasedEstimator::<A::Accumulator, E>::new(estimator));
        self.memory_estimator = Some(estimator);
        self
    }

    pub fn build(self) -> CombinerResult<AggregatorSpec> {
        if self.input_fields.is_empty() {
            return Err(CombinerError::EmptyFields { kind: "input" });
        }
        if self.intermediate_fields.is_empty() {
            return Err(CombinerError::EmptyFields {
                kind: "intermediate",
            });
        }
        Ok(AggregatorSpec {
            input_fields: Fields::new(self.input_fields)?,
            intermediate_fields: Fields::new(self.intermediate_fields)?,
            aggregator: Box::new(ErasedAggregator(self.aggregator)),
            memory_estimator: self.memory_estimator,
        })
    }
}
