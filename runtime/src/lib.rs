extern crate combiner_common;

mod aggregator;
mod combiner_error;
mod config;
mod memory;
mod multi_aggregator;
mod router;
mod spec;

pub mod aggregators;

pub use aggregator::{Aggregator, BoxedAccumulator};
pub use combiner_error::*;
pub use config::*;
pub use memory::*;
pub use multi_aggregator::*;
pub use spec::*;

pub mod prelude {
    pub use crate::aggregators::*;
    pub use crate::{
        Aggregator, AggregatorSpec, CombinerConfig, CombinerError, CombinerResult,
        CompositeAccumulator, CompositeMemoryEstimator, MemoryUsageEstimator, MultiAggregator,
        ResolvedMultiAggregator,
    };
    pub use combiner_common::prelude::*;
}
