//! Stock aggregation algorithms usable in an [`AggregatorSpec`](crate::AggregatorSpec).

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use combiner_common::tuple::{TupleEntry, Value};

use crate::combiner_error::{CombinerError, CombinerResult};
use crate::spec::AggregatorSpec;

mod avg;
mod count;
mod distinct;
mod min_max;
mod sum;

pub use avg::*;
pub use count::*;
pub use distinct::*;
pub use min_max::*;
pub use sum::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum AggregatorKind {
    /// arithmetic mean of a numeric field
    Avg,
    /// number of records
    Count,
    /// approximate number of distinct values (HyperLogLog)
    Distinct,
    Max,
    Min,
    /// sum of a numeric field
    Sum,
}

impl AggregatorKind {
    pub const fn name(&self) -> &'static str {
        use AggregatorKind::*;
        match self {
            Avg => "avg",
            Count => "count",
            Distinct => "distinct",
            Max => "max",
            Min => "min",
            Sum => "sum",
        }
    }

    /// Number of values in the partial tuple, i.e. the intermediate fields a spec needs.
    pub const fn partial_width(&self) -> usize {
        match self {
            AggregatorKind::Avg => 2,
            _ => 1,
        }
    }

    /// Builds a spec for this aggregator with its memory estimator attached.
    ///
    /// Fails when the number of intermediate fields differs from
    /// [`partial_width`](AggregatorKind::partial_width).
    pub fn spec<I, S, J, T>(
        self,
        input_fields: I,
        intermediate_fields: J,
    ) -> CombinerResult<AggregatorSpec>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let intermediate_fields: Vec<String> =
            intermediate_fields.into_iter().map(Into::into).collect();
        if !intermediate_fields.is_empty() && intermediate_fields.len() != self.partial_width() {
            return Err(CombinerError::ArityMismatch {
                aggregator: self.name(),
                expected: self.partial_width(),
                actual: intermediate_fields.len(),
            });
        }

        macro_rules! stock {
            ($agg:expr) => {
                AggregatorSpec::builder($agg)
                    .input_fields(input_fields)
                    .intermediate_fields(intermediate_fields)
                    .memory_estimator($agg)
                    .build()
            };
        }

        match self {
            AggregatorKind::Avg => stock!(AvgAggregator),
            AggregatorKind::Count => stock!(CountAggregator),
            AggregatorKind::Distinct => stock!(DistinctAggregator),
            AggregatorKind::Max => stock!(MaxAggregator),
            AggregatorKind::Min => stock!(MinAggregator),
            AggregatorKind::Sum => stock!(SumAggregator),
        }
    }
}

impl Display for AggregatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AggregatorKind {
    type Err = CombinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "avg" => Ok(AggregatorKind::Avg),
            "count" => Ok(AggregatorKind::Count),
            "distinct" | "approx_distinct" => Ok(AggregatorKind::Distinct),
            "max" => Ok(AggregatorKind::Max),
            "min" => Ok(AggregatorKind::Min),
            "sum" => Ok(AggregatorKind::Sum),
            _ => Err(CombinerError::UnknownAggregator(s.to_string())),
        }
    }
}

impl TryFrom<&str> for AggregatorKind {
    type Error = CombinerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

pub(crate) fn expect_arity(
    aggregator: &'static str,
    record: &TupleEntry,
    expected: usize,
) -> CombinerResult<()> {
    if record.len() != expected {
        return Err(CombinerError::ArityMismatch {
            aggregator,
            expected,
            actual: record.len(),
        });
    }
    Ok(())
}

pub(crate) fn type_mismatch(
    aggregator: &'static str,
    record: &TupleEntry,
    pos: usize,
    expected: &'static str,
    actual: &Value,
) -> CombinerError {
    let field = record
        .fields()
        .names()
        .get(pos)
        .cloned()
        .unwrap_or_default();
    CombinerError::TypeMismatch {
        aggregator,
        field,
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;
    use test_case::test_case;

    use super::AggregatorKind;
    use crate::combiner_error::CombinerError;

    #[test_case("sum", AggregatorKind::Sum)]
    #[test_case("COUNT", AggregatorKind::Count)]
    #[test_case("approx_distinct", AggregatorKind::Distinct)]
    fn test_parse_kind(name: &str, expected: AggregatorKind) {
        assert_eq!(name.parse::<AggregatorKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            AggregatorKind::try_from("median"),
            Err(CombinerError::UnknownAggregator("median".to_string()))
        );
    }

    #[test]
    fn test_names_round_trip() {
        for kind in AggregatorKind::iter() {
            assert_eq!(kind.to_string().parse::<AggregatorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_spec_checks_intermediate_width() {
        for kind in AggregatorKind::iter() {
            let fields: Vec<String> = (0..kind.partial_width()).map(|i| format!("p{i}")).collect();
            assert!(kind.spec(["v"], fields).is_ok());
        }
        assert_eq!(
            AggregatorKind::Sum.spec(["x"], ["a", "b"]).unwrap_err(),
            CombinerError::ArityMismatch {
                aggregator: "sum",
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(
            AggregatorKind::Avg.spec(["x"], ["x_sum"]).unwrap_err(),
            CombinerError::ArityMismatch {
                aggregator: "avg",
                expected: 2,
                actual: 1
            }
        );
    }
}
