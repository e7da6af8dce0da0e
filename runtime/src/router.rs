use combiner_common::error::TupleError;
use combiner_common::tuple::{Fields, TupleEntry};

use crate::combiner_error::CombinerResult;

/// Projects the fields one aggregator consumes out of a wider source record.
///
/// Positions are resolved against the source schema once, at construction,
/// and the narrow scratch record is reused for every routed record. Records
/// must carry the schema the router was resolved against.
#[derive(Debug, Clone)]
pub(crate) struct FieldRouter {
    positions: Vec<usize>,
    source: Fields,
    scratch: TupleEntry,
}

impl FieldRouter {
    pub(crate) fn resolve(source_schema: &Fields, fields: &Fields) -> CombinerResult<Self> {
        let positions = source_schema.select(fields)?;
        Ok(Self {
            positions,
            source: source_schema.clone(),
            scratch: TupleEntry::scratch(fields.clone()),
        })
    }

    #[cfg(test)]
    pub(crate) fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Loads the routed fields of `source` into the scratch record and returns it.
    pub(crate) fn route(&mut self, source: &TupleEntry) -> CombinerResult<&TupleEntry> {
        if source.len() != self.source.len() {
            return Err(TupleError::WidthMismatch {
                expected: self.source.len(),
                actual: source.len(),
            }
            .into());
        }
        if *source.fields() != self.source {
            return Err(TupleError::SchemaMismatch {
                expected: self.source.to_string(),
                actual: source.fields().to_string(),
            }
            .into());
        }
        let values = source.values();
        for (i, &pos) in self.positions.iter().enumerate() {
            self.scratch.set(i, values[pos].clone())?;
        }
        Ok(&self.scratch)
    }
}

#[cfg(test)]
mod tests {
    use combiner_common::tuple;
    use combiner_common::tuple::{Fields, TupleEntry, Value};

    use combiner_common::error::TupleError;

    use super::FieldRouter;
    use crate::combiner_error::CombinerError;

    fn source(values: combiner_common::tuple::Tuple) -> TupleEntry {
        TupleEntry::new(Fields::new(["key", "x", "y", "z"]).unwrap(), values).unwrap()
    }

    #[test]
    fn test_route_projects_in_selector_order() {
        let schema = Fields::new(["key", "x", "y", "z"]).unwrap();
        let mut router = FieldRouter::resolve(&schema, &Fields::new(["z", "x"]).unwrap()).unwrap();
        assert_eq!(router.positions(), &[3, 1]);

        let routed = router.route(&source(tuple!["k", 1, 2, 3])).unwrap();
        assert_eq!(routed.values(), &[Value::Int(3), Value::Int(1)]);
        assert_eq!(routed.get_by_name("x").unwrap(), &Value::Int(1));
    }

    #[test]
    fn test_route_is_idempotent() {
        let schema = Fields::new(["key", "x", "y", "z"]).unwrap();
        let mut router = FieldRouter::resolve(&schema, &Fields::new(["y"]).unwrap()).unwrap();
        let record = source(tuple!["k", 1, 2, 3]);

        let first = router.route(&record).unwrap().clone();
        let positions = router.positions().to_vec();
        let second = router.route(&record).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(positions, router.positions());
    }

    #[test]
    fn test_resolve_unknown_field() {
        let schema = Fields::new(["key", "x"]).unwrap();
        let err = FieldRouter::resolve(&schema, &Fields::new(["nope"]).unwrap()).unwrap_err();
        assert!(matches!(err, CombinerError::Tuple(_)));
    }

    #[test]
    fn test_route_rejects_width_change() {
        let schema = Fields::new(["key", "x", "y", "z"]).unwrap();
        let mut router = FieldRouter::resolve(&schema, &Fields::new(["x"]).unwrap()).unwrap();
        let narrow = TupleEntry::new(Fields::new(["x"]).unwrap(), tuple![1]).unwrap();
        assert!(router.route(&narrow).is_err());
    }

    #[test]
    fn test_route_rejects_reordered_schema() {
        let schema = Fields::new(["key", "x", "y", "z"]).unwrap();
        let mut router = FieldRouter::resolve(&schema, &Fields::new(["x"]).unwrap()).unwrap();
        let reordered =
            TupleEntry::new(Fields::new(["key", "y", "x", "z"]).unwrap(), tuple!["k", 1, 2, 3])
                .unwrap();
        assert!(matches!(
            router.route(&reordered),
            Err(CombinerError::Tuple(TupleError::SchemaMismatch { .. }))
        ));
    }
}
