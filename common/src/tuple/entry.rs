use super::{Fields, Tuple, Value};
use crate::error::{TupleError, TupleResult};

/// A tuple paired with the schema describing its positions.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleEntry {
    fields: Fields,
    tuple: Tuple,
}

impl TupleEntry {
    pub fn new(fields: Fields, tuple: Tuple) -> TupleResult<Self> {
        if fields.len() != tuple.len() {
            return Err(TupleError::WidthMismatch {
                expected: fields.len(),
                actual: tuple.len(),
            });
        }
        Ok(Self { fields, tuple })
    }

    /// An entry of nulls shaped like `fields`.
    pub fn scratch(fields: Fields) -> Self {
        let tuple = Tuple::size(fields.len());
        Self { fields, tuple }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn tuple(&self) -> &Tuple {
        &self.tuple
    }

    pub fn len(&self) -> usize {
        self.tuple.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuple.is_empty()
    }

    pub fn get(&self, pos: usize) -> TupleResult<&Value> {
        self.tuple.get(pos).ok_or(TupleError::PositionOutOfRange {
            pos,
            width: self.tuple.len(),
        })
    }

    pub fn get_by_name(&self, name: &str) -> TupleResult<&Value> {
        let pos = self.fields.pos(name).ok_or_else(|| TupleError::UnknownField {
            field: name.to_string(),
            schema: self.fields.to_string(),
        })?;
        self.get(pos)
    }

    pub fn set(&mut self, pos: usize, value: Value) -> TupleResult<()> {
        self.tuple.set(pos, value)
    }

    pub fn values(&self) -> &[Value] {
        self.tuple.values()
    }

    pub fn into_tuple(self) -> Tuple {
        self.tuple
    }
}

#[cfg(test)]
mod tests {
    use super::TupleEntry;
    use crate::error::TupleError;
    use crate::tuple;
    use crate::tuple::{Fields, Value};

    #[test]
    fn test_width_must_match_schema() {
        let fields = Fields::new(["a", "b"]).unwrap();
        assert_eq!(
            TupleEntry::new(fields, tuple![1]),
            Err(TupleError::WidthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_scratch_and_set() {
        let fields = Fields::new(["a", "b"]).unwrap();
        let mut entry = TupleEntry::scratch(fields);
        assert_eq!(entry.values(), &[Value::Null, Value::Null]);

        entry.set(1, Value::Int(4)).unwrap();
        assert_eq!(entry.get_by_name("b").unwrap(), &Value::Int(4));
        assert!(entry.set(2, Value::Int(0)).is_err());
    }
}
