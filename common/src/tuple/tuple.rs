use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::{TupleError, TupleResult};

/// An ordered, positional list of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tuple of `n` nulls, used as a reusable scratch record.
    pub fn size(n: usize) -> Self {
        Self {
            values: vec![Value::Null; n],
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Value> {
        self.values.get(pos)
    }

    pub fn set(&mut self, pos: usize, value: Value) -> TupleResult<()> {
        let width = self.values.len();
        match self.values.get_mut(pos) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TupleError::PositionOutOfRange { pos, width }),
        }
    }

    pub fn add(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Appends every value of `other`, preserving order.
    pub fn add_all(&mut self, other: Tuple) {
        self.values.extend(other.values);
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Index<usize> for Tuple {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Tuple {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Builds a [`Tuple`] from a list of expressions convertible into [`Value`].
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::tuple::Tuple::new()
    };
    ($($v:expr),+ $(,)?) => {
        $crate::tuple::Tuple::from(vec![$($crate::tuple::Value::from($v)),+])
    };
}
