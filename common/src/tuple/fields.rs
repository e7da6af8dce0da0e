use std::fmt::{Display, Formatter};
use std::sync::Arc;

use ahash::AHashMap;
use itertools::Itertools;

use crate::error::{TupleError, TupleResult};

/// An ordered set of unique field names describing the layout of a tuple.
///
/// Cloning is cheap; the name list and lookup table are shared.
#[derive(Debug, Clone)]
pub struct Fields {
    names: Arc<[String]>,
    index: Arc<AHashMap<String, usize>>,
}

impl Fields {
    pub fn new<I, S>(names: I) -> TupleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = AHashMap::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(TupleError::EmptyFieldName);
            }
            if index.insert(name.clone(), pos).is_some() {
                return Err(TupleError::DuplicateField(name.clone()));
            }
        }
        Ok(Self {
            names: names.into(),
            index: Arc::new(index),
        })
    }

    pub fn empty() -> Self {
        Self {
            names: Arc::from(Vec::<String>::new()),
            index: Arc::new(AHashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of `name` in this schema.
    pub fn pos(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Resolves every name of `selector`, in order, to its position in this schema.
    pub fn select(&self, selector: &Fields) -> TupleResult<Vec<usize>> {
        selector
            .iter()
            .map(|name| {
                self.pos(name).ok_or_else(|| TupleError::UnknownField {
                    field: name.to_string(),
                    schema: self.to_string(),
                })
            })
            .collect()
    }

    /// Concatenates two schemas. Names must remain unique across both.
    pub fn append(&self, other: &Fields) -> TupleResult<Fields> {
        Fields::new(self.iter().chain(other.iter()))
    }
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.names, &other.names) || self.names == other.names
    }
}

impl Eq for Fields {}

impl Display for Fields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::Fields;
    use crate::error::TupleError;

    #[test]
    fn test_pos_and_select() {
        let schema = Fields::new(["key", "x", "y"]).unwrap();
        assert_eq!(schema.pos("y"), Some(2));
        assert_eq!(schema.pos("z"), None);

        let selector = Fields::new(["y", "key"]).unwrap();
        assert_eq!(schema.select(&selector).unwrap(), vec![2, 0]);
    }

    #[test]
    fn test_select_unknown_field() {
        let schema = Fields::new(["key", "x"]).unwrap();
        let selector = Fields::new(["w"]).unwrap();
        assert_eq!(
            schema.select(&selector),
            Err(TupleError::UnknownField {
                field: "w".to_string(),
                schema: "key, x".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        assert_eq!(
            Fields::new(["a", "b", "a"]),
            Err(TupleError::DuplicateField("a".to_string()))
        );
        assert_eq!(Fields::new(["a", ""]), Err(TupleError::EmptyFieldName));
    }

    #[test]
    fn test_append() {
        let a = Fields::new(["a"]).unwrap();
        let b = Fields::new(["b", "c"]).unwrap();
        assert_eq!(a.append(&b).unwrap(), Fields::new(["a", "b", "c"]).unwrap());
        assert!(a.append(&a).is_err());
    }
}
