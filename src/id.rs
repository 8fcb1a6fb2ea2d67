//! Code for handling IDs
use anyhow::{Result, ensure};
use indexmap::IndexMap;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        /// An ID type (e.g. `UnitID`, `StorageID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

/// Indicates that the struct has an ID field
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Implement the `HasID` trait for the given type, assuming it has a field called `id`
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// Collect items into a map keyed by their IDs, preserving order.
///
/// Returns an error if an ID is empty or appears more than once.
pub fn collect_by_id<ID, T, I>(items: I) -> Result<IndexMap<ID, T>>
where
    ID: IDLike,
    T: HasID<ID>,
    I: IntoIterator<Item = T>,
{
    let mut map = IndexMap::new();
    for item in items {
        let id = item.get_id().clone();
        let id_str: &str = id.borrow();
        ensure!(!id_str.trim().is_empty(), "IDs cannot be empty");
        ensure!(!map.contains_key(&id), "Duplicate ID found: {id}");
        map.insert(id, item);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    define_id_type!(GenericID);

    struct Record {
        id: GenericID,
    }
    define_id_getter!(Record, GenericID);

    fn records(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record { id: (*id).into() }).collect()
    }

    #[test]
    fn test_collect_by_id() {
        let map = collect_by_id(records(&["b", "a"])).unwrap();
        let ids: Vec<String> = map.keys().map(ToString::to_string).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_collect_by_id_duplicate() {
        assert!(collect_by_id(records(&["a", "a"])).is_err());
    }

    #[test]
    fn test_collect_by_id_empty() {
        assert!(collect_by_id(records(&[" "])).is_err());
    }
}
