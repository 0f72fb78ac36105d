//! Type-erased values.
//!
//! Every value that flows through resolution (request attributes, route
//! arguments, container services, extra arguments) is carried as a
//! [`Value`]: an `Arc`-shared payload tagged with its [`TypeTag`]. Type
//! matching is done by tag equality, never by introspecting the payload.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a concrete Rust type.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A shared, type-tagged value.
///
/// # Example
///
/// ```
/// use wirebind_core::{TypeTag, Value};
///
/// let value = Value::new(42_u32);
/// assert!(value.is::<u32>());
/// assert_eq!(value.tag(), TypeTag::of::<u32>());
/// assert_eq!(value.downcast_ref::<u32>(), Some(&42));
///
/// let text = Value::from("hello");
/// assert_eq!(text.as_str(), Some("hello"));
/// ```
#[derive(Clone)]
pub struct Value {
    tag: TypeTag,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Value {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Wraps an already shared value without adding another `Arc` layer.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            inner: value,
        }
    }

    /// Returns the type tag of the payload.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Returns `true` if the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.tag == TypeTag::of::<T>()
    }

    /// Borrows the payload as a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Returns the shared payload as an `Arc<T>`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast().ok()
    }

    /// Borrows a `String` payload as `&str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }

    /// Returns `true` if both values share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.debug_tuple("Value").field(&text).finish(),
            None => f.debug_tuple("Value").field(&self.tag).finish(),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        id: u64,
    }

    #[test]
    fn test_tag_equality_ignores_payload() {
        assert_eq!(TypeTag::of::<Item>(), Value::new(Item { id: 1 }).tag());
        assert_ne!(TypeTag::of::<Item>(), TypeTag::of::<String>());
    }

    #[test]
    fn test_downcast() {
        let value = Value::new(Item { id: 7 });
        assert_eq!(value.downcast_ref::<Item>(), Some(&Item { id: 7 }));
        assert!(value.downcast_ref::<String>().is_none());

        let shared = value.downcast::<Item>().unwrap();
        assert_eq!(shared.id, 7);
    }

    #[test]
    fn test_from_arc_shares_allocation() {
        let item = Arc::new(Item { id: 3 });
        let value = Value::from_arc(item.clone());
        let back = value.downcast::<Item>().unwrap();
        assert!(Arc::ptr_eq(&item, &back));
        assert!(value.ptr_eq(&value.clone()));
    }

    #[test]
    fn test_debug_shows_strings() {
        assert_eq!(format!("{:?}", Value::from("abc")), "Value(\"abc\")");
        assert!(format!("{:?}", Value::new(1_u8)).contains("u8"));
    }
}
