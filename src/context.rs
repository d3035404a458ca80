use crate::field::Field;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Immutable, append-only list of fields carried by a [`Context`].
///
/// Stored as a chain of shared nodes with the newest field at the head.
/// Appending allocates one node and never touches the parent chain, so a
/// store can be cloned and shared across tasks freely.
#[derive(Clone, Default)]
pub struct FieldStore {
    head: Option<Arc<FieldNode>>,
    len: usize,
}

struct FieldNode {
    field: Field,
    parent: Option<Arc<FieldNode>>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new store with `field` appended; `self` is unchanged.
    pub fn push(&self, field: Field) -> FieldStore {
        FieldStore {
            head: Some(Arc::new(FieldNode {
                field,
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fields in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        let mut newest_first = Vec::with_capacity(self.len);
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            newest_first.push(&n.field);
            node = n.parent.as_deref();
        }
        newest_first.into_iter().rev()
    }
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

struct ValueNode {
    key: String,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<ValueNode>>,
}

/// Request-scoped, immutable logging context.
///
/// A context carries two things: the [`FieldStore`] built up with
/// [`Context::with_field`], and arbitrary typed request values set with
/// [`Context::with_value`]. The latter are what registry keys resolve
/// against at merge time.
///
/// Every `with_*` call returns a new context. Ancestors never observe
/// additions made on descendants, and sibling contexts derived from the
/// same parent do not interfere with each other.
///
/// ```
/// use fieldlog::context::Context;
///
/// let root = Context::new().with_value("userID", "u-1".to_string());
/// let child = root.with_field("order", "42");
/// assert_eq!(child.fields().len(), 1);
/// assert!(root.fields().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Context {
    fields: FieldStore,
    values: Option<Arc<ValueNode>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context whose field store has `(key, value)` appended.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<String>) -> Context {
        Context {
            fields: self.fields.push(Field::str(key, value)),
            values: self.values.clone(),
        }
    }

    /// Derive a context carrying a typed request value under `key`.
    ///
    /// A later value under the same key shadows earlier ones.
    pub fn with_value<T>(&self, key: impl Into<String>, value: T) -> Context
    where
        T: Any + Send + Sync,
    {
        Context {
            fields: self.fields.clone(),
            values: Some(Arc::new(ValueNode {
                key: key.into(),
                value: Arc::new(value),
                parent: self.values.clone(),
            })),
        }
    }

    /// Look up the nearest value stored under `key`.
    ///
    /// Returns `None` when the key is absent or the stored value is not a `T`.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        let mut node = self.values.as_deref();
        while let Some(n) = node {
            if n.key == key {
                return n.value.downcast_ref::<T>();
            }
            node = n.parent.as_deref();
        }
        None
    }

    /// String lookup used by the registry: accepts `String` and
    /// `&'static str` values.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value::<String>(key)
            .map(String::as_str)
            .or_else(|| self.value::<&'static str>(key).copied())
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_field_appends_in_call_order() {
        let ctx = Context::new()
            .with_field("a", "1")
            .with_field("b", "2")
            .with_field("c", "3");

        let keys: Vec<_> = ctx.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(ctx.fields().len(), 3);
    }

    #[test]
    fn parent_is_not_affected_by_child() {
        let parent = Context::new().with_field("a", "1");
        let child = parent.with_field("b", "2");

        assert_eq!(parent.fields().len(), 1);
        assert_eq!(child.fields().len(), 2);
    }

    #[test]
    fn siblings_do_not_interfere() {
        let parent = Context::new().with_field("root", "r");
        let left = parent.with_field("side", "left");
        let right = parent.with_field("side", "right");

        let last = |ctx: &Context| ctx.fields().iter().last().cloned();
        assert_eq!(last(&left), Some(Field::str("side", "left")));
        assert_eq!(last(&right), Some(Field::str("side", "right")));
    }

    #[test]
    fn value_lookup_is_typed() {
        let ctx = Context::new()
            .with_value("userID", "u-1".to_string())
            .with_value("attempt", 3u32);

        assert_eq!(ctx.str_value("userID"), Some("u-1"));
        assert_eq!(ctx.value::<u32>("attempt"), Some(&3));
        assert_eq!(ctx.str_value("attempt"), None);
        assert_eq!(ctx.str_value("missing"), None);
    }

    #[test]
    fn static_str_values_are_strings_too() {
        let ctx = Context::new().with_value("clientID", "web");
        assert_eq!(ctx.str_value("clientID"), Some("web"));
    }

    #[test]
    fn later_values_shadow_earlier_ones() {
        let ctx = Context::new()
            .with_value("traceID", "t-1".to_string())
            .with_value("traceID", "t-2".to_string());
        assert_eq!(ctx.str_value("traceID"), Some("t-2"));
    }

    #[test]
    fn shadowing_with_foreign_type_hides_value() {
        let ctx = Context::new()
            .with_value("userID", "u-1".to_string())
            .with_value("userID", 7i64);
        assert_eq!(ctx.str_value("userID"), None);
    }
}
