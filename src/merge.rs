//! Assembly of the field list and tag map for one record.

use crate::context::Context;
use crate::field::Field;
use crate::registry::FieldRegistry;
use std::collections::BTreeMap;

/// Key/value tags derived from a merge, keys unique.
pub type TagMap = BTreeMap<String, String>;

/// Output of [`merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Merged {
    /// All fields in merge order. May contain repeated keys.
    pub fields: Vec<Field>,
    /// Tags keyed by field key; the last source to set a key wins.
    pub tags: TagMap,
}

/// Combine call-site fields, the context's field store and registry
/// lookups into one record's fields.
///
/// Order is call-site, then context fields, then registry keys in
/// registration order. Registry keys resolve against the context's request
/// values and are skipped when absent, not a string, or empty.
pub fn merge(ctx: &Context, registry: &FieldRegistry, call_site: &[Field]) -> Merged {
    let keys = registry.snapshot();
    let capacity = call_site.len() + ctx.fields().len() + keys.len();
    let mut fields = Vec::with_capacity(capacity);
    let mut tags = TagMap::new();

    for field in call_site.iter().chain(ctx.fields().iter()) {
        tags.insert(field.key.clone(), field.tag_value());
        fields.push(field.clone());
    }

    for key in keys.iter() {
        if let Some(value) = ctx.str_value(key).filter(|v| !v.is_empty()) {
            tags.insert(key.clone(), value.to_string());
            fields.push(Field::str(key.as_str(), value));
        }
    }

    Merged { fields, tags }
}
