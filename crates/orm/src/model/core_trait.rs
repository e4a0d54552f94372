//! Core Model Trait - Static description of a record type
//!
//! A `Model` is implemented on a marker type and describes a table: its
//! name, key, soft-delete column, attribute casts and declared relations.
//! Records themselves are untyped; see `crate::record::Record`.

use crate::casts::CastType;
use crate::relationships::RelationRegistry;

/// Static description of a record type
pub trait Model: Send + Sync + 'static {
    /// Name the model is registered under
    fn model_name() -> &'static str;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Check if this model supports soft deletes
    fn uses_soft_deletes() -> bool {
        false
    }

    /// Column holding the soft-delete marker
    fn deleted_at_column() -> &'static str {
        "deleted_at"
    }

    /// Attribute casts applied by `Record::get`
    fn casts() -> Vec<(&'static str, CastType)> {
        Vec::new()
    }

    /// Declare this model's relations
    fn relations(_registry: &mut RelationRegistry) {}
}
