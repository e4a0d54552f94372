//! Model System - Static model descriptions and the schema registry
//!
//! - `core_trait`: the `Model` trait implemented on marker types
//! - `meta`: type-erased `ModelMeta` carried by records
//! - `schema`: model registry, morph map and relation descriptor cache
//! - `naming`: key and table naming conventions

pub mod core_trait;
pub mod meta;
pub mod naming;
pub mod schema;

pub use core_trait::Model;
pub use meta::ModelMeta;
pub use schema::Schema;
