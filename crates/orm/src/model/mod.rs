//! Model System - Active-Record layer over the query builder
//!
//! - `core_trait`: `Model` trait, metadata and attribute access
//! - `attributes`: current/original attribute snapshots
//! - `casts`: declarative attribute casts
//! - `crud_operations`: save, create, find, delete, refresh
//! - `query_methods`: builder proxies
//! - `relationships`: `has_many` / `belongs_to`
//! - `lifecycle`: event flows around writes

pub mod attributes;
pub mod casts;
pub mod core_trait;
pub mod crud_operations;
pub(crate) mod lifecycle;
pub mod query_methods;
pub mod relationships;

pub use attributes::Attributes;
pub use casts::Cast;
pub use core_trait::Model;
pub use crud_operations::{CrudOperations, SaveResult};
pub use query_methods::QueryMethods;
pub use relationships::Relationships;
