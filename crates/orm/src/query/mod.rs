//! Query Builder Module - fluent, parameterised SQL construction
//!
//! - `builder`: `QueryBuilder` struct and its state
//! - `select`, `where_clause`: chaining methods
//! - `sql_generation`: SQL compilation
//! - `execution`, `dml`, `pagination`: terminal operations

pub mod builder;
pub mod dml;
pub mod execution;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::{QueryBuilder, QueryState};
pub use types::{
    Boolean, CompiledQuery, Condition, Hydrate, IntoRow, OrderDirection, QueryOperator, Row,
};
