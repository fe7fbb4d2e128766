//! Paginators and the request context used to build their URLs

pub mod cursor;
pub mod links;
pub mod paginator;
pub mod request;

pub use cursor::CursorPaginator;
pub use links::Link;
pub use paginator::Paginator;
pub use request::{PageUrl, RequestContext, StaticRequest};
