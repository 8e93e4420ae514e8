pub mod pagination;
pub mod sanitize;

pub use pagination::Paginator;
