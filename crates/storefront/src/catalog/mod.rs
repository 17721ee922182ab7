//! Catalog query engine.
//!
//! Three independently toggled criteria (sort order, free-text filter,
//! promo-only flag) compose into a deterministic [`QueryKey`]. Every change
//! derives the key, fetches `GET /products/{key}`, and replaces the
//! displayed list wholesale with the response; responses racing each other
//! are resolved by issue order, not arrival order.

mod engine;
mod query;

pub use engine::Catalog;
pub use query::{FilterCriteria, OrderCriteria, QueryKey, SortDirection, SortField};
