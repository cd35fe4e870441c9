//! Storage layer for the shop ordering core.
//!
//! Defines the repository traits the services run against and an
//! in-memory implementation. The atomicity guarantees the order engine
//! relies on (conditional stock decrement, optimistic status updates)
//! are part of the trait contracts, so any future backing store (SQL,
//! document store) must provide them too.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{CartStore, OrderStore, ProductStore, StockClaim, Store};
