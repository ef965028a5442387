//! Database access: pool, executor, row decoding.

mod executor;
pub mod pool;
pub mod row;

pub use pool::{Database, PoolCell, PoolConfig, RowCountPolicy, ScopedConnection};
