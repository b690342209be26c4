//! Batch side of the rating pipeline: typed game records, rating store and
//! game record file I/O, the per-period engine invocation and the
//! period-to-period chaining that feeds each period's output ratings into
//! the next period.

pub mod chain;
pub mod config;
pub mod engine;
pub mod player;
pub mod record;
pub mod store;
