//! Database layer: initialization, schema, models, and recall persistence

pub mod init;
pub mod models;
pub mod recalls;

pub use init::{create_schema, init_database, init_memory_database};
pub use models::{
    Classification, Recall, RecallFilters, RecallRow, RecallStats, SearchPage, Source,
};
