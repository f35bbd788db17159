//! myeongbu - Student Record Service
//!
//! A record-management service exposing CRUD and search over students
//! and their denormalized class and grade-level records.
//!
//! # Architecture
//!
//! The library is organized into a few modules:
//!
//! - [`coordinator`] - Cross-collection record coordination and the REST API
//! - [`models`] - Core record types and identifiers
//! - [`store`] - Storage backends (PostgreSQL, in-memory)
//! - [`error`] - Unified error handling
//!
//! The three collections (students, grade_levels, classes) are written
//! independently, in a fixed order, with no spanning transaction. The
//! coordinator reports partial failures distinctly so a reader of the
//! error knows which collections committed.
//!
//! # Example
//!
//! ```no_run
//! use myeongbu::coordinator::{RecordServer, ServiceConfig};
//! use myeongbu::store::PostgresStudentStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env()?;
//!     let store = PostgresStudentStore::connect(&config.database_url, config.pool_size)?;
//!     store.init_schema().await?;
//!     let server = RecordServer::new(config, Arc::new(store))?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod models;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::coordinator::{RecordCoordinator, RecordServer, ServiceConfig};
    pub use crate::error::{Error, RecordStep, Result};
    pub use crate::models::{
        ClassAssignment, GradeLevelRecord, SearchFilter, Student, StudentFields, StudentId,
    };
    pub use crate::store::{
        MemoryStudentStore, PostgresStudentStore, SharedStudentStore, StudentStore,
    };
}

// Direct re-exports for convenience
pub use models::{Student, StudentId};
