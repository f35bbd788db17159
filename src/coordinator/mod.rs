//! Record coordination and HTTP surface
//!
//! This module carries the heart of the service: given a student
//! identity and a set of field values, perform create/update/delete/read
//! across three related collections (students, classes, grade_levels)
//! so that each collection's copy of the shared fields tracks the
//! primary record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │           Record Server             │
//! │                                     │
//! │  ┌──────────────────────────────┐   │
//! │  │         REST API             │   │
//! │  │  POST   /students            │   │
//! │  │  GET    /students/{id}       │   │
//! │  │  PUT    /students/{id}       │   │
//! │  │  DELETE /students/{id}       │   │
//! │  │  GET    /class/{id}          │   │
//! │  │  GET    /grade-level/{id}    │   │
//! │  │  GET    /search-students     │   │
//! │  └──────────────┬───────────────┘   │
//! │                 ▼                   │
//! │  ┌──────────────────────────────┐   │
//! │  │      Record Coordinator      │   │
//! │  │  - fixed write order:        │   │
//! │  │    student → grade → class   │   │
//! │  │  - per-operation time budget │   │
//! │  │  - partial-failure reporting │   │
//! │  └──────────────┬───────────────┘   │
//! │                 ▼                   │
//! │          StudentStore trait         │
//! └─────────────────────────────────────┘
//! ```
//!
//! The collections are written without a spanning transaction; a later
//! step failing after an earlier one committed is surfaced as a
//! distinct partial-failure error rather than rolled back.
//!
//! # Usage
//!
//! ```ignore
//! use myeongbu::coordinator::{RecordServer, ServiceConfig};
//! use myeongbu::store::PostgresStudentStore;
//! use std::sync::Arc;
//!
//! let config = ServiceConfig::from_env()?;
//! let store = PostgresStudentStore::connect(&config.database_url, config.pool_size)?;
//! let server = RecordServer::new(config, Arc::new(store))?;
//! server.start().await?;
//! ```

pub mod api;
pub mod config;
pub mod records;
pub mod server;

// Re-export main types
pub use config::{ConfigError, ServiceConfig};
pub use records::RecordCoordinator;
pub use server::{AppState, RecordServer, ServerError};
