//! Storage abstraction for the three record collections
//!
//! This module provides a trait-based store abstraction to decouple the
//! record coordinator from the storage implementation:
//! - [`PostgresStudentStore`] - production backend over a connection pool
//! - [`MemoryStudentStore`] - in-process backend for tests
//!
//! The trait exposes one method per collection operation. Each method is
//! a single independent statement against one collection; the store
//! deliberately offers no multi-collection transaction, so callers see
//! exactly the consistency model the coordinator documents.
//!
//! Matched counts are returned for updates and deletes. A zero count is
//! not an error at this layer; the coordinator decides what it means.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    ClassAssignment, GradeLevelRecord, SearchFilter, Student, StudentFields, StudentId,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStudentStore;
pub use postgres::PostgresStudentStore;

// ============================================================================
// Store Errors
// ============================================================================

/// Errors surfaced by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver-level database error
    #[error("database error: {0}")]
    Backend(#[from] tokio_postgres::Error),

    /// Connection pool error
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The operation outlived its time budget and was abandoned
    #[error("store operation timed out")]
    Timeout,

    /// Backend unreachable or refusing work
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Store Trait
// ============================================================================

/// Async store over the students, grade_levels and classes collections
#[async_trait]
pub trait StudentStore: Send + Sync {
    // --- students (primary) ---

    /// Insert a new student record
    async fn insert_student(&self, student: &Student) -> StoreResult<()>;

    /// Update all mutable fields of a student; returns the matched count
    async fn update_student(&self, id: StudentId, fields: &StudentFields) -> StoreResult<u64>;

    /// Delete a student by identifier; returns the matched count
    async fn delete_student(&self, id: StudentId) -> StoreResult<u64>;

    /// Point lookup by identifier
    async fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>>;

    /// Conjunctive case-insensitive substring search; an empty filter
    /// returns every student, in store-default order
    async fn search_students(&self, filter: &SearchFilter) -> StoreResult<Vec<Student>>;

    // --- grade_levels (dependent) ---

    /// Insert a grade-level record
    async fn insert_grade_level(&self, record: &GradeLevelRecord) -> StoreResult<()>;

    /// Set the level on all grade records referencing the student
    async fn update_grade_level(&self, student_id: StudentId, level: &str) -> StoreResult<u64>;

    /// Delete the grade records referencing the student
    async fn delete_grade_level(&self, student_id: StudentId) -> StoreResult<u64>;

    /// First grade record referencing the student, if any
    async fn find_grade_level(&self, student_id: StudentId)
        -> StoreResult<Option<GradeLevelRecord>>;

    // --- classes (dependent) ---

    /// Insert a class record
    async fn insert_class(&self, record: &ClassAssignment) -> StoreResult<()>;

    /// Set class name and grade on all class records referencing the student
    async fn update_class(
        &self,
        student_id: StudentId,
        class_name: &str,
        grade_level: &str,
    ) -> StoreResult<u64>;

    /// Delete the class records referencing the student
    async fn delete_class(&self, student_id: StudentId) -> StoreResult<u64>;

    /// First class record referencing the student, if any
    async fn find_class(&self, student_id: StudentId) -> StoreResult<Option<ClassAssignment>>;
}

/// Thread-safe shared store handle
pub type SharedStudentStore = Arc<dyn StudentStore>;
