//! Cross-collection record coordination
//!
//! Every mutating operation touches the students collection first, then
//! grade_levels, then class records, in that fixed order. The store has
//! no multi-collection transaction, so each step commits on its own:
//! when a later step fails, the earlier writes stand and the operation
//! returns [`Error::Partial`] naming what committed and what did not.
//! Nothing is retried and nothing is rolled back.
//!
//! Each operation runs under a single time budget. A store call that
//! outlives the remaining budget is abandoned and treated like any
//! other store failure for that step.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::error::{Error, RecordStep, Result};
use crate::models::{
    ClassAssignment, GradeLevelRecord, SearchFilter, Student, StudentFields, StudentId,
};
use crate::store::{SharedStudentStore, StoreError, StoreResult};

/// Deadline shared by every store call of one operation
struct OperationBudget {
    deadline: Instant,
}

impl OperationBudget {
    fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now() + limit,
        }
    }

    async fn run<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if Instant::now() >= self.deadline {
            return Err(StoreError::Timeout);
        }
        match timeout_at(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

/// Coordinates writes across the students, grade_levels and classes
/// collections
///
/// Pure logic over a [`crate::store::StudentStore`]; the HTTP layer is a
/// thin mapping on top and never reaches the store directly.
pub struct RecordCoordinator {
    store: SharedStudentStore,
    op_timeout: Duration,
}

impl RecordCoordinator {
    /// Create a coordinator with the given per-operation time budget
    pub fn new(store: SharedStudentStore, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    /// Create a student and its two dependent records
    ///
    /// Insert order: student, grade level, class. A primary-insert
    /// failure creates nothing; a dependent-insert failure leaves the
    /// earlier inserts committed and reports a partial failure.
    pub async fn create(&self, fields: StudentFields) -> Result<Student> {
        let budget = OperationBudget::new(self.op_timeout);
        let student = Student::new(StudentId::generate(), fields);

        budget
            .run(self.store.insert_student(&student))
            .await
            .map_err(|e| Error::persistence("create student", e))?;

        let grade = GradeLevelRecord::for_student(&student);
        budget
            .run(self.store.insert_grade_level(&grade))
            .await
            .map_err(|e| {
                Error::partial("create", RecordStep::GradeLevel, vec![RecordStep::Student], e)
            })?;

        let class = ClassAssignment::for_student(&student);
        budget.run(self.store.insert_class(&class)).await.map_err(|e| {
            Error::partial(
                "create",
                RecordStep::Class,
                vec![RecordStep::Student, RecordStep::GradeLevel],
                e,
            )
        })?;

        tracing::info!(id = %student.id, "student created");
        Ok(student)
    }

    /// Update a student and propagate class/grade into the dependents
    ///
    /// A zero matched count on the primary update is not-found; on the
    /// dependents it is silently accepted (the dependents may never have
    /// existed and the current behavior does not detect that).
    pub async fn update(&self, id: &str, fields: StudentFields) -> Result<()> {
        let id = StudentId::parse(id)?;
        let budget = OperationBudget::new(self.op_timeout);

        let matched = budget
            .run(self.store.update_student(id, &fields))
            .await
            .map_err(|e| Error::persistence("update student", e))?;
        if matched == 0 {
            return Err(Error::not_found("student"));
        }

        budget
            .run(self.store.update_grade_level(id, &fields.grade_level))
            .await
            .map_err(|e| {
                Error::partial("update", RecordStep::GradeLevel, vec![RecordStep::Student], e)
            })?;

        budget
            .run(
                self.store
                    .update_class(id, &fields.class_name, &fields.grade_level),
            )
            .await
            .map_err(|e| {
                Error::partial(
                    "update",
                    RecordStep::Class,
                    vec![RecordStep::Student, RecordStep::GradeLevel],
                    e,
                )
            })?;

        tracing::info!(id = %id, "student updated");
        Ok(())
    }

    /// Delete a student and its dependent records
    ///
    /// Delete order: student, grade level, class. Zero-match deletes are
    /// not errors; "nothing existed" and "one record removed" are not
    /// distinguished. A failing step aborts the sequence and earlier
    /// deletes stand.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = StudentId::parse(id)?;
        let budget = OperationBudget::new(self.op_timeout);

        budget
            .run(self.store.delete_student(id))
            .await
            .map_err(|e| Error::persistence("delete student", e))?;

        budget
            .run(self.store.delete_grade_level(id))
            .await
            .map_err(|e| {
                Error::partial("delete", RecordStep::GradeLevel, vec![RecordStep::Student], e)
            })?;

        budget.run(self.store.delete_class(id)).await.map_err(|e| {
            Error::partial(
                "delete",
                RecordStep::Class,
                vec![RecordStep::Student, RecordStep::GradeLevel],
                e,
            )
        })?;

        tracing::info!(id = %id, "student deleted");
        Ok(())
    }

    /// Point lookup of a student by identifier
    pub async fn get(&self, id: &str) -> Result<Student> {
        let id = StudentId::parse(id)?;
        let budget = OperationBudget::new(self.op_timeout);

        budget
            .run(self.store.find_student(id))
            .await
            .map_err(|e| Error::persistence("get student", e))?
            .ok_or_else(|| Error::not_found("student"))
    }

    /// First class record referencing the student
    pub async fn class_for(&self, id: &str) -> Result<ClassAssignment> {
        let id = StudentId::parse(id)?;
        let budget = OperationBudget::new(self.op_timeout);

        budget
            .run(self.store.find_class(id))
            .await
            .map_err(|e| Error::persistence("get class", e))?
            .ok_or_else(|| Error::not_found("class"))
    }

    /// First grade-level record referencing the student
    pub async fn grade_level_for(&self, id: &str) -> Result<GradeLevelRecord> {
        let id = StudentId::parse(id)?;
        let budget = OperationBudget::new(self.op_timeout);

        budget
            .run(self.store.find_grade_level(id))
            .await
            .map_err(|e| Error::persistence("get grade level", e))?
            .ok_or_else(|| Error::not_found("grade level"))
    }

    /// Search students with a conjunctive substring filter
    ///
    /// Zero matches is reported as not-found, distinct from a query
    /// execution failure.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<Student>> {
        let filter = filter.normalized();
        let budget = OperationBudget::new(self.op_timeout);

        let students = budget
            .run(self.store.search_students(&filter))
            .await
            .map_err(|e| Error::persistence("search students", e))?;

        if students.is_empty() {
            return Err(Error::not_found("students"));
        }
        Ok(students)
    }
}

// ============================================================================
// Tests
// ============================================================================
