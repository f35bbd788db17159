//! In-memory store backend
//!
//! Backs the coordinator tests without a database. Behaves like the
//! PostgreSQL backend observable from the trait: matched counts, no
//! cross-collection atomicity, store-default (unspecified) ordering.
//!
//! Failure injection: `fail_once("insert_class")` makes the next call
//! to that method fail, which is how the partial-failure paths of the
//! coordinator are exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use crate::models::{
    ClassAssignment, GradeLevelRecord, SearchFilter, Student, StudentFields, StudentId,
};

use super::{StoreError, StoreResult, StudentStore};

/// In-process implementation of [`StudentStore`]
pub struct MemoryStudentStore {
    students: RwLock<HashMap<StudentId, Student>>,
    grade_levels: RwLock<Vec<GradeLevelRecord>>,
    classes: RwLock<Vec<ClassAssignment>>,
    failures: Mutex<HashSet<&'static str>>,
}

impl MemoryStudentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            students: RwLock::new(HashMap::new()),
            grade_levels: RwLock::new(Vec::new()),
            classes: RwLock::new(Vec::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Arm a one-shot failure for the named store method
    pub fn fail_once(&self, method: &'static str) {
        self.failures.lock().unwrap().insert(method);
    }

    /// Number of student records
    pub fn student_count(&self) -> usize {
        self.students.read().unwrap().len()
    }

    /// Number of grade-level records
    pub fn grade_level_count(&self) -> usize {
        self.grade_levels.read().unwrap().len()
    }

    /// Number of class records
    pub fn class_count(&self) -> usize {
        self.classes.read().unwrap().len()
    }

    fn trip(&self, method: &'static str) -> StoreResult<()> {
        if self.failures.lock().unwrap().remove(method) {
            return Err(StoreError::Unavailable(format!(
                "injected failure in {method}"
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStudentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn insert_student(&self, student: &Student) -> StoreResult<()> {
        self.trip("insert_student")?;
        self.students
            .write()
            .unwrap()
            .insert(student.id, student.clone());
        Ok(())
    }

    async fn update_student(&self, id: StudentId, fields: &StudentFields) -> StoreResult<u64> {
        self.trip("update_student")?;
        let mut students = self.students.write().unwrap();
        match students.get_mut(&id) {
            Some(student) => {
                *student = Student::new(id, fields.clone());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_student(&self, id: StudentId) -> StoreResult<u64> {
        self.trip("delete_student")?;
        let removed = self.students.write().unwrap().remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        self.trip("find_student")?;
        Ok(self.students.read().unwrap().get(&id).cloned())
    }

    async fn search_students(&self, filter: &SearchFilter) -> StoreResult<Vec<Student>> {
        self.trip("search_students")?;
        Ok(self
            .students
            .read()
            .unwrap()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn insert_grade_level(&self, record: &GradeLevelRecord) -> StoreResult<()> {
        self.trip("insert_grade_level")?;
        self.grade_levels.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_grade_level(&self, student_id: StudentId, level: &str) -> StoreResult<u64> {
        self.trip("update_grade_level")?;
        let mut records = self.grade_levels.write().unwrap();
        let mut matched = 0;
        for record in records.iter_mut().filter(|r| r.student_id == student_id) {
            record.level = level.to_string();
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete_grade_level(&self, student_id: StudentId) -> StoreResult<u64> {
        self.trip("delete_grade_level")?;
        let mut records = self.grade_levels.write().unwrap();
        let before = records.len();
        records.retain(|r| r.student_id != student_id);
        Ok((before - records.len()) as u64)
    }

    async fn find_grade_level(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Option<GradeLevelRecord>> {
        self.trip("find_grade_level")?;
        Ok(self
            .grade_levels
            .read()
            .unwrap()
            .iter()
            .find(|r| r.student_id == student_id)
            .cloned())
    }

    async fn insert_class(&self, record: &ClassAssignment) -> StoreResult<()> {
        self.trip("insert_class")?;
        self.classes.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_class(
        &self,
        student_id: StudentId,
        class_name: &str,
        grade_level: &str,
    ) -> StoreResult<u64> {
        self.trip("update_class")?;
        let mut records = self.classes.write().unwrap();
        let mut matched = 0;
        for record in records.iter_mut().filter(|r| r.student_id == student_id) {
            record.class_name = class_name.to_string();
            record.grade_level = grade_level.to_string();
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete_class(&self, student_id: StudentId) -> StoreResult<u64> {
        self.trip("delete_class")?;
        let mut records = self.classes.write().unwrap();
        let before = records.len();
        records.retain(|r| r.student_id != student_id);
        Ok((before - records.len()) as u64)
    }

    async fn find_class(&self, student_id: StudentId) -> StoreResult<Option<ClassAssignment>> {
        self.trip("find_class")?;
        Ok(self
            .classes
            .read()
            .unwrap()
            .iter()
            .find(|r| r.student_id == student_id)
            .cloned())
    }
}
