//! Core record types for the student record service
//!
//! A `Student` is the primary record. `ClassAssignment` and
//! `GradeLevelRecord` are denormalized dependents linked back to the
//! student by a typed foreign reference (`StudentId`). All three are
//! written together by the coordinator; none of the dependents has an
//! independent lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Student Identifier
// ============================================================================

/// Typed student identifier
///
/// Generated once at create time and immutable afterwards. Dependent
/// records carry the same typed identifier as their foreign reference,
/// so a malformed identifier is rejected at parse time instead of
/// silently matching nothing in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(Uuid);

impl StudentId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one read back from the store)
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an identifier from its string form
    pub fn parse(s: &str) -> Result<Self, InvalidStudentId> {
        Uuid::parse_str(s).map(Self).map_err(|_| InvalidStudentId {
            given: s.to_string(),
        })
    }

    /// Borrow the underlying UUID for store parameters
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StudentId {
    type Err = InvalidStudentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when a string does not parse as a student identifier
#[derive(Debug, Clone, thiserror::Error)]
#[error("'{given}' is not a valid student identifier")]
pub struct InvalidStudentId {
    pub given: String,
}

// ============================================================================
// Records
// ============================================================================

/// The authoritative student record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub grade_level: String,
    pub class_name: String,
}

impl Student {
    /// Build a student from submitted field values
    pub fn new(id: StudentId, fields: StudentFields) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            address: fields.address,
            grade_level: fields.grade_level,
            class_name: fields.class_name,
        }
    }
}

/// Denormalized class record for a student
///
/// The `id` is generated but never used for lookup; all access goes
/// through `student_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub id: Uuid,
    pub student_id: StudentId,
    pub class_name: String,
    pub grade_level: String,
}

impl ClassAssignment {
    /// Derive the class record from a student's current fields
    pub fn for_student(student: &Student) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: student.id,
            class_name: student.class_name.clone(),
            grade_level: student.grade_level.clone(),
        }
    }
}

/// Denormalized grade-level record for a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeLevelRecord {
    pub id: Uuid,
    pub student_id: StudentId,
    pub level: String,
}

impl GradeLevelRecord {
    /// Derive the grade-level record from a student's current fields
    pub fn for_student(student: &Student) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: student.id,
            level: student.grade_level.clone(),
        }
    }
}

// ============================================================================
// Request Payloads
// ============================================================================

/// Mutable field values submitted on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub class_name: String,
    pub grade_level: String,
}

/// Conjunctive search filter over student fields
///
/// Each present field is matched as a case-insensitive substring.
/// Absent fields are excluded from the filter entirely; an empty
/// filter matches every student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    pub class_name: Option<String>,
    pub grade_level: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SearchFilter {
    /// Drop empty-string terms so `?class_name=` behaves like an
    /// omitted parameter
    pub fn normalized(mut self) -> Self {
        for term in [
            &mut self.class_name,
            &mut self.grade_level,
            &mut self.first_name,
            &mut self.last_name,
        ] {
            if term.as_deref() == Some("") {
                *term = None;
            }
        }
        self
    }

    /// True when no terms are present
    pub fn is_empty(&self) -> bool {
        self.class_name.is_none()
            && self.grade_level.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }

    /// Evaluate the filter against a student record
    pub fn matches(&self, student: &Student) -> bool {
        contains_ci(&student.class_name, self.class_name.as_deref())
            && contains_ci(&student.grade_level, self.grade_level.as_deref())
            && contains_ci(&student.first_name, self.first_name.as_deref())
            && contains_ci(&student.last_name, self.last_name.as_deref())
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
