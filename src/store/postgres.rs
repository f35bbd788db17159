//! PostgreSQL store backend
//!
//! Uses a deadpool connection pool; each trait method checks out a
//! connection and runs a single statement. The three tables are written
//! independently with no transaction spanning them.

use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use async_trait::async_trait;

use crate::models::{
    ClassAssignment, GradeLevelRecord, SearchFilter, Student, StudentFields, StudentId,
};

use super::{StoreError, StoreResult, StudentStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id          UUID PRIMARY KEY,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    address     TEXT NOT NULL,
    grade_level TEXT NOT NULL,
    class_name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS grade_levels (
    id         UUID PRIMARY KEY,
    student_id UUID NOT NULL,
    level      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_grade_levels_student ON grade_levels(student_id);

CREATE TABLE IF NOT EXISTS classes (
    id          UUID PRIMARY KEY,
    student_id  UUID NOT NULL,
    class_name  TEXT NOT NULL,
    grade_level TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_classes_student ON classes(student_id);
"#;

/// PostgreSQL-backed implementation of [`StudentStore`]
pub struct PostgresStudentStore {
    pool: Pool,
}

impl PostgresStudentStore {
    /// Create the store with a connection pool for the given URL
    pub fn connect(database_url: &str, pool_size: usize) -> StoreResult<Self> {
        let mut cfg = PoolConfig::new();
        cfg.url = Some(database_url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(pool_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create the record tables if they do not exist
    pub async fn init_schema(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        tracing::info!("record schema initialized");
        Ok(())
    }
}

fn student_from_row(row: &Row) -> Student {
    Student {
        id: StudentId::from_uuid(row.get("id")),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        address: row.get("address"),
        grade_level: row.get("grade_level"),
        class_name: row.get("class_name"),
    }
}

fn grade_level_from_row(row: &Row) -> GradeLevelRecord {
    GradeLevelRecord {
        id: row.get("id"),
        student_id: StudentId::from_uuid(row.get("student_id")),
        level: row.get("level"),
    }
}

fn class_from_row(row: &Row) -> ClassAssignment {
    ClassAssignment {
        id: row.get("id"),
        student_id: StudentId::from_uuid(row.get("student_id")),
        class_name: row.get("class_name"),
        grade_level: row.get("grade_level"),
    }
}

/// Escapes LIKE metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[async_trait]
impl StudentStore for PostgresStudentStore {
    async fn insert_student(&self, student: &Student) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO students (id, first_name, last_name, address, grade_level, class_name)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    student.id.as_uuid(),
                    &student.first_name,
                    &student.last_name,
                    &student.address,
                    &student.grade_level,
                    &student.class_name,
                ],
            )
            .await?;
        Ok(())
    }

    async fn update_student(&self, id: StudentId, fields: &StudentFields) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                "UPDATE students
                 SET first_name = $2, last_name = $3, address = $4, grade_level = $5, class_name = $6
                 WHERE id = $1",
                &[
                    id.as_uuid(),
                    &fields.first_name,
                    &fields.last_name,
                    &fields.address,
                    &fields.grade_level,
                    &fields.class_name,
                ],
            )
            .await?;
        Ok(matched)
    }

    async fn delete_student(&self, id: StudentId) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute("DELETE FROM students WHERE id = $1", &[id.as_uuid()])
            .await?;
        Ok(matched)
    }

    async fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, first_name, last_name, address, grade_level, class_name
                 FROM students WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        Ok(row.as_ref().map(student_from_row))
    }

    async fn search_students(&self, filter: &SearchFilter) -> StoreResult<Vec<Student>> {
        let terms: [(&str, Option<&str>); 4] = [
            ("class_name", filter.class_name.as_deref()),
            ("grade_level", filter.grade_level.as_deref()),
            ("first_name", filter.first_name.as_deref()),
            ("last_name", filter.last_name.as_deref()),
        ];

        let mut escaped: Vec<(&str, String)> = Vec::new();
        for (column, term) in terms {
            if let Some(term) = term {
                escaped.push((column, escape_like(term)));
            }
        }

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        for (column, term) in &escaped {
            params.push(term);
            clauses.push(format!("{} ILIKE '%' || ${} || '%'", column, params.len()));
        }

        let mut sql = String::from(
            "SELECT id, first_name, last_name, address, grade_level, class_name FROM students",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let client = self.pool.get().await?;
        let rows = client.query(&sql, &params).await?;
        Ok(rows.iter().map(student_from_row).collect())
    }

    async fn insert_grade_level(&self, record: &GradeLevelRecord) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO grade_levels (id, student_id, level) VALUES ($1, $2, $3)",
                &[&record.id, record.student_id.as_uuid(), &record.level],
            )
            .await?;
        Ok(())
    }

    async fn update_grade_level(&self, student_id: StudentId, level: &str) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                "UPDATE grade_levels SET level = $2 WHERE student_id = $1",
                &[student_id.as_uuid(), &level],
            )
            .await?;
        Ok(matched)
    }

    async fn delete_grade_level(&self, student_id: StudentId) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                "DELETE FROM grade_levels WHERE student_id = $1",
                &[student_id.as_uuid()],
            )
            .await?;
        Ok(matched)
    }

    async fn find_grade_level(
        &self,
        student_id: StudentId,
    ) -> StoreResult<Option<GradeLevelRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, student_id, level FROM grade_levels WHERE student_id = $1 LIMIT 1",
                &[student_id.as_uuid()],
            )
            .await?;
        Ok(row.as_ref().map(grade_level_from_row))
    }

    async fn insert_class(&self, record: &ClassAssignment) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO classes (id, student_id, class_name, grade_level)
                 VALUES ($1, $2, $3, $4)",
                &[
                    &record.id,
                    record.student_id.as_uuid(),
                    &record.class_name,
                    &record.grade_level,
                ],
            )
            .await?;
        Ok(())
    }

    async fn update_class(
        &self,
        student_id: StudentId,
        class_name: &str,
        grade_level: &str,
    ) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                "UPDATE classes SET class_name = $2, grade_level = $3 WHERE student_id = $1",
                &[student_id.as_uuid(), &class_name, &grade_level],
            )
            .await?;
        Ok(matched)
    }

    async fn delete_class(&self, student_id: StudentId) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let matched = client
            .execute(
                "DELETE FROM classes WHERE student_id = $1",
                &[student_id.as_uuid()],
            )
            .await?;
        Ok(matched)
    }

    async fn find_class(&self, student_id: StudentId) -> StoreResult<Option<ClassAssignment>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, student_id, class_name, grade_level
                 FROM classes WHERE student_id = $1 LIMIT 1",
                &[student_id.as_uuid()],
            )
            .await?;
        Ok(row.as_ref().map(class_from_row))
    }
}
