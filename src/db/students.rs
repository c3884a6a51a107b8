//! Student records
//!
//! Core operations take an explicit [`UnitOfWork`]; the caller owns the
//! transaction and decides when to commit. [`StudentRepository`] wraps each
//! operation in its own unit of work for callers that just hold a pool.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::UnitOfWork;
use crate::config::Config;
use crate::error::{StudentError, StudentResult};
use crate::query::{
    Page, PageRequest, STUDENT_CATALOG, SortSpec, StudentFilter, fetch_page, resolve_sort_field,
};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub fullname: String,
    pub birthdate: NaiveDate,
    pub sat_score: i64,
    pub graduation_score: f64,
    pub phone: String,
    pub email: String,
    pub picture: Option<String>,
}

/// Payload for creating or updating a student
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentFields {
    pub fullname: String,
    pub birthdate: NaiveDate,
    pub sat_score: i64,
    pub graduation_score: f64,
    pub phone: String,
    pub email: String,
}

/// Row shape of the student listing
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StudentListItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub fullname: String,
    pub sat_score: i64,
    pub graduation_score: f64,
    pub phone: String,
    pub email: String,
    pub picture: Option<String>,
    /// Mean course score, `None` when the student has no grades
    pub avg_score: Option<f64>,
}

const STUDENT_COLUMNS: &str =
    "id, created_at, fullname, birthdate, sat_score, graduation_score, phone, email, picture";

// ============================================================================
// Operations
// ============================================================================

async fn fetch_student(uow: &mut UnitOfWork, id: i64) -> StudentResult<Option<Student>> {
    let sql = format!("SELECT {} FROM student WHERE id = ?", STUDENT_COLUMNS);
    let student = sqlx::query_as::<_, Student>(&sql)
        .bind(id)
        .fetch_optional(uow.connection())
        .await?;
    Ok(student)
}

async fn student_exists(uow: &mut UnitOfWork, id: i64) -> StudentResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM student WHERE id = ?")
        .bind(id)
        .fetch_optional(uow.connection())
        .await?;
    Ok(found.is_some())
}

async fn email_exists(uow: &mut UnitOfWork, email: &str) -> StudentResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM student WHERE email = ? LIMIT 1")
        .bind(email)
        .fetch_optional(uow.connection())
        .await?;
    Ok(found.is_some())
}

/// Insert a new student. Fails with `Conflict` if the email is taken.
pub async fn create_student(
    uow: &mut UnitOfWork,
    fields: StudentFields,
) -> StudentResult<Student> {
    if email_exists(uow, &fields.email).await? {
        tracing::warn!(email = %fields.email, "Student already exists");
        return Err(StudentError::Conflict {
            email: fields.email,
        });
    }

    let result = sqlx::query(
        r#"
        INSERT INTO student (created_at, fullname, birthdate, sat_score, graduation_score, phone, email)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Utc::now())
    .bind(&fields.fullname)
    .bind(fields.birthdate)
    .bind(fields.sat_score)
    .bind(fields.graduation_score)
    .bind(&fields.phone)
    .bind(&fields.email)
    .execute(uow.connection())
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!(student_id = id, "Student created");

    fetch_student(uow, id)
        .await?
        .ok_or(StudentError::NotFound { id })
}

/// Overwrite every editable field of an existing student.
pub async fn update_student(
    uow: &mut UnitOfWork,
    id: i64,
    fields: StudentFields,
) -> StudentResult<Student> {
    let result = sqlx::query(
        r#"
        UPDATE student
        SET fullname = ?, birthdate = ?, sat_score = ?, graduation_score = ?, phone = ?, email = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.fullname)
    .bind(fields.birthdate)
    .bind(fields.sat_score)
    .bind(fields.graduation_score)
    .bind(&fields.phone)
    .bind(&fields.email)
    .bind(id)
    .execute(uow.connection())
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(student_id = id, "Student not found for update");
        return Err(StudentError::NotFound { id });
    }

    tracing::info!(student_id = id, "Student updated");
    fetch_student(uow, id)
        .await?
        .ok_or(StudentError::NotFound { id })
}

/// Get student by ID
pub async fn get_student(uow: &mut UnitOfWork, id: i64) -> StudentResult<Option<Student>> {
    fetch_student(uow, id).await
}

/// Delete a student together with its grade rows.
pub async fn delete_student(uow: &mut UnitOfWork, id: i64) -> StudentResult<()> {
    if !student_exists(uow, id).await? {
        tracing::warn!(student_id = id, "Student not found for delete");
        return Err(StudentError::NotFound { id });
    }

    let grades = sqlx::query("DELETE FROM student_grade WHERE student_id = ?")
        .bind(id)
        .execute(uow.connection())
        .await?;

    sqlx::query("DELETE FROM student WHERE id = ?")
        .bind(id)
        .execute(uow.connection())
        .await?;

    tracing::info!(
        student_id = id,
        grades_removed = grades.rows_affected(),
        "Student deleted"
    );
    Ok(())
}

/// Record a course score for a student; feeds the listing's `avg_score`.
pub async fn record_grade(
    uow: &mut UnitOfWork,
    student_id: i64,
    course_score: f64,
) -> StudentResult<i64> {
    if !student_exists(uow, student_id).await? {
        return Err(StudentError::NotFound { id: student_id });
    }

    let result = sqlx::query("INSERT INTO student_grade (student_id, course_score) VALUES (?, ?)")
        .bind(student_id)
        .bind(course_score)
        .execute(uow.connection())
        .await?;

    Ok(result.last_insert_rowid())
}

/// Filtered, sorted, paginated listing.
pub async fn list_students(
    uow: &mut UnitOfWork,
    filter: &StudentFilter,
    sort: &SortSpec,
    page: PageRequest,
) -> StudentResult<Page<StudentListItem>> {
    let query = filter.to_query();
    tracing::debug!(filtered = !filter.is_empty(), "Listing students");
    fetch_page(uow.connection(), &query, sort, page).await
}

// ============================================================================
// Repository
// ============================================================================

/// Pool-backed access running each call in its own unit of work.
///
/// Commits on success; on any error the unit of work is dropped and rolled
/// back.
#[derive(Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
    default_page_size: u32,
}

impl StudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            default_page_size: Config::default().default_page_size,
        }
    }

    pub fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    /// Page request from raw listing arguments, filling in the configured page size
    pub fn page_request(&self, page: Option<u32>, count: Option<u32>) -> PageRequest {
        PageRequest::from_params(page, count, self.default_page_size)
    }

    pub async fn create(&self, fields: StudentFields) -> StudentResult<Student> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let student = create_student(&mut uow, fields).await?;
        uow.commit().await?;
        Ok(student)
    }

    pub async fn update(&self, id: i64, fields: StudentFields) -> StudentResult<Student> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let student = update_student(&mut uow, id, fields).await?;
        uow.commit().await?;
        Ok(student)
    }

    pub async fn get(&self, id: i64) -> StudentResult<Option<Student>> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let student = get_student(&mut uow, id).await?;
        uow.commit().await?;
        Ok(student)
    }

    pub async fn delete(&self, id: i64) -> StudentResult<()> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        delete_student(&mut uow, id).await?;
        uow.commit().await
    }

    pub async fn record_grade(&self, student_id: i64, course_score: f64) -> StudentResult<i64> {
        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let grade_id = record_grade(&mut uow, student_id, course_score).await?;
        uow.commit().await?;
        Ok(grade_id)
    }

    pub async fn list(
        &self,
        filter: &StudentFilter,
        sort: &SortSpec,
        page: PageRequest,
    ) -> StudentResult<Page<StudentListItem>> {
        // Reject bad input before a connection is taken
        page.validate()?;
        resolve_sort_field(STUDENT_CATALOG, &sort.field)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let page = list_students(&mut uow, filter, sort, page).await?;
        uow.commit().await?;
        Ok(page)
    }
}
