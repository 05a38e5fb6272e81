//! Diploma portal routes.
//!
//! GET   /students      — listing with client-chosen sort/direction
//! GET   /students/:id  — student, requirements, derived metrics
//! PATCH /students/:id  — status/program updates

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::student_repository::{
    SortDir, StudentFilter, StudentRepository, StudentWithMetrics,
};
use crate::error::ApiError;
use crate::models::{Page, Student, StudentRequirement};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub program: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMetrics {
    pub open_requirements: i64,
    pub total_requirements: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct StudentDetailResponse {
    pub student: Student,
    pub requirements: Vec<StudentRequirement>,
    pub metrics: StudentMetrics,
}

#[derive(Debug, Deserialize)]
pub struct PatchStudentBody {
    pub status: Option<String>,
    pub program: Option<String>,
}

pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Page<StudentWithMetrics>>, ApiError> {
    let dir = match query.dir.as_deref() {
        Some(d) => SortDir::parse(d)?,
        None => SortDir::default(),
    };
    let filter = StudentFilter {
        q: query.q,
        program: query.program,
        status: query.status,
        sort: query.sort,
        dir,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(0),
    };
    let page = StudentRepository::new(state.pool.clone()).list(&filter).await?;
    Ok(Json(page))
}

pub async fn student_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentDetailResponse>, ApiError> {
    let repo = StudentRepository::new(state.pool.clone());
    let student = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("student not found".into()))?;
    let requirements = repo.requirements(id).await?;

    let total = requirements.len() as i64;
    let open = requirements.iter().filter(|r| !r.completed).count() as i64;
    let metrics = StudentMetrics {
        open_requirements: open,
        total_requirements: total,
        completion_rate: if total == 0 {
            1.0
        } else {
            (total - open) as f64 / total as f64
        },
    };

    Ok(Json(StudentDetailResponse {
        student,
        requirements,
        metrics,
    }))
}

pub async fn patch_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PatchStudentBody>,
) -> Result<Json<Student>, ApiError> {
    if body.status.is_none() && body.program.is_none() {
        return Err(ApiError::BadRequest(
            "at least one of status, program is required".into(),
        ));
    }
    let student = StudentRepository::new(state.pool.clone())
        .update(id, body.status.as_deref(), body.program.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("student not found".into()))?;
    Ok(Json(student))
}
