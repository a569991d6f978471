use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::grade::db::{GradeDetailData, GradeStructureDbExt};
use crate::data::grade::GradeStructureDetail;
use crate::resp::problem::{problems, Problem};
use crate::resp::jwt::UserToken;

use super::{load_classroom, require_manage};

#[derive(Debug, Serialize, ToSchema)]
pub struct GradeDetailResponse {
    pub id: Uuid,
    pub grade_structure_id: Uuid,
    pub title: String,
    pub description: String,
    pub point: f64,
}

impl From<GradeStructureDetail> for GradeDetailResponse {
    fn from(value: GradeStructureDetail) -> Self {
        Self {
            id: value.id,
            grade_structure_id: value.grade_structure_id,
            title: value.title,
            description: value.description,
            point: value.point,
        }
    }
}

/// Rubric of a classroom, in creation order. An empty list means no rubric
/// has been set up yet.
#[utoipa::path(
    responses(
        (status = 200, description = "Grade structure details of the classroom", body = Vec<GradeDetailResponse>),
    )
)]
#[get("/classroom/<class_id>/grades")]
#[tracing::instrument(skip(db))]
pub async fn grade_structure_get(
    class_id: Uuid,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<Vec<GradeDetailResponse>>, Problem> {
    let classroom = load_classroom(db, class_id).await?;
    if !classroom.is_member(auth.user) {
        return Err(problems::forbidden(
            "Only classroom members can view the grade structure.",
        ));
    }

    let details = match db.grade_structure(class_id).await? {
        Some(structure) => db.grade_details(&structure).await?,
        None => vec![],
    };

    Ok(Json(details.into_iter().map(Into::into).collect()))
}

/// Add a rubric line; the classroom's grade structure is created on first
/// use.
#[utoipa::path(request_body = GradeDetailData)]
#[post("/classroom/<class_id>/grades", format = "application/json", data = "<detail>")]
#[tracing::instrument(skip(db))]
pub async fn grade_detail_add(
    class_id: Uuid,
    detail: Json<GradeDetailData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<GradeDetailResponse>, Problem> {
    let classroom = load_classroom(db, class_id).await?;
    require_manage(&classroom, auth.user)?;

    let created = db.add_grade_detail(class_id, detail.into_inner()).await?;

    Ok(Json(created.into()))
}

/// Update a rubric line's title, description and weight.
#[utoipa::path(request_body = GradeDetailData)]
#[put(
    "/classroom/<class_id>/grades/<detail_id>",
    format = "application/json",
    data = "<detail>"
)]
#[tracing::instrument(skip(db))]
pub async fn grade_detail_update(
    class_id: Uuid,
    detail_id: Uuid,
    detail: Json<GradeDetailData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<GradeDetailResponse>, Problem> {
    let classroom = load_classroom(db, class_id).await?;
    require_manage(&classroom, auth.user)?;

    let updated = db.update_grade_detail(detail_id, detail.into_inner()).await?;

    Ok(Json(updated.into()))
}

/// Remove a rubric line.
///
/// Removal also drops the classroom's grade structure document.
#[utoipa::path(
    responses(
        (status = 200, description = "The removed grade structure detail", body = GradeDetailResponse),
    )
)]
#[delete("/classroom/<class_id>/grades/<detail_id>")]
#[tracing::instrument(skip(db))]
pub async fn grade_detail_remove(
    class_id: Uuid,
    detail_id: Uuid,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<GradeDetailResponse>, Problem> {
    let classroom = load_classroom(db, class_id).await?;
    require_manage(&classroom, auth.user)?;

    let removed = db.remove_grade_detail(class_id, detail_id).await?;

    Ok(Json(removed.into()))
}
