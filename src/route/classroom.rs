use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::data::classroom::db::{ClassroomCreateData, ClassroomDbExt, ClassroomUpdateData};
use crate::data::classroom::{Classroom, MembershipError};
use crate::invite;
use crate::mail::Mailer;
use crate::resp::jwt::UserToken;
use crate::resp::problem::Problem;
use crate::role::ClassRole;
use crate::security::Security;

use super::{load_classroom, require_manage};

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassroomResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub school_year: String,
    pub owner_id: Uuid,
    pub teachers_id: Vec<Uuid>,
    pub students_id: Vec<Uuid>,
    pub class_code: String,
    /// Caller's role within the classroom, when relevant to the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ClassRole>,
}

impl ClassroomResponse {
    pub fn tagged(classroom: Classroom, role: ClassRole) -> ClassroomResponse {
        ClassroomResponse {
            role: Some(role),
            ..ClassroomResponse::from(classroom)
        }
    }
}

impl From<Classroom> for ClassroomResponse {
    fn from(value: Classroom) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            school_year: value.school_year,
            owner_id: value.owner_id,
            teachers_id: value.teachers_id,
            students_id: value.students_id,
            class_code: value.class_code,
            role: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserClassroomsResponse {
    pub enrolled_classrooms: Vec<ClassroomResponse>,
    pub teaching_classrooms: Vec<ClassroomResponse>,
}

/// List the caller's classrooms, split into enrolled and teaching, each
/// tagged with the caller's role.
#[utoipa::path(
    responses(
        (status = 200, description = "Classrooms of the calling user", body = UserClassroomsResponse),
    )
)]
#[get("/classroom")]
#[tracing::instrument(skip(db))]
pub async fn classroom_list(
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<UserClassroomsResponse>, Problem> {
    let classrooms = db.classrooms_for_user(auth.user).await?;

    let tag = |classroom: Classroom, fallback: ClassRole| {
        let role = ClassRole::of(&classroom, auth.user).unwrap_or(fallback);
        ClassroomResponse::tagged(classroom, role)
    };

    Ok(Json(UserClassroomsResponse {
        enrolled_classrooms: classrooms
            .enrolled
            .into_iter()
            .map(|it| tag(it, ClassRole::Student))
            .collect(),
        teaching_classrooms: classrooms
            .teaching
            .into_iter()
            .map(|it| tag(it, ClassRole::Teacher))
            .collect(),
    }))
}

/// Create a classroom owned by the caller.
#[utoipa::path(request_body = ClassroomCreateData)]
#[post("/classroom", format = "application/json", data = "<classroom>")]
#[tracing::instrument(skip(db))]
pub async fn classroom_create(
    classroom: Json<ClassroomCreateData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<ClassroomResponse>, Problem> {
    let created = db.create_classroom(classroom.into_inner(), auth.user).await?;

    Ok(Json(ClassroomResponse::tagged(created, ClassRole::Owner)))
}

/// Update classroom descriptors.
#[utoipa::path(request_body = ClassroomUpdateData)]
#[put("/classroom/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn classroom_update(
    id: Uuid,
    update: Json<ClassroomUpdateData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<ClassroomResponse>, Problem> {
    let classroom = load_classroom(db, id).await?;
    require_manage(&classroom, auth.user)?;

    let updated = db.update_classroom(id, update.into_inner()).await?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteEmailData {
    pub class_id: Uuid,
    pub classroom_name: String,
    #[schema(format = "email")]
    pub email: String,
    pub is_student: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteSentResponse {
    pub is_sent: bool,
}

/// E-mail a signed invitation link.
///
/// Delivery problems surface as `is_sent: false`, never as a request
/// failure.
#[utoipa::path(request_body = InviteEmailData)]
#[post("/classroom/invite", format = "application/json", data = "<payload>")]
#[tracing::instrument(skip(db, config, security, mailer))]
pub async fn classroom_invite(
    payload: Json<InviteEmailData>,
    auth: UserToken,
    db: &State<Database>,
    config: &State<Config>,
    security: &State<Security>,
    mailer: &State<Mailer>,
) -> Result<Json<InviteSentResponse>, Problem> {
    let classroom = load_classroom(db, payload.class_id).await?;
    require_manage(&classroom, auth.user)?;

    let is_sent = invite::send_class_invite(
        mailer,
        security,
        config,
        payload.class_id,
        &payload.classroom_name,
        &payload.email,
        payload.is_student,
    )
    .await;

    Ok(Json(InviteSentResponse { is_sent }))
}

/// Bare invite link for sharing outside of e-mail.
#[utoipa::path(
    responses(
        (status = 200, description = "Invite link for the classroom and role", body = String),
    )
)]
#[get("/classroom/invite?<class_id>&<is_student>")]
#[tracing::instrument(skip(db, config, security))]
pub async fn invite_link_get(
    class_id: Uuid,
    is_student: bool,
    auth: UserToken,
    db: &State<Database>,
    config: &State<Config>,
    security: &State<Security>,
) -> Result<Json<String>, Problem> {
    let classroom = load_classroom(db, class_id).await?;
    require_manage(&classroom, auth.user)?;

    let link = invite::create_invite_link(config, security, class_id, is_student)?;

    Ok(Json(link))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JoinByTokenData {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedResponse {
    pub id: Uuid,
}

/// Redeem an invitation link; the role joined is the one the token was
/// issued for.
#[utoipa::path(request_body = JoinByTokenData)]
#[post("/classroom/join/link", format = "application/json", data = "<payload>")]
#[tracing::instrument(skip(db, security))]
pub async fn join_by_link(
    payload: Json<JoinByTokenData>,
    auth: UserToken,
    db: &State<Database>,
    security: &State<Security>,
) -> Result<Json<JoinedResponse>, Problem> {
    let claims = invite::verify_invite_token(&payload.token, security)
        .ok_or_else(|| Problem::from(MembershipError::InvalidToken))?;

    let classroom = db
        .add_member(claims.class_id, auth.user, claims.is_student)
        .await?;

    Ok(Json(JoinedResponse { id: classroom.id }))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JoinByCodeData {
    pub class_code: String,
}

/// Join a classroom as a student using its shareable class code.
#[utoipa::path(request_body = JoinByCodeData)]
#[post("/classroom/join/code", format = "application/json", data = "<payload>")]
#[tracing::instrument(skip(db))]
pub async fn join_by_code(
    payload: Json<JoinByCodeData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<ClassroomResponse>, Problem> {
    let classroom = db.join_by_code(&payload.class_code, auth.user).await?;

    Ok(Json(ClassroomResponse::tagged(classroom, ClassRole::Student)))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResetClassCodeData {
    pub class_id: Uuid,
}

/// Replace the class code, invalidating previously shared code links.
#[utoipa::path(request_body = ResetClassCodeData)]
#[post("/classroom/code/reset", format = "application/json", data = "<payload>")]
#[tracing::instrument(skip(db))]
pub async fn reset_class_code(
    payload: Json<ResetClassCodeData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<ClassroomResponse>, Problem> {
    let classroom = load_classroom(db, payload.class_id).await?;
    require_manage(&classroom, auth.user)?;

    let updated = db.reset_class_code(payload.class_id).await?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RemoveMemberData {
    pub class_id: Uuid,
    pub user_id: Uuid,
    pub is_student: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassroomMembersResponse {
    pub teachers_id: Vec<Uuid>,
    pub students_id: Vec<Uuid>,
}

/// Remove a member from one role set. Members may remove themselves;
/// removing someone else requires a teaching role. The owner is never
/// removable.
#[utoipa::path(request_body = RemoveMemberData)]
#[delete("/classroom/member", format = "application/json", data = "<payload>")]
#[tracing::instrument(skip(db))]
pub async fn remove_member(
    payload: Json<RemoveMemberData>,
    auth: UserToken,
    db: &State<Database>,
) -> Result<Json<ClassroomMembersResponse>, Problem> {
    let classroom = load_classroom(db, payload.class_id).await?;

    if payload.user_id != auth.user {
        require_manage(&classroom, auth.user)?;
    }

    let updated = db
        .remove_member(payload.class_id, payload.user_id, payload.is_student)
        .await?;

    Ok(Json(ClassroomMembersResponse {
        teachers_id: updated.teachers_id,
        students_id: updated.students_id,
    }))
}
