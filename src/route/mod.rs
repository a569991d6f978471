use std::collections::BTreeMap;

use mongodb::Database;
use rocket::{Build, Rocket, Route};
use uuid::Uuid;

pub mod classroom;
pub mod grade;

use classroom::*;
use grade::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::classroom::db::ClassroomDbExt,
    data::classroom::db::{ClassroomCreateData, ClassroomUpdateData},
    data::classroom::Classroom,
    data::grade::db::GradeDetailData,
    resp::{
        jwt::doc::JWTAuth,
        problem::{problems, Problem},
    },
    role::ClassRole,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        classroom_list,
        classroom_create,
        classroom_update,
        classroom_invite,
        invite_link_get,
        join_by_link,
        join_by_code,
        reset_class_code,
        remove_member,
        grade_structure_get,
        grade_detail_add,
        grade_detail_update,
        grade_detail_remove
    ),
    components(schemas(
        ClassRole,
        ClassroomCreateData,
        ClassroomUpdateData,
        ClassroomResponse,
        UserClassroomsResponse,
        InviteEmailData,
        InviteSentResponse,
        JoinByTokenData,
        JoinedResponse,
        JoinByCodeData,
        ResetClassCodeData,
        RemoveMemberData,
        ClassroomMembersResponse,
        GradeDetailData,
        GradeDetailResponse,
        Problem
    )),
    modifiers(&JWTAuth, &V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

/// Loads a classroom or reports the not-found `Problem` for the caller.
pub(crate) async fn load_classroom(db: &Database, id: Uuid) -> Result<Classroom, Problem> {
    db.classroom(id)
        .await
        .map_err(Problem::from)?
        .ok_or_else(|| problems::classroom_not_found(id))
}

pub(crate) fn require_manage(classroom: &Classroom, user: Uuid) -> Result<(), Problem> {
    match ClassRole::of(classroom, user) {
        Some(role) if role.can_manage() => Ok(()),
        _ => Err(problems::forbidden(
            "Only the classroom owner or its teachers can do this.",
        )),
    }
}

pub fn api_v1() -> Vec<Route> {
    routes![
        classroom_list,
        classroom_create,
        classroom_update,
        classroom_invite,
        invite_link_get,
        join_by_link,
        join_by_code,
        reset_class_code,
        remove_member,
        grade_structure_get,
        grade_detail_add,
        grade_detail_update,
        grade_detail_remove
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api/v1", api_v1()).mount(
        "/",
        SwaggerUi::new("/swagger/<_..>").url("/api/v1/openapi.json", ApiDocV1::openapi()),
    )
}
