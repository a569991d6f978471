use bson::doc;
use mongodb::Database;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rocket::futures::StreamExt;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Classroom, MembershipError, CLASSROOM_COLLECTION_NAME};

/// Length of generated class codes, as shared with users.
pub const CLASS_CODE_LENGTH: usize = 8;

pub(crate) mod filter {
    use bson::{doc, Document};
    use uuid::Uuid;

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": bson::Uuid::from_uuid_1(id) }
    }

    #[inline]
    pub fn by_class_code(code: impl ToString) -> Document {
        doc! { "class_code": code.to_string() }
    }

    // Membership arrays hold uuids in their canonical string form.
    #[inline]
    pub fn by_student(user: Uuid) -> Document {
        doc! { "students_id": user.to_string() }
    }

    #[inline]
    pub fn by_teacher(user: Uuid) -> Document {
        doc! { "teachers_id": user.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassroomCreateData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub school_year: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassroomUpdateData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub school_year: String,
}

/// Classrooms a user participates in, split by their side of the desk.
#[derive(Debug, Default)]
pub struct UserClassrooms {
    pub enrolled: Vec<Classroom>,
    pub teaching: Vec<Classroom>,
}

pub fn random_class_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLASS_CODE_LENGTH)
        .map(char::from)
        .collect()
}

/// The creator becomes the owner and the sole initial teacher.
fn new_classroom(data: ClassroomCreateData, owner: Uuid, class_code: String) -> Classroom {
    Classroom {
        id: Uuid::new_v4(),
        name: data.name,
        description: data.description,
        school_year: data.school_year,
        owner_id: owner,
        teachers_id: vec![owner],
        students_id: vec![],
        class_code,
    }
}

pub trait ClassroomDbExt {
    /// Generates a class code no existing classroom holds.
    ///
    /// Retries without bound; every candidate is checked against live
    /// collection state so concurrent creations can't satisfy the check
    /// from a stale snapshot. The collection's unique index on
    /// `class_code` backstops the remaining check-then-insert window.
    async fn generate_class_code(&self) -> Result<String, MembershipError>;

    async fn create_classroom(
        &self,
        data: ClassroomCreateData,
        owner: Uuid,
    ) -> Result<Classroom, MembershipError>;

    async fn classroom(&self, id: Uuid) -> Result<Option<Classroom>, MembershipError>;
    async fn classroom_by_code(
        &self,
        code: impl AsRef<str>,
    ) -> Result<Option<Classroom>, MembershipError>;
    async fn classrooms_for_user(&self, user: Uuid) -> Result<UserClassrooms, MembershipError>;

    async fn update_classroom(
        &self,
        id: Uuid,
        data: ClassroomUpdateData,
    ) -> Result<Classroom, MembershipError>;

    async fn add_member(
        &self,
        class_id: Uuid,
        user: Uuid,
        is_student: bool,
    ) -> Result<Classroom, MembershipError>;

    async fn remove_member(
        &self,
        class_id: Uuid,
        user: Uuid,
        is_student: bool,
    ) -> Result<Classroom, MembershipError>;

    async fn reset_class_code(&self, class_id: Uuid) -> Result<Classroom, MembershipError>;

    async fn join_by_code(
        &self,
        code: impl AsRef<str>,
        user: Uuid,
    ) -> Result<Classroom, MembershipError>;
}

async fn save_classroom(db: &Database, classroom: &Classroom) -> Result<(), MembershipError> {
    db.collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
        .replace_one(filter::by_id(classroom.id), classroom, None)
        .await?;
    Ok(())
}

async fn collect_classrooms(mut cursor: mongodb::Cursor<Classroom>) -> Vec<Classroom> {
    let mut classrooms = vec![];
    while let Some(result) = cursor.next().await {
        match result {
            Ok(classroom) => classrooms.push(classroom),
            Err(_) => {
                tracing::warn!("Unable to deserialize Classroom document.")
            }
        }
    }
    classrooms
}

impl ClassroomDbExt for Database {
    async fn generate_class_code(&self) -> Result<String, MembershipError> {
        loop {
            let candidate = random_class_code();

            let taken = self
                .collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
                .find_one(filter::by_class_code(&candidate), None)
                .await?;

            if taken.is_none() {
                return Ok(candidate);
            }

            tracing::debug!("class code collision on '{}', regenerating", candidate);
        }
    }

    async fn create_classroom(
        &self,
        data: ClassroomCreateData,
        owner: Uuid,
    ) -> Result<Classroom, MembershipError> {
        let class_code = self.generate_class_code().await?;
        let classroom = new_classroom(data, owner, class_code);

        self.collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
            .insert_one(&classroom, None)
            .await?;

        tracing::info!("created classroom {} for owner {}", classroom.id, owner);

        Ok(classroom)
    }

    async fn classroom(&self, id: Uuid) -> Result<Option<Classroom>, MembershipError> {
        Ok(self
            .collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await?)
    }

    async fn classroom_by_code(
        &self,
        code: impl AsRef<str>,
    ) -> Result<Option<Classroom>, MembershipError> {
        Ok(self
            .collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
            .find_one(filter::by_class_code(code.as_ref()), None)
            .await?)
    }

    async fn classrooms_for_user(&self, user: Uuid) -> Result<UserClassrooms, MembershipError> {
        let collection = self.collection::<Classroom>(CLASSROOM_COLLECTION_NAME);

        let enrolled =
            collect_classrooms(collection.find(filter::by_student(user), None).await?).await;
        let teaching =
            collect_classrooms(collection.find(filter::by_teacher(user), None).await?).await;

        Ok(UserClassrooms { enrolled, teaching })
    }

    async fn update_classroom(
        &self,
        id: Uuid,
        data: ClassroomUpdateData,
    ) -> Result<Classroom, MembershipError> {
        let mut classroom = self
            .classroom(id)
            .await?
            .ok_or(MembershipError::ClassroomNotFound)?;

        classroom.name = data.name;
        classroom.description = data.description;
        classroom.school_year = data.school_year;

        save_classroom(self, &classroom).await?;
        Ok(classroom)
    }

    async fn add_member(
        &self,
        class_id: Uuid,
        user: Uuid,
        is_student: bool,
    ) -> Result<Classroom, MembershipError> {
        let mut classroom = self
            .classroom(class_id)
            .await?
            .ok_or(MembershipError::ClassroomNotFound)?;

        classroom.admit(user, is_student)?;
        save_classroom(self, &classroom).await?;

        tracing::info!(
            "added {} to classroom {} as {}",
            user,
            class_id,
            if is_student { "student" } else { "teacher" }
        );

        Ok(classroom)
    }

    async fn remove_member(
        &self,
        class_id: Uuid,
        user: Uuid,
        is_student: bool,
    ) -> Result<Classroom, MembershipError> {
        let mut classroom = self
            .classroom(class_id)
            .await?
            .ok_or(MembershipError::ClassroomNotFound)?;

        classroom.expel(user, is_student)?;
        save_classroom(self, &classroom).await?;

        Ok(classroom)
    }

    async fn reset_class_code(&self, class_id: Uuid) -> Result<Classroom, MembershipError> {
        let mut classroom = self
            .classroom(class_id)
            .await?
            .ok_or(MembershipError::ClassroomNotFound)?;

        // Previously shared code links stop resolving once this persists.
        classroom.class_code = self.generate_class_code().await?;
        save_classroom(self, &classroom).await?;

        Ok(classroom)
    }

    async fn join_by_code(
        &self,
        code: impl AsRef<str>,
        user: Uuid,
    ) -> Result<Classroom, MembershipError> {
        let classroom = self
            .classroom_by_code(code)
            .await?
            .ok_or(MembershipError::ClassroomNotFound)?;

        // Self-service code joins always enroll as a student.
        self.add_member(classroom.id, user, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_code_has_configured_shape() {
        for _ in 0..64 {
            let code = random_class_code();
            assert_eq!(code.len(), CLASS_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn class_codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..100).map(|_| random_class_code()).collect();

        // 62^8 candidates; a batch of 100 repeating would mean a broken rng.
        assert!(codes.len() > 95);
    }

    #[test]
    fn created_classroom_has_owner_as_sole_teacher() {
        let owner = Uuid::new_v4();
        let data = ClassroomCreateData {
            name: "Algebra I".to_string(),
            description: String::new(),
            school_year: "2023/2024".to_string(),
        };

        let classroom = new_classroom(data, owner, random_class_code());

        assert_eq!(classroom.owner_id, owner);
        assert_eq!(classroom.teachers_id, vec![owner]);
        assert!(classroom.students_id.is_empty());
        assert_eq!(classroom.class_code.len(), CLASS_CODE_LENGTH);
    }

    #[test]
    fn membership_filters_use_canonical_strings() {
        let user = Uuid::new_v4();

        let student = filter::by_student(user);
        let teacher = filter::by_teacher(user);

        assert_eq!(
            student.get_str("students_id").unwrap(),
            user.to_string().as_str()
        );
        assert_eq!(
            teacher.get_str("teachers_id").unwrap(),
            user.to_string().as_str()
        );
    }
}
