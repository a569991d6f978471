use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub const CLASSROOM_COLLECTION_NAME: &str = "classrooms";

/// Expected membership-transition failures; storage failures travel in
/// `Storage` and are the only unexpected variant.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("classroom doesn't exist")]
    ClassroomNotFound,
    #[error("user is already a classroom member")]
    AlreadyMember,
    #[error("classroom owner can't be removed")]
    OwnerImmutable,
    #[error("invitation is not usable")]
    InvalidToken,
    #[error(transparent)]
    Storage(#[from] mongodb::error::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Classroom {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub school_year: String,

    pub owner_id: Uuid,
    #[serde(default)]
    pub teachers_id: Vec<Uuid>,
    #[serde(default)]
    pub students_id: Vec<Uuid>,

    /// Short shareable join code, unique across classrooms.
    pub class_code: String,
}

impl Classroom {
    pub fn is_owner(&self, user: Uuid) -> bool {
        self.owner_id == user
    }

    pub fn is_teacher(&self, user: Uuid) -> bool {
        self.teachers_id.contains(&user)
    }

    pub fn is_student(&self, user: Uuid) -> bool {
        self.students_id.contains(&user)
    }

    pub fn is_member(&self, user: Uuid) -> bool {
        self.is_owner(user) || self.is_teacher(user) || self.is_student(user)
    }

    /// Adds `user` to the student or teacher set.
    ///
    /// Rejects users already present in any role, so repeated admission is
    /// signaled instead of duplicating entries.
    pub fn admit(&mut self, user: Uuid, is_student: bool) -> Result<(), MembershipError> {
        if self.is_member(user) {
            return Err(MembershipError::AlreadyMember);
        }

        if is_student {
            self.students_id.push(user);
        } else {
            self.teachers_id.push(user);
        }

        Ok(())
    }

    /// Removes `user` from the set named by `is_student`.
    ///
    /// The owner is never removable, regardless of the flag. A user listed
    /// in both sets only loses the requested role.
    pub fn expel(&mut self, user: Uuid, is_student: bool) -> Result<(), MembershipError> {
        if self.is_owner(user) {
            return Err(MembershipError::OwnerImmutable);
        }

        if is_student {
            self.students_id.retain(|it| *it != user);
        } else {
            self.teachers_id.retain(|it| *it != user);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_classroom(owner: Uuid) -> Classroom {
        Classroom {
            id: Uuid::new_v4(),
            name: "Algebra I".to_string(),
            description: String::new(),
            school_year: "2023/2024".to_string(),
            owner_id: owner,
            teachers_id: vec![owner],
            students_id: vec![],
            class_code: "a1B2c3D4".to_string(),
        }
    }

    #[test]
    fn owner_is_member_and_teacher() {
        let owner = Uuid::new_v4();
        let classroom = example_classroom(owner);

        assert!(classroom.is_owner(owner));
        assert!(classroom.is_teacher(owner));
        assert!(classroom.is_member(owner));
        assert!(!classroom.is_student(owner));
    }

    #[test]
    fn admit_appends_to_requested_set() {
        let mut classroom = example_classroom(Uuid::new_v4());

        let student = Uuid::new_v4();
        let teacher = Uuid::new_v4();

        classroom.admit(student, true).expect("new student");
        classroom.admit(teacher, false).expect("new teacher");

        assert!(classroom.is_student(student));
        assert!(classroom.is_teacher(teacher));
        assert!(!classroom.is_student(teacher));
    }

    #[test]
    fn admit_rejects_existing_member_once() {
        let mut classroom = example_classroom(Uuid::new_v4());
        let student = Uuid::new_v4();

        classroom.admit(student, true).expect("new student");
        let second = classroom.admit(student, true);

        assert!(matches!(second, Err(MembershipError::AlreadyMember)));
        assert_eq!(
            classroom.students_id.iter().filter(|it| **it == student).count(),
            1,
            "duplicate admission must not add a second entry"
        );
    }

    #[test]
    fn admit_rejects_cross_role_member() {
        let mut classroom = example_classroom(Uuid::new_v4());
        let user = Uuid::new_v4();

        classroom.admit(user, false).expect("new teacher");

        // Already a teacher, joining as student is still a duplicate.
        assert!(matches!(
            classroom.admit(user, true),
            Err(MembershipError::AlreadyMember)
        ));
    }

    #[test]
    fn expel_never_removes_owner() {
        let owner = Uuid::new_v4();
        let mut classroom = example_classroom(owner);

        for is_student in [true, false] {
            let result = classroom.expel(owner, is_student);
            assert!(matches!(result, Err(MembershipError::OwnerImmutable)));
            assert!(classroom.is_owner(owner));
            assert!(classroom.is_teacher(owner));
        }
    }

    #[test]
    fn expel_targets_only_named_set() {
        let mut classroom = example_classroom(Uuid::new_v4());
        let user = Uuid::new_v4();

        // A user can end up in both sets through direct membership edits.
        classroom.students_id.push(user);
        classroom.teachers_id.push(user);

        classroom.expel(user, true).expect("removable student");

        assert!(!classroom.is_student(user));
        assert!(classroom.is_teacher(user), "teacher role must survive");
    }

    #[test]
    fn expel_missing_user_is_noop() {
        let mut classroom = example_classroom(Uuid::new_v4());
        let before = classroom.students_id.clone();

        classroom.expel(Uuid::new_v4(), true).expect("no-op");
        assert_eq!(classroom.students_id, before);
    }

    #[test]
    fn classroom_bson_round_trip() {
        let classroom = example_classroom(Uuid::new_v4());

        let doc = bson::to_document(&classroom).expect("classroom serializes to BSON");
        let back: Classroom = bson::from_document(doc).expect("classroom deserializes from BSON");

        assert_eq!(back.id, classroom.id);
        assert_eq!(back.owner_id, classroom.owner_id);
        assert_eq!(back.teachers_id, classroom.teachers_id);
        assert_eq!(back.class_code, classroom.class_code);
    }
}
