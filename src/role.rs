use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::classroom::Classroom;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, ToSchema,
)]
pub enum ClassRole {
    Student,
    Teacher,
    Owner,
}

impl ClassRole {
    /// Role of `user` within `classroom`, `None` for non-members.
    ///
    /// Owner wins over a teacher entry, teacher over a student entry, when a
    /// user id appears in several sets.
    pub fn of(classroom: &Classroom, user: Uuid) -> Option<ClassRole> {
        if classroom.is_owner(user) {
            Some(ClassRole::Owner)
        } else if classroom.is_teacher(user) {
            Some(ClassRole::Teacher)
        } else if classroom.is_student(user) {
            Some(ClassRole::Student)
        } else {
            None
        }
    }

    /// Indicates whether users with this role can manage classroom
    /// membership and grading.
    pub fn can_manage(self) -> bool {
        self >= ClassRole::Teacher
    }

    pub fn invited(is_student: bool) -> ClassRole {
        if is_student {
            ClassRole::Student
        } else {
            ClassRole::Teacher
        }
    }
}

impl std::fmt::Display for ClassRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassRole::Student => write!(f, "Student"),
            ClassRole::Teacher => write!(f, "Teacher"),
            ClassRole::Owner => write!(f, "Owner"),
        }
    }
}

impl std::convert::Into<String> for ClassRole {
    fn into(self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_gates_management() {
        assert!(ClassRole::Owner > ClassRole::Teacher);
        assert!(ClassRole::Teacher > ClassRole::Student);

        assert!(ClassRole::Owner.can_manage());
        assert!(ClassRole::Teacher.can_manage());
        assert!(!ClassRole::Student.can_manage());
    }

    #[test]
    fn invited_role_follows_flag() {
        assert_eq!(ClassRole::invited(true), ClassRole::Student);
        assert_eq!(ClassRole::invited(false), ClassRole::Teacher);
    }

    #[test]
    fn display_labels() {
        assert_eq!(ClassRole::Student.to_string(), "Student");
        assert_eq!(ClassRole::Teacher.to_string(), "Teacher");
        assert_eq!(ClassRole::Owner.to_string(), "Owner");
    }
}
