use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

pub const GRADE_STRUCTURE_COLLECTION_NAME: &str = "grade_structures";
pub const GRADE_DETAIL_COLLECTION_NAME: &str = "grade_structure_details";

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("grade structure detail doesn't exist")]
    DetailNotFound,
    #[error(transparent)]
    Storage(#[from] mongodb::error::Error),
}

/// Per-classroom rubric summary; at most one per `class_id`.
///
/// `detail_ids` keeps insertion order, which is the display order of the
/// rubric lines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeStructure {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    pub class_id: Uuid,
    #[serde(default)]
    pub detail_ids: Vec<Uuid>,
}

/// One weighted rubric line item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GradeStructureDetail {
    #[serde(
        default = "Uuid::new_v4",
        rename = "_id",
        with = "bson::serde_helpers::uuid_1_as_binary"
    )]
    pub id: Uuid,
    pub grade_structure_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Weight of the item; no range is enforced here, cross-item policies
    /// like sum-to-100 belong to the caller.
    pub point: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_structure_bson_round_trip() {
        let structure = GradeStructure {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            detail_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        };

        let doc = bson::to_document(&structure).expect("structure serializes to BSON");
        let back: GradeStructure =
            bson::from_document(doc).expect("structure deserializes from BSON");

        assert_eq!(back.id, structure.id);
        assert_eq!(back.class_id, structure.class_id);
        assert_eq!(back.detail_ids, structure.detail_ids, "order must survive");
    }

    #[test]
    fn grade_detail_bson_round_trip() {
        let detail = GradeStructureDetail {
            id: Uuid::new_v4(),
            grade_structure_id: Uuid::new_v4(),
            title: "Homework".to_string(),
            description: "Weekly problem sets".to_string(),
            point: 12.5,
        };

        let doc = bson::to_document(&detail).expect("detail serializes to BSON");
        let back: GradeStructureDetail =
            bson::from_document(doc).expect("detail deserializes from BSON");

        assert_eq!(back.id, detail.id);
        assert_eq!(back.grade_structure_id, detail.grade_structure_id);
        assert_eq!(back.point, detail.point);
    }
}
