use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Database;
use rocket::futures::StreamExt;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    GradeError, GradeStructure, GradeStructureDetail, GRADE_DETAIL_COLLECTION_NAME,
    GRADE_STRUCTURE_COLLECTION_NAME,
};

pub(crate) mod filter {
    use bson::{doc, Document};
    use uuid::Uuid;

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": bson::Uuid::from_uuid_1(id) }
    }

    #[inline]
    pub fn by_class_id(class_id: Uuid) -> Document {
        doc! { "class_id": class_id.to_string() }
    }

    #[inline]
    pub fn by_structure(structure_id: Uuid) -> Document {
        doc! { "grade_structure_id": structure_id.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeDetailData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub point: f64,
}

pub trait GradeStructureDbExt {
    /// Rubric summary of a classroom; `None` means no rubric yet and is a
    /// valid state, not a failure.
    async fn grade_structure(&self, class_id: Uuid) -> Result<Option<GradeStructure>, GradeError>;

    /// Detail documents of `structure`, in `detail_ids` order.
    async fn grade_details(
        &self,
        structure: &GradeStructure,
    ) -> Result<Vec<GradeStructureDetail>, GradeError>;

    /// Adds a rubric line, creating the classroom's structure on first use.
    ///
    /// The structure is claimed with a `$setOnInsert` upsert keyed by
    /// `class_id`, so concurrent first insertions for the same classroom
    /// converge on a single structure document.
    async fn add_grade_detail(
        &self,
        class_id: Uuid,
        data: GradeDetailData,
    ) -> Result<GradeStructureDetail, GradeError>;

    async fn update_grade_detail(
        &self,
        detail_id: Uuid,
        data: GradeDetailData,
    ) -> Result<GradeStructureDetail, GradeError>;

    /// Removes a rubric line together with the classroom's structure
    /// document.
    ///
    /// Both deletions are coupled unconditionally: a multi-line rubric
    /// loses its summary document when any single line is removed.
    async fn remove_grade_detail(
        &self,
        class_id: Uuid,
        detail_id: Uuid,
    ) -> Result<GradeStructureDetail, GradeError>;
}

impl GradeStructureDbExt for Database {
    async fn grade_structure(&self, class_id: Uuid) -> Result<Option<GradeStructure>, GradeError> {
        Ok(self
            .collection::<GradeStructure>(GRADE_STRUCTURE_COLLECTION_NAME)
            .find_one(filter::by_class_id(class_id), None)
            .await?)
    }

    async fn grade_details(
        &self,
        structure: &GradeStructure,
    ) -> Result<Vec<GradeStructureDetail>, GradeError> {
        let mut cursor = self
            .collection::<GradeStructureDetail>(GRADE_DETAIL_COLLECTION_NAME)
            .find(filter::by_structure(structure.id), None)
            .await?;

        let mut details: Vec<GradeStructureDetail> = vec![];
        while let Some(result) = cursor.next().await {
            match result {
                Ok(detail) => details.push(detail),
                Err(_) => {
                    tracing::warn!("Unable to deserialize GradeStructureDetail document.")
                }
            }
        }

        // detail_ids is the creation order; unreferenced strays sort last.
        let position = |id: Uuid| {
            structure
                .detail_ids
                .iter()
                .position(|it| *it == id)
                .unwrap_or(usize::MAX)
        };
        details.sort_by_key(|it| position(it.id));

        Ok(details)
    }

    async fn add_grade_detail(
        &self,
        class_id: Uuid,
        data: GradeDetailData,
    ) -> Result<GradeStructureDetail, GradeError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let structure = self
            .collection::<GradeStructure>(GRADE_STRUCTURE_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_class_id(class_id),
                doc! {
                    "$setOnInsert": {
                        "_id": bson::Uuid::from_uuid_1(Uuid::new_v4()),
                        "class_id": class_id.to_string(),
                        "detail_ids": [],
                    }
                },
                options,
            )
            .await?
            .expect("upsert with ReturnDocument::After always yields a document");

        let detail = GradeStructureDetail {
            id: Uuid::new_v4(),
            grade_structure_id: structure.id,
            title: data.title,
            description: data.description,
            point: data.point,
        };

        self.collection::<GradeStructureDetail>(GRADE_DETAIL_COLLECTION_NAME)
            .insert_one(&detail, None)
            .await?;

        self.collection::<GradeStructure>(GRADE_STRUCTURE_COLLECTION_NAME)
            .update_one(
                filter::by_id(structure.id),
                doc! { "$push": { "detail_ids": detail.id.to_string() } },
                None,
            )
            .await?;

        tracing::info!(
            "added grade detail {} to structure {} of classroom {}",
            detail.id,
            structure.id,
            class_id
        );

        Ok(detail)
    }

    async fn update_grade_detail(
        &self,
        detail_id: Uuid,
        data: GradeDetailData,
    ) -> Result<GradeStructureDetail, GradeError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection::<GradeStructureDetail>(GRADE_DETAIL_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(detail_id),
                doc! {
                    "$set": {
                        "title": data.title,
                        "description": data.description,
                        "point": data.point,
                    }
                },
                options,
            )
            .await?
            .ok_or(GradeError::DetailNotFound)
    }

    async fn remove_grade_detail(
        &self,
        class_id: Uuid,
        detail_id: Uuid,
    ) -> Result<GradeStructureDetail, GradeError> {
        let structure = self
            .collection::<GradeStructure>(GRADE_STRUCTURE_COLLECTION_NAME)
            .find_one_and_delete(filter::by_class_id(class_id), None)
            .await?;

        if let Some(structure) = structure {
            tracing::info!(
                "removed grade structure {} of classroom {}",
                structure.id,
                class_id
            );
        }

        self.collection::<GradeStructureDetail>(GRADE_DETAIL_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(detail_id), None)
            .await?
            .ok_or(GradeError::DetailNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_id_filter_uses_canonical_string() {
        let class_id = Uuid::new_v4();
        let filter = filter::by_class_id(class_id);

        assert_eq!(
            filter.get_str("class_id").unwrap(),
            class_id.to_string().as_str()
        );
    }
}
