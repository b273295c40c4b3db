use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{Id, MedicalCondition, NewCondition, StudentConditionLink};

impl ApiClient {
    pub async fn list_conditions(&self) -> ClientResult<Vec<MedicalCondition>> {
        self.get_list("/conditions").await
    }

    pub async fn get_condition(&self, id: Id) -> ClientResult<MedicalCondition> {
        self.get(&format!("/conditions/{}", id)).await
    }

    pub async fn create_condition(
        &self,
        condition: &NewCondition,
    ) -> ClientResult<MedicalCondition> {
        self.post("/conditions", validated(condition)?).await
    }

    pub async fn update_condition(
        &self,
        id: Id,
        condition: &NewCondition,
    ) -> ClientResult<MedicalCondition> {
        self.put(&format!("/conditions/{}", id), validated(condition)?)
            .await
    }

    pub async fn delete_condition(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/conditions/{}", id)).await
    }

    /// Every student-condition link, with names filled in by the backend.
    pub async fn list_student_conditions(&self) -> ClientResult<Vec<StudentConditionLink>> {
        self.get_list("/student-condition").await
    }

    /// A student's conditions, including each one's emergency protocol.
    pub async fn get_conditions_for_student(
        &self,
        student_id: Id,
    ) -> ClientResult<Vec<StudentConditionLink>> {
        self.get_list(&format!("/student-condition/student/{}", student_id))
            .await
    }

    pub async fn link_student_condition(&self, student_id: Id, condition_id: Id) -> ClientResult<()> {
        let link = StudentConditionLink {
            student_id,
            condition_id,
            student_name: None,
            condition_name: None,
            condition_description: None,
        };
        self.post_empty("/student-condition", &link).await
    }

    pub async fn unlink_student_condition(
        &self,
        student_id: Id,
        condition_id: Id,
    ) -> ClientResult<()> {
        self.delete(&format!("/student-condition/{}/{}", student_id, condition_id))
            .await
    }
}
