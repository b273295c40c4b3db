use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{Id, Medication, NewMedication};

impl ApiClient {
    pub async fn list_medications(&self) -> ClientResult<Vec<Medication>> {
        self.get_list("/medications").await
    }

    pub async fn get_medication(&self, id: Id) -> ClientResult<Medication> {
        self.get(&format!("/medications/{}", id)).await
    }

    pub async fn get_medications_by_student(&self, student_id: Id) -> ClientResult<Vec<Medication>> {
        self.get_list(&format!("/medications/student/{}", student_id))
            .await
    }

    pub async fn create_medication(&self, medication: &NewMedication) -> ClientResult<Medication> {
        self.post("/medications", validated(medication)?).await
    }

    pub async fn update_medication(
        &self,
        id: Id,
        medication: &NewMedication,
    ) -> ClientResult<Medication> {
        self.put(&format!("/medications/{}", id), validated(medication)?)
            .await
    }

    pub async fn delete_medication(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/medications/{}", id)).await
    }
}
