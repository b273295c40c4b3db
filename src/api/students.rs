use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{GuardianStudentLink, Id, NewStudent, Student};

impl ApiClient {
    pub async fn list_students(&self) -> ClientResult<Vec<Student>> {
        self.get_list("/students").await
    }

    pub async fn get_student(&self, id: Id) -> ClientResult<Student> {
        self.get(&format!("/students/{}", id)).await
    }

    pub async fn get_students_by_room(&self, room_id: Id) -> ClientResult<Vec<Student>> {
        self.get_list(&format!("/students/room/{}", room_id)).await
    }

    /// A guardian's children.
    pub async fn get_students_by_guardian(&self, guardian_id: Id) -> ClientResult<Vec<Student>> {
        self.get_list(&format!("/students/guardian/{}", guardian_id))
            .await
    }

    pub async fn create_student(&self, student: &NewStudent) -> ClientResult<Student> {
        self.post("/students", validated(student)?).await
    }

    pub async fn update_student(&self, id: Id, student: &NewStudent) -> ClientResult<Student> {
        self.put(&format!("/students/{}", id), validated(student)?)
            .await
    }

    pub async fn delete_student(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/students/{}", id)).await
    }

    pub async fn link_guardian_student(&self, guardian_id: Id, student_id: Id) -> ClientResult<()> {
        let link = GuardianStudentLink {
            guardian_id,
            student_id,
        };
        self.post_empty("/guardian-student", &link).await
    }

    pub async fn unlink_guardian_student(
        &self,
        guardian_id: Id,
        student_id: Id,
    ) -> ClientResult<()> {
        self.delete(&format!("/guardian-student/{}/{}", guardian_id, student_id))
            .await
    }
}
