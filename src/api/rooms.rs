use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{Id, NewRoom, Room};

impl ApiClient {
    pub async fn list_rooms(&self) -> ClientResult<Vec<Room>> {
        self.get_list("/rooms").await
    }

    pub async fn get_room(&self, id: Id) -> ClientResult<Room> {
        self.get(&format!("/rooms/{}", id)).await
    }

    /// Rooms a teacher is responsible for.
    pub async fn get_rooms_by_teacher(&self, teacher_id: Id) -> ClientResult<Vec<Room>> {
        self.get_list(&format!("/rooms/teacher/{}", teacher_id)).await
    }

    pub async fn create_room(&self, room: &NewRoom) -> ClientResult<Room> {
        self.post("/rooms", validated(room)?).await
    }

    pub async fn update_room(&self, id: Id, room: &NewRoom) -> ClientResult<Room> {
        self.put(&format!("/rooms/{}", id), validated(room)?).await
    }

    pub async fn delete_room(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/rooms/{}", id)).await
    }
}
