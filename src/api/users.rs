use super::{validated, ApiClient};
use crate::error::ClientResult;
use crate::models::{Id, NewUser, User};

impl ApiClient {
    pub async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.get_list("/users").await
    }

    pub async fn get_user(&self, id: Id) -> ClientResult<User> {
        self.get(&format!("/users/{}", id)).await
    }

    pub async fn get_users_by_room(&self, room_id: Id) -> ClientResult<Vec<User>> {
        self.get_list(&format!("/users/room/{}", room_id)).await
    }

    pub async fn list_guardians(&self) -> ClientResult<Vec<User>> {
        self.get_list("/users?role=guardian").await
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<User> {
        self.post("/users", validated(user)?).await
    }

    pub async fn update_user(&self, id: Id, user: &NewUser) -> ClientResult<User> {
        self.put(&format!("/users/{}", id), validated(user)?).await
    }

    pub async fn delete_user(&self, id: Id) -> ClientResult<()> {
        self.delete(&format!("/users/{}", id)).await
    }
}
