use reqwest::Method;

use super::ApiClient;
use crate::auth::decode_claims;
use crate::error::{ClientError, ClientResult};
use crate::models::{Id, LoginRequest, LoginResponse, Role, User};
use crate::upload::{ImageSource, DEFAULT_FILE_NAME};

impl ApiClient {
    /// Authenticate and start a session with the returned token.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        let response: LoginResponse = self.post("/auth/login", &request).await?;
        self.session.sign_in(&response.token).await?;
        Ok(response)
    }

    pub async fn logout(&self) {
        self.session.sign_out().await;
    }

    /// Id of the signed-in user, read from the session token.
    pub fn current_user_id(&self) -> ClientResult<Id> {
        let token = self.session.token().ok_or(ClientError::NotSignedIn)?;
        Ok(decode_claims(&token)?.id)
    }

    /// The signed-in user's own record.
    ///
    /// The backend has no "who am I" endpoint, so the id comes from the token.
    pub async fn get_current_user_profile(&self) -> ClientResult<User> {
        let id = self.current_user_id()?;
        self.get_user(id).await
    }

    /// Replace `user_id`'s profile picture using the uploader chosen at startup.
    pub async fn upload_profile_picture(
        &self,
        user_id: Id,
        image: ImageSource,
        file_name: &str,
    ) -> ClientResult<User> {
        let file_name = match file_name.trim() {
            "" => DEFAULT_FILE_NAME,
            name => name,
        };

        let request = self.request(Method::POST, &format!("/users/upload/{}", user_id));
        let prepared = self
            .uploader
            .prepare(request, image, file_name)
            .await
            .map_err(|e| ClientError::Upload(Box::new(e)))?;

        // The scratch file must outlive the request.
        let (request, scratch) = prepared.into_parts();
        let result = self.fetch(request).await;
        drop(scratch);

        result.map_err(|e| ClientError::Upload(Box::new(e)))
    }

    pub async fn upload_my_profile_picture(
        &self,
        image: ImageSource,
        file_name: &str,
    ) -> ClientResult<User> {
        let id = self.current_user_id()?;
        self.upload_profile_picture(id, image, file_name).await
    }
}
