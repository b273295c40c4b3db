#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Server responded with {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Could not persist session: {0}")]
    StorageWrite(#[source] std::io::Error),

    #[error("Upload failed: {0}")]
    Upload(#[source] Box<ClientError>),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Upload(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Http { status: 401, .. } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ClientError::Http { status: 403, .. } => {
                "You do not have permission to do that.".to_string()
            }
            ClientError::Http { status: 404, .. } => "Not found.".to_string(),
            ClientError::Http { status, .. } if *status >= 500 => {
                "The server had a problem. Try again later.".to_string()
            }
            ClientError::Http { .. } => "The request was rejected by the server.".to_string(),
            ClientError::MalformedToken(_) | ClientError::NotSignedIn => {
                "Please sign in again.".to_string()
            }
            ClientError::StorageWrite(_) => "Could not save your session on this device.".to_string(),
            ClientError::Upload(_) => "Could not upload the picture. Try again.".to_string(),
            ClientError::Validation(errors) => {
                let mut fields: Vec<_> = errors.field_errors().into_keys().collect();
                fields.sort();
                format!("Please fill in the required fields: {}", fields.join(", "))
            }
            ClientError::UnexpectedShape(_) => {
                "The server sent a response this app does not understand.".to_string()
            }
            ClientError::Io(_) => "Could not read the selected file.".to_string(),
            ClientError::Config(_) => "The app is misconfigured.".to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
