pub mod claims;
pub mod session;
pub mod storage;

pub use claims::{decode_claims, Claims};
pub use session::{SessionState, SessionStore, DEFAULT_STORAGE_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
