use serde::Serialize;

/// Response body for successful DELETE requests.
#[derive(Debug, Serialize)]
pub struct Deleted<T> {
    pub message: String,
    pub deleted: T,
}

impl<T> Deleted<T> {
    pub fn new(message: impl Into<String>, deleted: T) -> Self {
        Self {
            message: message.into(),
            deleted,
        }
    }
}
