use serde::Deserialize;

use crate::{
    error::ApiError,
    validation::{required, Validate},
};

/// Body of `POST /users` and `PUT /users/:id`.
#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub username: Option<String>,
}

impl Validate for UserBody {
    type Output = String;

    fn validate(self) -> Result<String, ApiError> {
        required(self.username, "Username is required")
    }
}
