use serde::Deserialize;

use crate::{
    error::ApiError,
    validation::{required, Validate},
};

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub text: Option<String>,
}

impl Validate for MessageBody {
    type Output = String;

    fn validate(self) -> Result<String, ApiError> {
        required(self.text, "Text is required")
    }
}
