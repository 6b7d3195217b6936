//! Request validation that runs before any handler touches the store.

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// A request body that can be checked into its validated form.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ApiError>;
}

/// JSON body extractor that rejects with `400 {error}` when the body does not
/// parse or fails [`Validate`].
pub struct Valid<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned + Send,
    T::Output: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                warn!(error = %rejection, "rejected request body");
                ApiError::InvalidInput(rejection.body_text())
            })?;
        let valid = body.validate().map_err(|e| {
            warn!(error = %e, "validation failed");
            e
        })?;
        Ok(Valid(valid))
    }
}

/// Like [`Valid`], but an empty body validates `T::default()`.
pub struct ValidOrEmpty<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for ValidOrEmpty<T>
where
    S: Send + Sync,
    T: Validate + Default + DeserializeOwned + Send,
    T::Output: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidInput(rejection.body_text()))?;
        let body = if bytes.is_empty() {
            T::default()
        } else {
            let Json(body) = Json::<T>::from_bytes(&bytes).map_err(|rejection| {
                warn!(error = %rejection, "rejected request body");
                ApiError::InvalidInput(rejection.body_text())
            })?;
            body
        };
        Ok(ValidOrEmpty(body.validate()?))
    }
}

/// Numeric `:id` path segment.
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidInput("Invalid id".into()))?;
        Ok(EntityId(id))
    }
}

/// Returns the trimmed value, or `InvalidInput(message)` when absent or blank.
pub fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApiError::InvalidInput(message.to_string())),
    }
}

/// Blank optional strings are treated as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct NameBody {
        name: Option<String>,
    }

    impl Validate for NameBody {
        type Output = String;

        fn validate(self) -> Result<String, ApiError> {
            required(self.name, "Name is required")
        }
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_and_trims_valid_body() {
        let Valid(name) = Valid::<NameBody>::from_request(json_request(r#"{"name":"  jace "}"#), &())
            .await
            .unwrap();
        assert_eq!(name, "jace");
    }

    #[tokio::test]
    async fn missing_or_blank_field_is_invalid_input() {
        for body in [r#"{}"#, r#"{"name":null}"#, r#"{"name":"   "}"#] {
            let err = Valid::<NameBody>::from_request(json_request(body), &())
                .await
                .err()
                .unwrap();
            assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "Name is required"));
        }
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_input() {
        let err = Valid::<NameBody>::from_request(json_request("{not json"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[derive(Debug, Default, Deserialize)]
    struct Patch {
        note: Option<String>,
    }

    impl Validate for Patch {
        type Output = Option<String>;

        fn validate(self) -> Result<Option<String>, ApiError> {
            Ok(self.note)
        }
    }

    #[tokio::test]
    async fn empty_body_falls_back_to_default() {
        let req = Request::builder()
            .method("PUT")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let ValidOrEmpty(note) = ValidOrEmpty::<Patch>::from_request(req, &()).await.unwrap();
        assert_eq!(note, None);

        let ValidOrEmpty(note) =
            ValidOrEmpty::<Patch>::from_request(json_request(r#"{"note":"keep"}"#), &())
                .await
                .unwrap();
        assert_eq!(note.as_deref(), Some("keep"));

        let err = ValidOrEmpty::<Patch>::from_request(json_request("{oops"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some(" ".into())), None);
        assert_eq!(optional(Some("Flying".into())).as_deref(), Some("Flying"));
        assert_eq!(optional(None), None);
    }
}
