//! JSON body extraction with schema validation

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{Error, FieldError};
use crate::types::Validate;

/// Like [`Json`], but rejects bodies that fail [`Validate`] with a 422
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(from_json_rejection)?;

        value.validate().map_err(Error::validation)?;
        Ok(Self(value))
    }
}

/// Schema mismatches become field-level validation errors; anything else
/// (syntax errors, missing content type) keeps axum's status
fn from_json_rejection(rejection: JsonRejection) -> Error {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let detail = err.body_text();
            let field = field_from_detail(&detail);
            Error::validation(vec![FieldError::new(field, detail)])
        }
        other => Error::Rejected {
            status: other.status(),
            message: other.body_text(),
        },
    }
}

/// Best-effort field name from a deserialization message
fn field_from_detail(detail: &str) -> String {
    let rest = detail
        .split_once("target type: ")
        .map(|(_, rest)| rest)
        .unwrap_or(detail);

    if let Some(missing) = rest.strip_prefix("missing field `") {
        if let Some((name, _)) = missing.split_once('`') {
            return name.to_string();
        }
    }

    match rest.split_once(": ") {
        Some((path, _)) if !path.is_empty() && !path.contains(' ') => path.to_string(),
        _ => "body".to_string(),
    }
}
