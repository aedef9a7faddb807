//! Validated JSON extractor.
//!
//! `ValidatedJson<T>` deserializes the body and runs the `validator` rules of
//! `T`. Failures answer 400 in the standard error envelope, with one entry per
//! offending field in `details`.

use crate::responses::error_response;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use trimly_core::{field_errors, validation_errors_to_trimly_error, ErrorResponse, FieldError};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// JSON body that passed its validation rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Rejection type for validated JSON extraction.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// Body missing, not JSON, or not shaped like `T`.
    JsonError(JsonRejection),
    /// Field rules failed.
    ValidationError(ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::JsonError(rejection) => error_response(
                rejection.status(),
                ErrorResponse {
                    code: "INVALID_JSON".to_string(),
                    message: format!("Invalid JSON: {}", rejection.body_text()),
                    details: None,
                },
            ),
            Self::ValidationError(errors) => {
                let details = collect_field_errors(&errors);
                let error = validation_errors_to_trimly_error(errors);
                error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::from_error(&error).with_details(details),
                )
            }
        }
    }
}

/// Flattens validator errors, naming nested fields `parent.child` and list
/// items `parent[index].child`.
fn collect_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = field_errors(errors);

    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Struct(nested) => {
                fields.extend(collect_field_errors(nested).into_iter().map(|e| FieldError {
                    field: format!("{field}.{}", e.field),
                    ..e
                }));
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    fields.extend(collect_field_errors(nested).into_iter().map(|e| FieldError {
                        field: format!("{field}[{index}].{}", e.field),
                        ..e
                    }));
                }
            }
            ValidationErrorsKind::Field(_) => {}
        }
    }

    fields
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Stylist {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
        #[validate(email(message = "Invalid email address"))]
        email: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Roster {
        #[validate(length(min = 1))]
        salon: String,
        #[validate(nested)]
        lead: Stylist,
    }

    #[test]
    fn test_flat_field_errors() {
        let errors = Stylist {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
        }
        .validate()
        .unwrap_err();

        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[1].field, "name");
        assert_eq!(fields[1].message, "Name is too short");
    }

    #[test]
    fn test_nested_field_errors_are_prefixed() {
        let errors = Roster {
            salon: "Glow Studio".to_string(),
            lead: Stylist {
                name: "A".to_string(),
                email: "lead@glow.example".to_string(),
            },
        }
        .validate()
        .unwrap_err();

        let fields = collect_field_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "lead.name");
    }

    #[test]
    fn test_validation_rejection_is_bad_request() {
        let errors = Stylist {
            name: "A".to_string(),
            email: "ravi@glow.example".to_string(),
        }
        .validate()
        .unwrap_err();
        let response = ValidatedJsonRejection::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
