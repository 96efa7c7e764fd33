// ============================================================================
// ERREURS API
// ============================================================================
//
// Taxonomie:
//   - Validation      -> 400 {"champ": ["message", ...]}
//   - Unauthenticated -> 401 {"detail": "..."}
//   - Forbidden       -> 403 {"detail": "..."}
//   - NotFound        -> 404 {"<champ>": "..."}
//   - Database / Mail / Internal -> 500 (message générique, détail dans les logs)
//
// Chaque requête échoue indépendamment: aucune erreur n'est retentée ici.
//
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::services::mailer::MailError;

/// Erreurs de validation rattachées à un champ, au format DRF.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` si aucune erreur n'a été collectée.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", error.code),
                };
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{field}: {message}")]
    NotFound { field: &'static str, message: String },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Erreur de validation sur un seul champ.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound {
            field: "detail",
            message: format!("{} not found.", what),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.into())
    }
}

/// Vrai si l'erreur vient d'une contrainte UNIQUE côté base.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Mail(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            ApiError::Validation(errors) => HttpResponse::build(status).json(errors),
            ApiError::Unauthenticated(detail) => HttpResponse::build(status)
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(serde_json::json!({ "detail": detail })),
            ApiError::Forbidden(detail) => {
                HttpResponse::build(status).json(serde_json::json!({ "detail": detail }))
            }
            ApiError::NotFound { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field.to_string(), serde_json::Value::String(message.clone()));
                HttpResponse::build(status).json(body)
            }
            ApiError::Database(e) => {
                tracing::error!(error = %e, "database error");
                HttpResponse::build(status)
                    .json(serde_json::json!({ "detail": "An internal error occurred." }))
            }
            ApiError::Mail(e) => {
                tracing::error!(error = %e, "mail delivery failed");
                HttpResponse::build(status)
                    .json(serde_json::json!({ "detail": "Could not send the confirmation email." }))
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                HttpResponse::build(status)
                    .json(serde_json::json!({ "detail": "An internal error occurred." }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        name: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::field("slug", "taken").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthenticated("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("nope".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("Title").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_errors_from_validator() {
        let errors = Sample { name: String::new() }.validate().unwrap_err();
        let fields: FieldErrors = errors.into();
        assert_eq!(
            fields.get("name"),
            Some(&["This field may not be blank.".to_string()][..])
        );
    }

    #[test]
    fn test_field_errors_merge_and_result() {
        let mut a = FieldErrors::new();
        assert!(a.clone().into_result().is_ok());

        a.add("email", "taken");
        let mut b = FieldErrors::new();
        b.add("email", "invalid");
        b.add("username", "taken");
        a.merge(b);

        assert_eq!(a.get("email").map(|m| m.len()), Some(2));
        assert!(matches!(a.into_result(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_unauthenticated_sets_www_authenticate() {
        let response = ApiError::Unauthenticated("missing token".into()).error_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
