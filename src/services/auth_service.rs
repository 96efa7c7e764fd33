// ============================================================================
// SERVICE : AUTHENTIFICATION PAR CODE
// ============================================================================
//
// Deux transitions par compte:
//   1. signup(email, username)
//        -> crée le compte (ou le réutilise si email ET username désignent
//           déjà le même compte), génère un code, l'enregistre, l'envoie
//   2. obtain_token(username, code)
//        -> 404 si le compte n'existe pas, 400 si le code ne correspond pas
//        -> sinon JWT bearer
//
// Le code reste valable après usage (pas de consommation). Avec
// CONFIRMATION_CODES_STRICT, il doit aussi correspondre à l'état actuel
// du compte (cf. ConfirmationCodes::is_current).
//
// ============================================================================

use std::sync::Arc;

use sea_orm::*;
use validator::Validate;

use crate::config::AppConfig;
use crate::error::{ApiError, FieldErrors};
use crate::models::dto::{SignupRequest, TokenRequest, TokenResponse};
use crate::models::users::{self, Role};
use crate::services::mailer::Mailer;
use crate::services::policy::{Actor, Principal};
use crate::services::user_service::{self, UserService, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::utils::confirmation::ConfirmationCodes;
use crate::utils::jwt::JwtKeys;

pub const CONFIRMATION_SUBJECT: &str = "Confirmation code to access our API!";

const USER_NOT_FOUND: &str = "User was not found!";
const BAD_CODE: &str = "Your confirmation code is incorrect!";

pub struct AuthService {
    pub keys: JwtKeys,
    pub codes: ConfirmationCodes,
    mailer: Arc<dyn Mailer>,
    strict_codes: bool,
    email_fail_silently: bool,
}

impl AuthService {
    pub fn new(config: &AppConfig, mailer: Arc<dyn Mailer>) -> Result<Self, String> {
        Ok(Self {
            keys: JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
            codes: ConfirmationCodes::new(&config.secret_key)?,
            mailer,
            strict_codes: config.strict_confirmation_codes,
            email_fail_silently: config.email_fail_silently,
        })
    }

    /// Inscription: le code est généré puis persisté dans la même transaction
    /// que la création du compte, l'email part après le commit.
    pub async fn signup(
        &self,
        db: &DatabaseConnection,
        request: SignupRequest,
    ) -> Result<SignupRequest, ApiError> {
        request.validate()?;

        let txn = db.begin().await?;

        let by_username = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(&txn)
            .await?;
        let by_email = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(&txn)
            .await?;

        let user = match (by_username, by_email) {
            (Some(existing), Some(same)) if existing.id == same.id => {
                tracing::debug!(username = %existing.username, "signup for an existing account");
                existing
            }
            (None, None) => {
                users::ActiveModel {
                    username: Set(request.username.clone()),
                    email: Set(request.email.clone()),
                    role: Set(Role::User),
                    is_staff: Set(false),
                    confirmation_code: Set(String::new()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(user_service::map_unique_violation)?
            }
            (by_username, by_email) => {
                let mut errors = FieldErrors::new();
                if by_username.is_some() {
                    errors.add("username", USERNAME_TAKEN);
                }
                if by_email.is_some() {
                    errors.add("email", EMAIL_TAKEN);
                }
                return Err(ApiError::Validation(errors));
            }
        };

        let user = UserService::issue_confirmation_code(&txn, &self.codes, user).await?;
        txn.commit().await?;

        tracing::info!(username = %user.username, "confirmation code issued");
        self.send_code(&user).await?;

        Ok(request)
    }

    async fn send_code(&self, user: &users::Model) -> Result<(), ApiError> {
        let body = format!(
            "Hello {},\n\nYour confirmation code: {}\n",
            user.username, user.confirmation_code
        );

        match self.mailer.send(&user.email, CONFIRMATION_SUBJECT, &body).await {
            Ok(()) => Ok(()),
            Err(e) if self.email_fail_silently => {
                tracing::warn!(username = %user.username, error = %e, "confirmation email not sent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn obtain_token(
        &self,
        db: &DatabaseConnection,
        request: TokenRequest,
    ) -> Result<TokenResponse, ApiError> {
        request.validate()?;

        let user = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(db)
            .await?
            .ok_or(ApiError::NotFound {
                field: "username",
                message: USER_NOT_FOUND.to_string(),
            })?;

        if !self.code_matches(&user, &request.confirmation_code) {
            tracing::debug!(username = %user.username, "rejected confirmation code");
            return Err(ApiError::field("confirmation_code", BAD_CODE));
        }

        let token = self.keys.generate_token(&user).map_err(ApiError::Internal)?;

        tracing::info!(username = %user.username, "token issued");
        Ok(TokenResponse { token })
    }

    fn code_matches(&self, user: &users::Model, code: &str) -> bool {
        if user.confirmation_code.is_empty() || user.confirmation_code != code {
            return false;
        }
        !self.strict_codes || self.codes.is_current(user, code)
    }

    /// Résout l'acteur d'une requête à partir du header Authorization.
    ///
    /// Pas de header: anonyme. Header présent mais invalide, ou compte
    /// supprimé depuis l'émission du token: `Unauthenticated`.
    pub async fn authenticate(
        &self,
        db: &DatabaseConnection,
        authorization: Option<&str>,
    ) -> Result<Actor, ApiError> {
        let Some(header) = authorization else {
            return Ok(Actor::Anonymous);
        };

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthenticated(
                "Invalid Authorization format (expected: Bearer <token>).".to_string(),
            )
        })?;

        let claims = self.keys.verify_token(token.trim()).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            ApiError::Unauthenticated("Given token not valid.".to_string())
        })?;

        let user = users::Entity::find_by_id(claims.sub)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::Unauthenticated("User not found.".to_string()))?;

        Ok(Actor::Authenticated(Principal::from(&user)))
    }
}
