// ============================================================================
// SERVICE : ANNUAIRE DES UTILISATEURS
// ============================================================================
//
// - /users      : admin/staff uniquement (liste, création, lecture, patch, suppression)
// - /users/me   : tout acteur authentifié; le champ role n'est pris en compte
//                 que si le compte a déjà le rôle admin (sinon ignoré sans erreur)
//
// Un compte créé par un admin reçoit aussi un code de confirmation,
// généré dans la même transaction que l'insertion.
//
// ============================================================================

use sea_orm::*;
use validator::Validate;

use crate::error::{ApiError, FieldErrors};
use crate::models::dto::{SearchQuery, UserCreateRequest, UserPatchRequest, UserResponse};
use crate::models::users;
use crate::services::pagination::{self, Page};
use crate::services::policy::{self, Action, Actor, Resource};
use crate::utils::confirmation::ConfirmationCodes;

pub struct UserService;

pub(crate) const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub(crate) const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// Violation d'unicité à l'insertion/mise à jour d'un compte -> erreur de champ.
///
/// Couvre la course entre la vérification préalable et l'écriture.
pub(crate) fn map_unique_violation(err: DbErr) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => conflict_on(&detail),
        _ => err.into(),
    }
}

/// Le nom de la contrainte (`users_email_key`, `users_username_key`) désigne le champ.
fn conflict_on(detail: &str) -> ApiError {
    if detail.contains("email") {
        ApiError::field("email", EMAIL_TAKEN)
    } else {
        ApiError::field("username", USERNAME_TAKEN)
    }
}

/// Applique un patch partiel: seuls les champs présents passent à `Set`.
///
/// Un rôle inconnu est refusé sur le champ `role`.
pub fn apply_patch(user: users::Model, patch: UserPatchRequest) -> Result<users::ActiveModel, ApiError> {
    let role = patch.requested_role().map_err(|message| ApiError::field("role", message))?;
    let mut active: users::ActiveModel = user.into();
    if let Some(username) = patch.username {
        active.username = Set(username);
    }
    if let Some(email) = patch.email {
        active.email = Set(email);
    }
    if let Some(first_name) = patch.first_name {
        active.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = patch.last_name {
        active.last_name = Set(Some(last_name));
    }
    if let Some(bio) = patch.bio {
        active.bio = Set(Some(bio));
    }
    if let Some(role) = role {
        active.role = Set(role);
    }
    Ok(active)
}

impl UserService {
    pub async fn list_users(
        db: &DatabaseConnection,
        actor: &Actor,
        query: &SearchQuery,
        default_page_size: u64,
    ) -> Result<Page<UserResponse>, ApiError> {
        policy::ensure(actor, Action::Read, Resource::UserDirectory)?;
        let (page, size) = query.page_query().resolve(default_page_size)?;

        let mut select = users::Entity::find().order_by_asc(users::Column::Id);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(users::Column::Username.contains(search));
        }

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        Ok(page.map(UserResponse::from))
    }

    pub async fn create_user(
        db: &DatabaseConnection,
        codes: &ConfirmationCodes,
        actor: &Actor,
        request: UserCreateRequest,
    ) -> Result<UserResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::UserDirectory)?;
        request.validate()?;
        Self::check_unique(db, Some(request.username.as_str()), Some(request.email.as_str()), None).await?;

        let txn = db.begin().await?;
        let created = users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            role: Set(request.role),
            is_staff: Set(false),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            bio: Set(request.bio),
            confirmation_code: Set(String::new()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(map_unique_violation)?;

        let user = Self::issue_confirmation_code(&txn, codes, created).await?;
        txn.commit().await?;

        tracing::info!(username = %user.username, role = user.role.as_str(), "user created by admin");
        Ok(user.into())
    }

    pub async fn get_user(
        db: &DatabaseConnection,
        actor: &Actor,
        username: &str,
    ) -> Result<UserResponse, ApiError> {
        policy::ensure(actor, Action::Read, Resource::UserDirectory)?;
        Self::find_by_username(db, username).await.map(UserResponse::from)
    }

    pub async fn update_user(
        db: &DatabaseConnection,
        actor: &Actor,
        username: &str,
        patch: UserPatchRequest,
    ) -> Result<UserResponse, ApiError> {
        policy::ensure(actor, Action::Update, Resource::UserDirectory)?;
        let user = Self::find_by_username(db, username).await?;
        let updated = Self::save_patch(db, user, patch).await?;

        tracing::info!(username = %updated.username, "user updated by admin");
        Ok(updated.into())
    }

    pub async fn delete_user(
        db: &DatabaseConnection,
        actor: &Actor,
        username: &str,
    ) -> Result<(), ApiError> {
        policy::ensure(actor, Action::Delete, Resource::UserDirectory)?;
        let user = Self::find_by_username(db, username).await?;

        // reviews et commentaires suivent par ON DELETE CASCADE
        users::Entity::delete_by_id(user.id).exec(db).await?;

        tracing::info!(username, "user deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // /users/me
    // ------------------------------------------------------------------------

    pub async fn me(db: &DatabaseConnection, actor: &Actor) -> Result<UserResponse, ApiError> {
        policy::ensure(actor, Action::Read, Resource::OwnProfile)?;
        let principal = actor.require_principal()?;
        Self::find_by_id(db, principal.user_id).await.map(UserResponse::from)
    }

    pub async fn update_me(
        db: &DatabaseConnection,
        actor: &Actor,
        patch: UserPatchRequest,
    ) -> Result<UserResponse, ApiError> {
        policy::ensure(actor, Action::Update, Resource::OwnProfile)?;
        let principal = actor.require_principal()?;

        let patch = if policy::may_change_own_role(principal) {
            patch
        } else {
            if patch.role.is_some() {
                tracing::debug!(username = %principal.username, "ignoring role change on own profile");
            }
            patch.without_role()
        };

        let user = Self::find_by_id(db, principal.user_id).await?;
        let updated = Self::save_patch(db, user, patch).await?;
        Ok(updated.into())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Génère le code à partir de l'état persisté (id compris) puis l'enregistre.
    pub async fn issue_confirmation_code<C: ConnectionTrait>(
        conn: &C,
        codes: &ConfirmationCodes,
        user: users::Model,
    ) -> Result<users::Model, DbErr> {
        let code = codes.make_code(&user);
        let mut active: users::ActiveModel = user.into();
        active.confirmation_code = Set(code);
        active.update(conn).await
    }

    async fn save_patch(
        db: &DatabaseConnection,
        user: users::Model,
        patch: UserPatchRequest,
    ) -> Result<users::Model, ApiError> {
        patch.validate()?;
        Self::check_unique(db, patch.username.as_deref(), patch.email.as_deref(), Some(user.id)).await?;

        let active = apply_patch(user, patch)?;
        if !active.is_changed() {
            return Ok(active.try_into_model()?);
        }
        active.update(db).await.map_err(map_unique_violation)
    }

    /// Conflits username/email, hors compte `exclude_id`.
    async fn check_unique(
        db: &DatabaseConnection,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();

        if let Some(username) = username {
            let taken = users::Entity::find()
                .filter(users::Column::Username.eq(username))
                .one(db)
                .await?
                .is_some_and(|u| Some(u.id) != exclude_id);
            if taken {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        if let Some(email) = email {
            let taken = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(db)
                .await?
                .is_some_and(|u| Some(u.id) != exclude_id);
            if taken {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        errors.into_result()
    }

    async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<users::Model, ApiError> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))
    }

    async fn find_by_id(db: &DatabaseConnection, user_id: i32) -> Result<users::Model, ApiError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("User"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Role;
    use crate::services::policy::Principal;
    use sea_orm::{ActiveValue, DatabaseBackend, MockDatabase};

    fn user_model(id: i32, role: Role) -> users::Model {
        users::Model {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            role,
            is_staff: false,
            first_name: None,
            last_name: None,
            bio: None,
            confirmation_code: "code".into(),
        }
    }

    fn actor_for(user: &users::Model) -> Actor {
        Actor::Authenticated(Principal::from(user))
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let patch = UserPatchRequest {
            bio: Some("Cinephile".into()),
            ..Default::default()
        };
        let active = apply_patch(user_model(1, Role::User), patch).unwrap();

        assert_eq!(active.bio, ActiveValue::Set(Some("Cinephile".to_string())));
        assert!(!active.role.is_set());
        assert!(!active.email.is_set());
    }

    #[tokio::test]
    async fn test_non_admin_role_change_is_ignored() {
        let me = user_model(1, Role::User);
        let mut updated = me.clone();
        updated.bio = Some("Cinephile".into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();

        let patch = UserPatchRequest {
            bio: Some("Cinephile".into()),
            role: Some(serde_json::json!("admin")),
            ..Default::default()
        };
        let response = UserService::update_me(&db, &actor_for(&me), patch).await.unwrap();

        assert_eq!(response.role, Role::User);
        assert_eq!(response.bio.as_deref(), Some("Cinephile"));

        // L'UPDATE envoyé ne contient pas la colonne role
        let log = format!("{:?}", db.into_transaction_log());
        let update = &log[log.find("UPDATE").unwrap()..];
        assert!(!update.contains(r#"\"role\" ="#));
    }

    #[tokio::test]
    async fn test_admin_can_change_own_role() {
        let me = user_model(1, Role::Admin);
        let mut updated = me.clone();
        updated.role = Role::Moderator;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();

        let patch = UserPatchRequest { role: Some(serde_json::json!("moderator")), ..Default::default() };
        let response = UserService::update_me(&db, &actor_for(&me), patch).await.unwrap();
        assert_eq!(response.role, Role::Moderator);
    }

    #[tokio::test]
    async fn test_non_admin_unknown_role_does_not_block_patch() {
        let me = user_model(1, Role::Moderator);
        let mut updated = me.clone();
        updated.bio = Some("Cinephile".into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me.clone()]])
            .append_query_results([vec![updated]])
            .into_connection();

        // Corps tel que reçu par le handler
        let patch: UserPatchRequest =
            serde_json::from_str(r#"{"bio": "Cinephile", "role": "superuser"}"#).unwrap();
        let response = UserService::update_me(&db, &actor_for(&me), patch).await.unwrap();

        assert_eq!(response.role, Role::Moderator);
        assert_eq!(response.bio.as_deref(), Some("Cinephile"));
    }

    #[tokio::test]
    async fn test_admin_unknown_role_is_a_field_error() {
        let me = user_model(1, Role::Admin);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![me.clone()]])
            .into_connection();

        let patch: UserPatchRequest = serde_json::from_str(r#"{"role": "superuser"}"#).unwrap();
        let err = UserService::update_me(&db, &actor_for(&me), patch).await.unwrap_err();

        match err {
            ApiError::Validation(fields) => assert_eq!(
                fields.get("role"),
                Some(&[r#""superuser" is not a valid choice."#.to_string()][..])
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_names_the_field() {
        let err = conflict_on(r#"duplicate key value violates unique constraint "users_email_key""#);
        match err {
            ApiError::Validation(fields) => assert_eq!(fields.get("email"), Some(&[EMAIL_TAKEN.to_string()][..])),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = conflict_on(r#"duplicate key value violates unique constraint "users_username_key""#);
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.get("username"), Some(&[USERNAME_TAKEN.to_string()][..]))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_other_db_errors_stay_internal() {
        let err = map_unique_violation(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, ApiError::Database(_)));
    }

    #[tokio::test]
    async fn test_me_requires_authentication() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = UserService::me(&db, &Actor::Anonymous).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_directory_is_admin_only() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let moderator = user_model(2, Role::Moderator);

        let err = UserService::get_user(&db, &actor_for(&moderator), "user1").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = UserService::delete_user(&db, &actor_for(&moderator), "user1").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_patch_with_taken_email() {
        let admin = user_model(1, Role::Admin);
        let target = user_model(2, Role::User);
        let other = user_model(3, Role::User);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target]])
            .append_query_results([vec![other]])
            .into_connection();

        let patch = UserPatchRequest { email: Some("user3@example.com".into()), ..Default::default() };
        let err = UserService::update_user(&db, &actor_for(&admin), "user2", patch)
            .await
            .unwrap_err();

        match err {
            ApiError::Validation(fields) => assert_eq!(fields.get("email"), Some(&[EMAIL_TAKEN.to_string()][..])),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_admin_created_user_gets_confirmation_code() {
        let admin = user_model(1, Role::Admin);
        let mut inserted = user_model(9, Role::Moderator);
        inserted.confirmation_code = String::new();
        let codes = ConfirmationCodes::new("secret").unwrap();
        let mut with_code = inserted.clone();
        with_code.confirmation_code = codes.make_code(&inserted);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![inserted]])
            .append_query_results([vec![with_code]])
            .into_connection();

        let request = UserCreateRequest {
            username: "user9".into(),
            email: "user9@example.com".into(),
            first_name: None,
            last_name: None,
            bio: None,
            role: Role::Moderator,
        };
        let response = UserService::create_user(&db, &codes, &actor_for(&admin), request)
            .await
            .unwrap();
        assert_eq!(response.role, Role::Moderator);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"\"confirmation_code\" ="#));
    }
}
