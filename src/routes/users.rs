use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{SearchQuery, UserCreateRequest, UserPatchRequest};
use crate::services::auth_service::AuthService;
use crate::services::policy::Actor;
use crate::services::user_service::UserService;

/// GET /users/me (AUTHENTIFIÉ)
#[get("/me")]
pub async fn me(actor: Actor, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let user = UserService::me(db.get_ref(), &actor).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /users/me (AUTHENTIFIÉ) - role ignoré sauf pour un admin
#[patch("/me")]
pub async fn update_me(
    actor: Actor,
    body: web::Json<UserPatchRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::update_me(db.get_ref(), &actor, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /users?search= (ADMIN)
#[get("")]
pub async fn list_users(
    actor: Actor,
    query: web::Query<SearchQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let page = UserService::list_users(db.get_ref(), &actor, &query, config.page_size).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /users (ADMIN)
#[post("")]
pub async fn create_user(
    actor: Actor,
    body: web::Json<UserCreateRequest>,
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::create_user(db.get_ref(), &auth.codes, &actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// GET /users/{username} (ADMIN)
#[get("/{username}")]
pub async fn get_user(
    actor: Actor,
    username: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::get_user(db.get_ref(), &actor, &username).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// PATCH /users/{username} (ADMIN)
#[patch("/{username}")]
pub async fn update_user(
    actor: Actor,
    username: web::Path<String>,
    body: web::Json<UserPatchRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::update_user(db.get_ref(), &actor, &username, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{username} (ADMIN)
#[delete("/{username}")]
pub async fn delete_user(
    actor: Actor,
    username: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    UserService::delete_user(db.get_ref(), &actor, &username).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn users_routes(cfg: &mut web::ServiceConfig) {
    // /me avant /{username}
    cfg.service(
        web::scope("/users")
            .service(me)
            .service(update_me)
            .service(list_users)
            .service(create_user)
            .service(get_user)
            .service(update_user)
            .service(delete_user)
    );
}
