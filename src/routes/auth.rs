use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::ApiError;
use crate::models::dto::{SignupRequest, TokenRequest};
use crate::services::auth_service::AuthService;

/// POST /auth/signup - Inscription, envoie le code par email (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ApiError> {
    let echoed = auth.signup(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(echoed))
}

/// POST /auth/token - Échange username + code contre un JWT (PUBLIC)
#[post("/token")]
pub async fn token(
    body: web::Json<TokenRequest>,
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, ApiError> {
    let response = auth.obtain_token(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(token)
    );
}
