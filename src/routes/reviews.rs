use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{ReviewCreateRequest, ReviewPatchRequest};
use crate::services::feedback_service::FeedbackService;
use crate::services::pagination::PageQuery;
use crate::services::policy::Actor;

/// GET /titles/{title_id}/reviews (PUBLIC)
#[get("")]
pub async fn list_reviews(
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let page =
        FeedbackService::list_reviews(db.get_ref(), path.into_inner(), query.into_inner(), config.page_size)
            .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /titles/{title_id}/reviews/{review_id} (PUBLIC)
#[get("/{review_id}")]
pub async fn get_review(
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id) = path.into_inner();
    let review = FeedbackService::get_review(db.get_ref(), title_id, review_id).await?;
    Ok(HttpResponse::Ok().json(review))
}

/// POST /titles/{title_id}/reviews (AUTHENTIFIÉ) - une seule review par titre et auteur
#[post("")]
pub async fn create_review(
    actor: Actor,
    path: web::Path<i32>,
    body: web::Json<ReviewCreateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let created =
        FeedbackService::create_review(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PATCH /titles/{title_id}/reviews/{review_id} (AUTEUR / MODÉRATEUR / ADMIN)
#[patch("/{review_id}")]
pub async fn update_review(
    actor: Actor,
    path: web::Path<(i32, i32)>,
    body: web::Json<ReviewPatchRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id) = path.into_inner();
    let updated =
        FeedbackService::update_review(db.get_ref(), &actor, title_id, review_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /titles/{title_id}/reviews/{review_id} (AUTEUR / MODÉRATEUR / ADMIN)
#[delete("/{review_id}")]
pub async fn delete_review(
    actor: Actor,
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id) = path.into_inner();
    FeedbackService::delete_review(db.get_ref(), &actor, title_id, review_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn reviews_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles/{title_id}/reviews")
            .service(list_reviews)
            .service(create_review)
            .service(get_review)
            .service(update_review)
            .service(delete_review)
    );
}
