use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{CommentPatchRequest, CommentRequest};
use crate::services::feedback_service::FeedbackService;
use crate::services::pagination::PageQuery;
use crate::services::policy::Actor;

/// GET /titles/{title_id}/reviews/{review_id}/comments (PUBLIC)
#[get("")]
pub async fn list_comments(
    path: web::Path<(i32, i32)>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id) = path.into_inner();
    let page = FeedbackService::list_comments(
        db.get_ref(),
        title_id,
        review_id,
        query.into_inner(),
        config.page_size,
    )
    .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /titles/{title_id}/reviews/{review_id}/comments/{comment_id} (PUBLIC)
#[get("/{comment_id}")]
pub async fn get_comment(
    path: web::Path<(i32, i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id, comment_id) = path.into_inner();
    let comment = FeedbackService::get_comment(db.get_ref(), title_id, review_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// POST /titles/{title_id}/reviews/{review_id}/comments (AUTHENTIFIÉ)
#[post("")]
pub async fn create_comment(
    actor: Actor,
    path: web::Path<(i32, i32)>,
    body: web::Json<CommentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id) = path.into_inner();
    let created =
        FeedbackService::create_comment(db.get_ref(), &actor, title_id, review_id, body.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(created))
}

/// PATCH /titles/{title_id}/reviews/{review_id}/comments/{comment_id} (AUTEUR / MODÉRATEUR / ADMIN)
#[patch("/{comment_id}")]
pub async fn update_comment(
    actor: Actor,
    path: web::Path<(i32, i32, i32)>,
    body: web::Json<CommentPatchRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id, comment_id) = path.into_inner();
    let updated = FeedbackService::update_comment(
        db.get_ref(),
        &actor,
        title_id,
        review_id,
        comment_id,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /titles/{title_id}/reviews/{review_id}/comments/{comment_id} (AUTEUR / MODÉRATEUR / ADMIN)
#[delete("/{comment_id}")]
pub async fn delete_comment(
    actor: Actor,
    path: web::Path<(i32, i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let (title_id, review_id, comment_id) = path.into_inner();
    FeedbackService::delete_comment(db.get_ref(), &actor, title_id, review_id, comment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn comments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles/{title_id}/reviews/{review_id}/comments")
            .service(list_comments)
            .service(create_comment)
            .service(get_comment)
            .service(update_comment)
            .service(delete_comment)
    );
}
