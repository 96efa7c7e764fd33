use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{TitleCreateRequest, TitleFilter, TitlePatchRequest};
use crate::services::catalog_service::CatalogService;
use crate::services::policy::Actor;

/// GET /titles?category=&genre=&name=&year= (PUBLIC)
#[get("")]
pub async fn list_titles(
    filter: web::Query<TitleFilter>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let page = CatalogService::list_titles(db.get_ref(), &filter, config.page_size).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /titles/{title_id} (PUBLIC)
#[get("/{title_id}")]
pub async fn get_title(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let title = CatalogService::get_title(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(title))
}

/// POST /titles (ADMIN)
#[post("")]
pub async fn create_title(
    actor: Actor,
    body: web::Json<TitleCreateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let created = CatalogService::create_title(db.get_ref(), &actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// PATCH /titles/{title_id} (ADMIN)
#[patch("/{title_id}")]
pub async fn update_title(
    actor: Actor,
    path: web::Path<i32>,
    body: web::Json<TitlePatchRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let updated =
        CatalogService::update_title(db.get_ref(), &actor, path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /titles/{title_id} (ADMIN) - supprime aussi reviews et commentaires
#[delete("/{title_id}")]
pub async fn delete_title(
    actor: Actor,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    CatalogService::delete_title(db.get_ref(), &actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn titles_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles")
            .service(list_titles)
            .service(create_title)
            .service(get_title)
            .service(update_title)
            .service(delete_title)
    );
}
