use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::dto::{SearchQuery, SlugEntryRequest};
use crate::services::catalog_service::CatalogService;
use crate::services::policy::Actor;

/// GET /categories?search= (PUBLIC)
#[get("")]
pub async fn list_categories(
    query: web::Query<SearchQuery>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let page = CatalogService::list_categories(db.get_ref(), &query, config.page_size).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// POST /categories (ADMIN)
#[post("")]
pub async fn create_category(
    actor: Actor,
    body: web::Json<SlugEntryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let created = CatalogService::create_category(db.get_ref(), &actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// DELETE /categories/{slug} (ADMIN)
#[delete("/{slug}")]
pub async fn delete_category(
    actor: Actor,
    slug: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    CatalogService::delete_category(db.get_ref(), &actor, &slug).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn categories_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(list_categories)
            .service(create_category)
            .service(delete_category)
    );
}
