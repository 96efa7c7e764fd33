pub mod health;
pub mod auth;
pub mod categories;
pub mod genres;
pub mod titles;
pub mod reviews;
pub mod comments;
pub mod users;

use actix_web::{error, web, HttpRequest};

use crate::error::ApiError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Les scopes imbriqués sous /titles passent avant /titles: un scope
    // qui matche le préfixe ne rend pas la main aux suivants.
    cfg.service(
        web::scope("/api/v1")
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(categories::categories_routes)
            .configure(genres::genres_routes)
            .configure(comments::comments_routes)
            .configure(reviews::reviews_routes)
            .configure(titles::titles_routes)
            .configure(users::users_routes)
    );
}

/// Corps JSON illisible -> 400 au même format que les erreurs de validation.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        ApiError::field("non_field_errors", err.to_string()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        ApiError::field("non_field_errors", err.to_string()).into()
    })
}

/// Identifiant non numérique dans le chemin: la ressource n'existe pas.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req: &HttpRequest| {
        tracing::debug!(error = %err, "unmatched path parameter");
        ApiError::NotFound { field: "detail", message: "Not found.".to_string() }.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use actix_web::http::{header, StatusCode};
    use actix_web::middleware::{NormalizePath, TrailingSlash};
    use actix_web::{test, App};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use serde_json::json;

    use crate::config::AppConfig;
    use crate::models::{category, review};
    use crate::services::auth_service::AuthService;
    use crate::services::mailer::testing::RecordingMailer;

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/test".to_string()),
            "SECRET_KEY" => Some("routing-secret".to_string()),
            _ => None,
        })
        .unwrap()
    }

    macro_rules! app {
        ($db:expr) => {{
            let config = config();
            let auth = AuthService::new(&config, Arc::new(RecordingMailer::default())).unwrap();
            test::init_service(
                App::new()
                    .wrap(NormalizePath::new(TrailingSlash::Trim))
                    .app_data(web::Data::new($db))
                    .app_data(web::Data::new(auth))
                    .app_data(web::Data::new(config))
                    .configure(configure_routes),
            )
            .await
        }};
    }

    fn empty_db() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    #[actix_web::test]
    async fn test_non_numeric_id_is_not_found() {
        let app = app!(empty_db());

        let req = test::TestRequest::get().uri("/api/v1/titles/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "detail": "Not found." }));
    }

    #[actix_web::test]
    async fn test_trailing_slash_is_trimmed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("num_items", Value::from(0i64))])]])
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();
        let app = app!(db);

        let req = test::TestRequest::get().uri("/api/v1/categories/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], json!(0));
        assert_eq!(body["results"], json!([]));
    }

    #[actix_web::test]
    async fn test_malformed_json_is_a_bad_request() {
        let app = app!(empty_db());

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/signup")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload(r#"{"email": "alice@example.com", "username": "#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["non_field_errors"].is_array());
    }

    #[actix_web::test]
    async fn test_comments_route_wins_over_reviews() {
        // Une 404 du service (et non du routeur) prouve que le scope comments a répondu
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<review::Model>::new()])
            .into_connection();
        let app = app!(db);

        let req = test::TestRequest::get()
            .uri("/api/v1/titles/1/reviews/2/comments")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "detail": "Review not found." }));
    }
}
