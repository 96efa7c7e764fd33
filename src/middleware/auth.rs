use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;

use crate::error::ApiError;
use crate::services::auth_service::AuthService;
use crate::services::policy::Actor;

/// Extracteur de l'acteur courant.
///
/// Pas de header Authorization -> `Actor::Anonymous`; chaque handler décide
/// ensuite via la policy si l'anonyme est accepté. Le compte est relu en base
/// à chaque requête: le rôle vient du store, pas du token.
impl FromRequest for Actor {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();
        let auth = req.app_data::<web::Data<AuthService>>().cloned();

        let authorization = match req.headers().get(header::AUTHORIZATION) {
            None => Ok(None),
            Some(value) => value.to_str().map(|s| Some(s.to_string())).map_err(|_| {
                ApiError::Unauthenticated("Invalid Authorization header.".to_string())
            }),
        };

        Box::pin(async move {
            let (Some(db), Some(auth)) = (db, auth) else {
                return Err(ApiError::Internal("authentication is not configured".to_string()));
            };
            let authorization = authorization?;
            auth.authenticate(db.get_ref(), authorization.as_deref()).await
        })
    }
}
