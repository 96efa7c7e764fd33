// ============================================================================
// DTOs : requêtes (validées avec validator) et réponses JSON
// ============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::users::Role;
use crate::models::{category, genre, users};
use crate::services::pagination::PageQuery;
use crate::utils::validators::{validate_description, validate_slug, validate_username};

/// Distingue un champ absent (`None`) d'un champ à `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ----------------------------------------------------------------------------
// Catalogue
// ----------------------------------------------------------------------------

/// Création d'une catégorie ou d'un genre
#[derive(Debug, Deserialize, Validate)]
pub struct SlugEntryRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 50), custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlugEntryResponse {
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for SlugEntryResponse {
    fn from(model: category::Model) -> Self {
        Self { name: model.name, slug: model.slug }
    }
}

impl From<genre::Model> for SlugEntryResponse {
    fn from(model: genre::Model) -> Self {
        Self { name: model.name, slug: model.slug }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl SearchQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery { page: self.page, page_size: self.page_size }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl TitleFilter {
    pub fn page_query(&self) -> PageQuery {
        PageQuery { page: self.page, page_size: self.page_size }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TitleCreateRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub year: i32,
    #[validate(custom(function = "validate_description"))]
    pub description: Option<String>,
    /// Slugs des genres
    #[serde(default)]
    pub genre: Vec<String>,
    /// Slug de la catégorie
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TitlePatchRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    pub year: Option<i32>,
    /// Longueur vérifiée par le service (`validate_description`)
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub genre: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TitleResponse {
    pub id: i32,
    pub name: String,
    pub year: i32,
    /// Moyenne des scores, null sans review
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<SlugEntryResponse>,
    pub category: Option<SlugEntryResponse>,
}

// ----------------------------------------------------------------------------
// Reviews & commentaires
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewCreateRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: i16,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReviewPatchRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: Option<i16>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReviewResponse {
    pub id: i32,
    pub text: String,
    /// username de l'auteur
    pub author: String,
    pub score: i16,
    pub pub_date: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentPatchRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub pub_date: NaiveDateTime,
}

// ----------------------------------------------------------------------------
// Auth
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ----------------------------------------------------------------------------
// Utilisateurs
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct UserCreateRequest {
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: String,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct UserPatchRequest {
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: Option<String>,
    #[validate(email(message = "Enter a valid email address."), length(max = 254))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Valeur brute: n'est interprétée que si l'appelant peut changer le rôle.
    pub role: Option<serde_json::Value>,
}

impl UserPatchRequest {
    /// Même patch, sans le champ role (ignoré, pas refusé).
    pub fn without_role(self) -> Self {
        Self { role: None, ..self }
    }

    /// Rôle demandé, `Err` avec le message de champ si la valeur est inconnue.
    pub fn requested_role(&self) -> Result<Option<Role>, String> {
        match &self.role {
            None => Ok(None),
            Some(raw) => serde_json::from_value(raw.clone())
                .map(Some)
                .map_err(|_| format!("{} is not a valid choice.", raw)),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_rejects_me() {
        let req = SignupRequest { email: "me@example.com".into(), username: "me".into() };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let req = SignupRequest { email: "not-an-email".into(), username: "bob".into() };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_review_score_range() {
        for (score, ok) in [(0, false), (1, true), (10, true), (11, false)] {
            let req = ReviewCreateRequest { text: "ok".into(), score };
            assert_eq!(req.validate().is_ok(), ok, "score {}", score);
        }
    }

    #[test]
    fn test_title_patch_distinguishes_null_from_absent() {
        let patch: TitlePatchRequest = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(patch.category, Some(None));
        assert_eq!(patch.description, None);

        let patch: TitlePatchRequest = serde_json::from_str(r#"{"category": "movie"}"#).unwrap();
        assert_eq!(patch.category, Some(Some("movie".to_string())));
    }

    #[test]
    fn test_user_patch_without_role() {
        let patch: UserPatchRequest =
            serde_json::from_str(r#"{"bio": "hi", "role": "admin"}"#).unwrap();
        assert_eq!(patch.requested_role(), Ok(Some(Role::Admin)));

        let patch = patch.without_role();
        assert_eq!(patch.role, None);
        assert_eq!(patch.requested_role(), Ok(None));
        assert_eq!(patch.bio.as_deref(), Some("hi"));
    }

    #[test]
    fn test_unknown_role_parses_but_does_not_resolve() {
        // Le corps reste lisible: le rôle inconnu n'est refusé qu'à la résolution
        let patch: UserPatchRequest =
            serde_json::from_str(r#"{"bio": "Cinephile", "role": "superuser"}"#).unwrap();
        assert_eq!(patch.bio.as_deref(), Some("Cinephile"));
        assert_eq!(
            patch.requested_role(),
            Err(r#""superuser" is not a valid choice."#.to_string())
        );
    }
}
