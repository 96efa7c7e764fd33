// ============================================================================
// SERVICE : FEEDBACK (reviews et commentaires)
// ============================================================================
//
// Workflow d'une mutation (update/delete):
//   1. acteur authentifié sinon 401
//   2. objet introuvable (ou hors de l'œuvre / review du chemin) -> 404
//   3. ni auteur, ni moderator, ni admin -> 403
//   4. validation du corps -> 400
//
// Points d'attention:
//   - Une seule review par (title, auteur): check + insert dans la même
//     transaction, et la contrainte UNIQUE en base tranche les courses.
//   - Supprimer une review supprime ses commentaires.
//
// ============================================================================

use chrono::Utc;
use sea_orm::*;
use validator::Validate;

use crate::error::{is_unique_violation, ApiError};
use crate::models::dto::{
    CommentPatchRequest, CommentRequest, CommentResponse, ReviewCreateRequest, ReviewPatchRequest, ReviewResponse,
};
use crate::models::{comment, review, title, users};
use crate::services::pagination::{self, Page, PageQuery};
use crate::services::policy::{self, Action, Actor, Resource};

pub struct FeedbackService;

const DUPLICATE_REVIEW: &str = "You have already left a review for this title.";

fn duplicate_review() -> ApiError {
    ApiError::field("non_field_errors", DUPLICATE_REVIEW)
}

fn author_name(author: Option<users::Model>) -> String {
    author.map(|u| u.username).unwrap_or_default()
}

fn review_response((model, author): (review::Model, Option<users::Model>)) -> ReviewResponse {
    ReviewResponse {
        id: model.id,
        text: model.text,
        author: author_name(author),
        score: model.score,
        pub_date: model.pub_date,
    }
}

fn comment_response((model, author): (comment::Model, Option<users::Model>)) -> CommentResponse {
    CommentResponse {
        id: model.id,
        text: model.text,
        author: author_name(author),
        pub_date: model.pub_date,
    }
}

impl FeedbackService {
    // ------------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------------

    pub async fn list_reviews(
        db: &DatabaseConnection,
        title_id: i32,
        query: PageQuery,
        default_page_size: u64,
    ) -> Result<Page<ReviewResponse>, ApiError> {
        let (page, size) = query.resolve(default_page_size)?;
        Self::ensure_title(db, title_id).await?;

        let select = review::Entity::find()
            .filter(review::Column::TitleId.eq(title_id))
            .order_by_asc(review::Column::Id)
            .find_also_related(users::Entity);

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        Ok(page.map(review_response))
    }

    pub async fn get_review(
        db: &DatabaseConnection,
        title_id: i32,
        review_id: i32,
    ) -> Result<ReviewResponse, ApiError> {
        Self::find_review(db, title_id, review_id).await.map(review_response)
    }

    pub async fn create_review(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        request: ReviewCreateRequest,
    ) -> Result<ReviewResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::Feedback { author_id: None })?;
        let principal = actor.require_principal()?;
        request.validate()?;

        let txn = db.begin().await?;

        title::Entity::find_by_id(title_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("Title"))?;

        let existing = review::Entity::find()
            .filter(review::Column::TitleId.eq(title_id))
            .filter(review::Column::AuthorId.eq(principal.user_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(duplicate_review());
        }

        let created = review::ActiveModel {
            title_id: Set(title_id),
            author_id: Set(principal.user_id),
            text: Set(request.text),
            score: Set(request.score),
            pub_date: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| if is_unique_violation(&e) { duplicate_review() } else { e.into() })?;

        txn.commit().await?;

        tracing::info!(review_id = created.id, title_id, author = %principal.username, "review created");
        Ok(ReviewResponse {
            id: created.id,
            text: created.text,
            author: principal.username.clone(),
            score: created.score,
            pub_date: created.pub_date,
        })
    }

    pub async fn update_review(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        patch: ReviewPatchRequest,
    ) -> Result<ReviewResponse, ApiError> {
        actor.require_principal()?;
        let (existing, author) = Self::find_review(db, title_id, review_id).await?;
        policy::ensure(
            actor,
            Action::Update,
            Resource::Feedback { author_id: Some(existing.author_id) },
        )?;
        patch.validate()?;

        let mut active: review::ActiveModel = existing.into();
        if let Some(text) = patch.text {
            active.text = Set(text);
        }
        if let Some(score) = patch.score {
            active.score = Set(score);
        }
        let updated = if active.is_changed() {
            active.update(db).await?
        } else {
            active.try_into_model()?
        };

        tracing::info!(review_id, "review updated");
        Ok(review_response((updated, author)))
    }

    pub async fn delete_review(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
    ) -> Result<(), ApiError> {
        actor.require_principal()?;
        let (existing, _) = Self::find_review(db, title_id, review_id).await?;
        policy::ensure(
            actor,
            Action::Delete,
            Resource::Feedback { author_id: Some(existing.author_id) },
        )?;

        let txn = db.begin().await?;
        comment::Entity::delete_many()
            .filter(comment::Column::ReviewId.eq(review_id))
            .exec(&txn)
            .await?;
        review::Entity::delete_by_id(review_id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(review_id, "review deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Commentaires
    // ------------------------------------------------------------------------

    pub async fn list_comments(
        db: &DatabaseConnection,
        title_id: i32,
        review_id: i32,
        query: PageQuery,
        default_page_size: u64,
    ) -> Result<Page<CommentResponse>, ApiError> {
        let (page, size) = query.resolve(default_page_size)?;
        Self::ensure_review(db, title_id, review_id).await?;

        let select = comment::Entity::find()
            .filter(comment::Column::ReviewId.eq(review_id))
            .order_by_asc(comment::Column::Id)
            .find_also_related(users::Entity);

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        Ok(page.map(comment_response))
    }

    pub async fn get_comment(
        db: &DatabaseConnection,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
    ) -> Result<CommentResponse, ApiError> {
        Self::ensure_review(db, title_id, review_id).await?;
        Self::find_comment(db, review_id, comment_id).await.map(comment_response)
    }

    pub async fn create_comment(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        request: CommentRequest,
    ) -> Result<CommentResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::Feedback { author_id: None })?;
        let principal = actor.require_principal()?;
        request.validate()?;
        Self::ensure_review(db, title_id, review_id).await?;

        let created = comment::ActiveModel {
            review_id: Set(review_id),
            author_id: Set(principal.user_id),
            text: Set(request.text),
            pub_date: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!(comment_id = created.id, review_id, author = %principal.username, "comment created");
        Ok(CommentResponse {
            id: created.id,
            text: created.text,
            author: principal.username.clone(),
            pub_date: created.pub_date,
        })
    }

    pub async fn update_comment(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
        patch: CommentPatchRequest,
    ) -> Result<CommentResponse, ApiError> {
        actor.require_principal()?;
        Self::ensure_review(db, title_id, review_id).await?;
        let (existing, author) = Self::find_comment(db, review_id, comment_id).await?;
        policy::ensure(
            actor,
            Action::Update,
            Resource::Feedback { author_id: Some(existing.author_id) },
        )?;
        patch.validate()?;

        // Corps vide: rien à écrire
        let Some(text) = patch.text else {
            return Ok(comment_response((existing, author)));
        };

        let mut active: comment::ActiveModel = existing.into();
        active.text = Set(text);
        let updated = active.update(db).await?;

        tracing::info!(comment_id, "comment updated");
        Ok(comment_response((updated, author)))
    }

    pub async fn delete_comment(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
    ) -> Result<(), ApiError> {
        actor.require_principal()?;
        Self::ensure_review(db, title_id, review_id).await?;
        let (existing, _) = Self::find_comment(db, review_id, comment_id).await?;
        policy::ensure(
            actor,
            Action::Delete,
            Resource::Feedback { author_id: Some(existing.author_id) },
        )?;

        comment::Entity::delete_by_id(comment_id).exec(db).await?;

        tracing::info!(comment_id, "comment deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    async fn ensure_title(db: &DatabaseConnection, title_id: i32) -> Result<(), ApiError> {
        title::Entity::find_by_id(title_id)
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("Title"))
    }

    async fn ensure_review(db: &DatabaseConnection, title_id: i32, review_id: i32) -> Result<(), ApiError> {
        review::Entity::find_by_id(review_id)
            .filter(review::Column::TitleId.eq(title_id))
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("Review"))
    }

    async fn find_review(
        db: &DatabaseConnection,
        title_id: i32,
        review_id: i32,
    ) -> Result<(review::Model, Option<users::Model>), ApiError> {
        review::Entity::find_by_id(review_id)
            .filter(review::Column::TitleId.eq(title_id))
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Review"))
    }

    async fn find_comment(
        db: &DatabaseConnection,
        review_id: i32,
        comment_id: i32,
    ) -> Result<(comment::Model, Option<users::Model>), ApiError> {
        comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::ReviewId.eq(review_id))
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Comment"))
    }
}
