// ============================================================================
// SERVICE : CATALOGUE (categories, genres, titles)
// ============================================================================
//
// Lecture publique, écriture réservée à admin/staff (cf. policy).
// La note d'une œuvre est calculée à la lecture (AVG des scores), jamais stockée.
//
// ============================================================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, Query, SimpleExpr};
use sea_orm::*;
use std::collections::{HashMap, HashSet};
use validator::Validate;

use crate::error::{is_unique_violation, ApiError, FieldErrors};
use crate::models::dto::{
    SearchQuery, SlugEntryRequest, SlugEntryResponse, TitleCreateRequest, TitleFilter,
    TitlePatchRequest, TitleResponse,
};
use crate::models::{category, comment, genre, genre_title, review, title};
use crate::services::pagination::{self, Page};
use crate::services::policy::{self, Action, Actor, Resource};
use crate::utils::validators::{validate_description, validate_year};

pub struct CatalogService;

#[derive(Debug, FromQueryResult)]
struct RatingRow {
    title_id: i32,
    rating: Option<Decimal>,
}

/// `%` et `_` saisis par l'utilisateur sont pris littéralement.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn name_contains(column: impl IntoColumnRef, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(like_pattern(needle))
}

fn slug_taken(kind: &str) -> ApiError {
    ApiError::field("slug", format!("{} with this slug already exists.", kind))
}

fn unknown_slug(field: &str, slug: &str) -> ApiError {
    ApiError::field(field, format!("Object with slug={} does not exist.", slug))
}

impl CatalogService {
    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    pub async fn list_categories(
        db: &DatabaseConnection,
        query: &SearchQuery,
        default_page_size: u64,
    ) -> Result<Page<SlugEntryResponse>, ApiError> {
        let (page, size) = query.page_query().resolve(default_page_size)?;

        let mut select = category::Entity::find().order_by_asc(category::Column::Name);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(name_contains(category::Column::Name, search));
        }

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        Ok(page.map(SlugEntryResponse::from))
    }

    pub async fn create_category(
        db: &DatabaseConnection,
        actor: &Actor,
        request: SlugEntryRequest,
    ) -> Result<SlugEntryResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::Catalog)?;
        request.validate()?;

        let existing = category::Entity::find()
            .filter(category::Column::Slug.eq(&request.slug))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(slug_taken("category"));
        }

        let created = category::ActiveModel {
            name: Set(request.name),
            slug: Set(request.slug),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| if is_unique_violation(&e) { slug_taken("category") } else { e.into() })?;

        tracing::info!(slug = %created.slug, "category created");
        Ok(created.into())
    }

    /// Les œuvres de la catégorie passent à category = NULL.
    pub async fn delete_category(
        db: &DatabaseConnection,
        actor: &Actor,
        slug: &str,
    ) -> Result<(), ApiError> {
        policy::ensure(actor, Action::Delete, Resource::Catalog)?;

        let found = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Category"))?;

        let txn = db.begin().await?;
        title::Entity::update_many()
            .col_expr(title::Column::CategoryId, Expr::value(Option::<i32>::None))
            .filter(title::Column::CategoryId.eq(found.id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(found.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(slug, "category deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Genres
    // ------------------------------------------------------------------------

    pub async fn list_genres(
        db: &DatabaseConnection,
        query: &SearchQuery,
        default_page_size: u64,
    ) -> Result<Page<SlugEntryResponse>, ApiError> {
        let (page, size) = query.page_query().resolve(default_page_size)?;

        let mut select = genre::Entity::find().order_by_asc(genre::Column::Name);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(name_contains(genre::Column::Name, search));
        }

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        Ok(page.map(SlugEntryResponse::from))
    }

    pub async fn create_genre(
        db: &DatabaseConnection,
        actor: &Actor,
        request: SlugEntryRequest,
    ) -> Result<SlugEntryResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::Catalog)?;
        request.validate()?;

        let existing = genre::Entity::find()
            .filter(genre::Column::Slug.eq(&request.slug))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(slug_taken("genre"));
        }

        let created = genre::ActiveModel {
            name: Set(request.name),
            slug: Set(request.slug),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| if is_unique_violation(&e) { slug_taken("genre") } else { e.into() })?;

        tracing::info!(slug = %created.slug, "genre created");
        Ok(created.into())
    }

    /// Seules les associations genre_title du genre disparaissent.
    pub async fn delete_genre(
        db: &DatabaseConnection,
        actor: &Actor,
        slug: &str,
    ) -> Result<(), ApiError> {
        policy::ensure(actor, Action::Delete, Resource::Catalog)?;

        let found = genre::Entity::find()
            .filter(genre::Column::Slug.eq(slug))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Genre"))?;

        let txn = db.begin().await?;
        genre_title::Entity::delete_many()
            .filter(genre_title::Column::GenreId.eq(found.id))
            .exec(&txn)
            .await?;
        genre::Entity::delete_by_id(found.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(slug, "genre deleted");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------------

    pub async fn list_titles(
        db: &DatabaseConnection,
        filter: &TitleFilter,
        default_page_size: u64,
    ) -> Result<Page<TitleResponse>, ApiError> {
        let (page, size) = filter.page_query().resolve(default_page_size)?;

        let mut select = title::Entity::find().order_by_asc(title::Column::Id);

        if let Some(slug) = filter.category.as_deref() {
            select = select
                .join(JoinType::InnerJoin, title::Relation::Category.def())
                .filter(category::Column::Slug.eq(slug));
        }
        if let Some(slug) = filter.genre.as_deref() {
            let with_genre = Query::select()
                .column((genre_title::Entity, genre_title::Column::TitleId))
                .from(genre_title::Entity)
                .inner_join(
                    genre::Entity,
                    Expr::col((genre::Entity, genre::Column::Id))
                        .equals((genre_title::Entity, genre_title::Column::GenreId)),
                )
                .and_where(Expr::col((genre::Entity, genre::Column::Slug)).eq(slug))
                .to_owned();
            select = select.filter(title::Column::Id.in_subquery(with_genre));
        }
        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(name_contains((title::Entity, title::Column::Name), name));
        }
        if let Some(year) = filter.year {
            select = select.filter(title::Column::Year.eq(year));
        }

        let page = pagination::fetch_page(select.paginate(db, size), page).await?;
        let Page { count, page, num_pages, results } = page;
        let results = Self::to_responses(db, results).await?;

        Ok(Page { count, page, num_pages, results })
    }

    pub async fn get_title(db: &DatabaseConnection, title_id: i32) -> Result<TitleResponse, ApiError> {
        let found = Self::find_title(db, title_id).await?;
        Self::single_response(db, found).await
    }

    pub async fn create_title(
        db: &DatabaseConnection,
        actor: &Actor,
        request: TitleCreateRequest,
    ) -> Result<TitleResponse, ApiError> {
        policy::ensure(actor, Action::Create, Resource::Catalog)?;

        let mut errors = FieldErrors::new();
        if let Err(e) = request.validate() {
            errors.merge(e.into());
        }
        if let Err(e) = validate_year(request.year) {
            errors.add("year", e.message.map(|m| m.to_string()).unwrap_or_default());
        }
        errors.into_result()?;

        let category_id = match request.category.as_deref() {
            Some(slug) => Some(Self::resolve_category(db, slug).await?.id),
            None => None,
        };
        let genres = Self::resolve_genres(db, &request.genre).await?;

        let txn = db.begin().await?;
        let created = title::ActiveModel {
            name: Set(request.name),
            year: Set(request.year),
            description: Set(request.description),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        Self::link_genres(&txn, created.id, &genres).await?;
        txn.commit().await?;

        tracing::info!(title_id = created.id, name = %created.name, "title created");
        Self::single_response(db, created).await
    }

    pub async fn update_title(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
        patch: TitlePatchRequest,
    ) -> Result<TitleResponse, ApiError> {
        policy::ensure(actor, Action::Update, Resource::Catalog)?;
        let existing = Self::find_title(db, title_id).await?;

        let mut errors = FieldErrors::new();
        if let Err(e) = patch.validate() {
            errors.merge(e.into());
        }
        if let Some(Err(e)) = patch.year.map(validate_year) {
            errors.add("year", e.message.map(|m| m.to_string()).unwrap_or_default());
        }
        if let Some(Some(Err(e))) = patch.description.as_ref().map(|d| d.as_deref().map(validate_description)) {
            errors.add("description", e.message.map(|m| m.to_string()).unwrap_or_default());
        }
        errors.into_result()?;

        let category_id = match patch.category {
            Some(Some(ref slug)) => Some(Some(Self::resolve_category(db, slug).await?.id)),
            Some(None) => Some(None),
            None => None,
        };
        let genres = match patch.genre {
            Some(ref slugs) => Some(Self::resolve_genres(db, slugs).await?),
            None => None,
        };

        let txn = db.begin().await?;
        let mut active: title::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(year) = patch.year {
            active.year = Set(year);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(category_id);
        }
        let updated = if active.is_changed() {
            active.update(&txn).await?
        } else {
            active.try_into_model()?
        };

        if let Some(genres) = genres {
            genre_title::Entity::delete_many()
                .filter(genre_title::Column::TitleId.eq(updated.id))
                .exec(&txn)
                .await?;
            Self::link_genres(&txn, updated.id, &genres).await?;
        }
        txn.commit().await?;

        tracing::info!(title_id, "title updated");
        Self::single_response(db, updated).await
    }

    /// Supprime l'œuvre avec ses reviews, leurs commentaires et ses associations.
    pub async fn delete_title(
        db: &DatabaseConnection,
        actor: &Actor,
        title_id: i32,
    ) -> Result<(), ApiError> {
        policy::ensure(actor, Action::Delete, Resource::Catalog)?;
        Self::find_title(db, title_id).await?;

        let reviews_of_title = Query::select()
            .column(review::Column::Id)
            .from(review::Entity)
            .and_where(review::Column::TitleId.eq(title_id))
            .to_owned();

        let txn = db.begin().await?;
        comment::Entity::delete_many()
            .filter(comment::Column::ReviewId.in_subquery(reviews_of_title))
            .exec(&txn)
            .await?;
        review::Entity::delete_many()
            .filter(review::Column::TitleId.eq(title_id))
            .exec(&txn)
            .await?;
        genre_title::Entity::delete_many()
            .filter(genre_title::Column::TitleId.eq(title_id))
            .exec(&txn)
            .await?;
        title::Entity::delete_by_id(title_id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(title_id, "title deleted with its reviews and comments");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    pub async fn find_title(db: &DatabaseConnection, title_id: i32) -> Result<title::Model, ApiError> {
        title::Entity::find_by_id(title_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("Title"))
    }

    async fn resolve_category(db: &DatabaseConnection, slug: &str) -> Result<category::Model, ApiError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(db)
            .await?
            .ok_or_else(|| unknown_slug("category", slug))
    }

    async fn resolve_genres(db: &DatabaseConnection, slugs: &[String]) -> Result<Vec<genre::Model>, ApiError> {
        let wanted: HashSet<&str> = slugs.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let found = genre::Entity::find()
            .filter(genre::Column::Slug.is_in(wanted.iter().copied()))
            .all(db)
            .await?;

        let known: HashSet<&str> = found.iter().map(|g| g.slug.as_str()).collect();
        if let Some(missing) = slugs.iter().find(|s| !known.contains(s.as_str())) {
            return Err(unknown_slug("genre", missing));
        }
        Ok(found)
    }

    async fn link_genres<C: ConnectionTrait>(
        conn: &C,
        title_id: i32,
        genres: &[genre::Model],
    ) -> Result<(), DbErr> {
        if genres.is_empty() {
            return Ok(());
        }
        let rows = genres.iter().map(|g| genre_title::ActiveModel {
            title_id: Set(title_id),
            genre_id: Set(g.id),
        });
        genre_title::Entity::insert_many(rows)
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Moyenne des scores par œuvre; les œuvres sans review sont absentes.
    pub async fn ratings_for(
        db: &DatabaseConnection,
        title_ids: &[i32],
    ) -> Result<HashMap<i32, f64>, DbErr> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = review::Entity::find()
            .select_only()
            .column(review::Column::TitleId)
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col((review::Entity, review::Column::Score)))),
                "rating",
            )
            .filter(review::Column::TitleId.is_in(title_ids.iter().copied()))
            .group_by(review::Column::TitleId)
            .into_model::<RatingRow>()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| Some((row.title_id, row.rating?.to_f64()?)))
            .collect())
    }

    async fn single_response(db: &DatabaseConnection, model: title::Model) -> Result<TitleResponse, ApiError> {
        Self::to_responses(db, vec![model])
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal("title vanished while building response".to_string()))
    }

    async fn to_responses(
        db: &DatabaseConnection,
        titles: Vec<title::Model>,
    ) -> Result<Vec<TitleResponse>, ApiError> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let categories = titles.load_one(category::Entity, db).await?;
        let genres = titles
            .load_many_to_many(genre::Entity, genre_title::Entity, db)
            .await?;
        let ids: Vec<i32> = titles.iter().map(|t| t.id).collect();
        let ratings = Self::ratings_for(db, &ids).await?;

        Ok(titles
            .into_iter()
            .zip(categories)
            .zip(genres)
            .map(|((t, category), genres)| assemble_title(t, category, genres, &ratings))
            .collect())
    }
}

fn assemble_title(
    model: title::Model,
    category: Option<category::Model>,
    mut genres: Vec<genre::Model>,
    ratings: &HashMap<i32, f64>,
) -> TitleResponse {
    genres.sort_by(|a, b| a.name.cmp(&b.name));
    TitleResponse {
        id: model.id,
        rating: ratings.get(&model.id).copied(),
        name: model.name,
        year: model.year,
        description: model.description,
        genre: genres.into_iter().map(SlugEntryResponse::from).collect(),
        category: category.map(SlugEntryResponse::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::Role;
    use crate::services::policy::Principal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn actor(role: Role) -> Actor {
        Actor::Authenticated(Principal {
            user_id: 1,
            username: "someone".into(),
            role,
            is_staff: false,
        })
    }

    fn title_model(id: i32) -> title::Model {
        title::Model {
            id,
            name: "Solaris".into(),
            year: 1972,
            description: None,
            category_id: None,
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult { last_insert_id: 0, rows_affected: 1 }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Star"), "%star%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }

    #[test]
    fn test_assemble_title_rating_and_nesting() {
        let mut ratings = HashMap::new();
        ratings.insert(1, 9.0);

        let genres = vec![
            genre::Model { id: 2, name: "Drama".into(), slug: "drama".into() },
            genre::Model { id: 1, name: "Classic".into(), slug: "classic".into() },
        ];
        let category = category::Model { id: 5, name: "Movie".into(), slug: "movie".into() };

        let response = assemble_title(title_model(1), Some(category), genres, &ratings);
        assert_eq!(response.rating, Some(9.0));
        assert_eq!(response.category.unwrap().slug, "movie");
        assert_eq!(response.genre[0].slug, "classic");

        let response = assemble_title(title_model(2), None, vec![], &ratings);
        assert_eq!(response.rating, None);
        assert!(response.category.is_none());
    }

    #[tokio::test]
    async fn test_ratings_are_means_of_scores() {
        // AVG(8, 10) = 9.0
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([
                ("title_id", Value::from(1i32)),
                ("rating", Value::from(Decimal::new(90, 1))),
            ])]])
            .into_connection();

        let ratings = CatalogService::ratings_for(&db, &[1, 2]).await.unwrap();
        assert_eq!(ratings.get(&1), Some(&9.0));
        assert_eq!(ratings.get(&2), None);
    }

    #[tokio::test]
    async fn test_ratings_without_titles_skip_the_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(CatalogService::ratings_for(&db, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_write_catalog() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let request = || SlugEntryRequest { name: "Movie".into(), slug: "movie".into() };

        for role in [Role::User, Role::Moderator] {
            let err = CatalogService::create_category(&db, &actor(role), request()).await.unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));

            let err = CatalogService::delete_genre(&db, &actor(role), "drama").await.unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));

            let err = CatalogService::delete_title(&db, &actor(role), 1).await.unwrap_err();
            assert!(matches!(err, ApiError::Forbidden(_)));
        }

        let err = CatalogService::create_genre(&db, &Actor::Anonymous, request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_duplicate_category_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![category::Model {
                id: 1,
                name: "Movie".into(),
                slug: "movie".into(),
            }]])
            .into_connection();

        let err = CatalogService::create_category(
            &db,
            &actor(Role::Admin),
            SlugEntryRequest { name: "Films".into(), slug: "movie".into() },
        )
        .await
        .unwrap_err();

        match err {
            ApiError::Validation(fields) => assert!(fields.get("slug").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_title_rejects_future_year() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let request = TitleCreateRequest {
            name: "Tomorrow".into(),
            year: 9999,
            description: None,
            genre: vec![],
            category: None,
        };

        let err = CatalogService::create_title(&db, &actor(Role::Admin), request).await.unwrap_err();
        match err {
            ApiError::Validation(fields) => assert!(fields.get("year").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_title_cascades_in_one_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![title_model(3)]])
            .append_exec_results([exec_ok(), exec_ok(), exec_ok(), exec_ok()])
            .into_connection();

        CatalogService::delete_title(&db, &actor(Role::Admin), 3).await.unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        let comment_pos = log.find(r#"DELETE FROM \"comment\""#).unwrap();
        let review_pos = log.find(r#"DELETE FROM \"review\""#).unwrap();
        let link_pos = log.find(r#"DELETE FROM \"genre_title\""#).unwrap();
        let title_pos = log.find(r#"DELETE FROM \"title\""#).unwrap();
        assert!(comment_pos < review_pos && review_pos < link_pos && link_pos < title_pos);
    }

    #[tokio::test]
    async fn test_delete_missing_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<title::Model>::new()])
            .into_connection();

        let err = CatalogService::delete_title(&db, &actor(Role::Admin), 42).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_category_detaches_titles() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![category::Model { id: 5, name: "Movie".into(), slug: "movie".into() }]])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();

        CatalogService::delete_category(&db, &actor(Role::Admin), "movie").await.unwrap();

        // Les titres restent, leur catégorie passe à NULL avant la suppression
        let log = format!("{:?}", db.into_transaction_log());
        let detach_pos = log.find(r#"UPDATE \"title\" SET \"category_id\""#).unwrap();
        let delete_pos = log.find(r#"DELETE FROM \"category\""#).unwrap();
        assert!(detach_pos < delete_pos);
        assert!(!log.contains(r#"DELETE FROM \"title\""#));
    }

    #[tokio::test]
    async fn test_delete_genre_only_unlinks_titles() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![genre::Model { id: 2, name: "Drama".into(), slug: "drama".into() }]])
            .append_exec_results([exec_ok(), exec_ok()])
            .into_connection();

        CatalogService::delete_genre(&db, &actor(Role::Admin), "drama").await.unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        let unlink_pos = log.find(r#"DELETE FROM \"genre_title\""#).unwrap();
        let delete_pos = log.find(r#"DELETE FROM \"genre\" "#).unwrap();
        assert!(unlink_pos < delete_pos);
        assert!(!log.contains(r#"DELETE FROM \"title\""#));
        assert!(!log.contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_list_titles_applies_every_filter() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("num_items", Value::from(0i64))])]])
            .append_query_results([Vec::<title::Model>::new()])
            .into_connection();

        let filter = TitleFilter {
            category: Some("movie".into()),
            genre: Some("drama".into()),
            name: Some("Sol".into()),
            year: Some(1972),
            ..Default::default()
        };
        let page = CatalogService::list_titles(&db, &filter, 10).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"INNER JOIN \"category\""#));
        assert!(log.contains(r#"\"category\".\"slug\" ="#));
        assert!(log.contains("IN (SELECT"));
        assert!(log.contains(r#"\"genre\".\"slug\" ="#));
        assert!(log.contains(r#"LOWER(\"title\".\"name\") LIKE"#));
        assert!(log.contains(r#"\"title\".\"year\" ="#));
        assert!(log.contains(r#""%sol%""#));
    }

    #[tokio::test]
    async fn test_title_description_is_capped() {
        let long = "x".repeat(256);

        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let request = TitleCreateRequest {
            name: "Solaris".into(),
            year: 1972,
            description: Some(long.clone()),
            genre: vec![],
            category: None,
        };
        let err = CatalogService::create_title(&db, &actor(Role::Admin), request).await.unwrap_err();
        match err {
            ApiError::Validation(fields) => assert!(fields.get("description").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![title_model(1)]])
            .into_connection();
        let patch = TitlePatchRequest { description: Some(Some(long)), ..Default::default() };
        let err = CatalogService::update_title(&db, &actor(Role::Admin), 1, patch).await.unwrap_err();
        match err {
            ApiError::Validation(fields) => assert!(fields.get("description").is_some()),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
