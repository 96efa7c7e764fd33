// ============================================================================
// MODÈLE : REVIEW
// ============================================================================
//
// Colonnes de la table review:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - title_id (INTEGER, NOT NULL, FK title ON DELETE CASCADE)
//   - author_id (INTEGER, NOT NULL, FK users ON DELETE CASCADE)
//   - text (TEXT, NOT NULL)
//   - score (SMALLINT, NOT NULL) - entre 1 et 10
//   - pub_date (TIMESTAMP, DEFAULT CURRENT_TIMESTAMP)
//
// Points d'attention:
//   - UNIQUE (title_id, author_id): une seule review par auteur et par œuvre.
//     La contrainte en base ferme la fenêtre de course du check applicatif.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title_id: i32,
    pub author_id: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub score: i16,
    pub pub_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::title::Entity",
        from = "Column::TitleId",
        to = "super::title::Column::Id",
        on_delete = "Cascade"
    )]
    Title,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
