// ============================================================================
// MODÈLE : TITLE (œuvre)
// ============================================================================
//
// Colonnes de la table title:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - name (VARCHAR(256), NOT NULL, INDEX)
//   - year (INTEGER, NOT NULL) - jamais supérieure à l'année courante
//   - description (TEXT, NULL)
//   - category_id (INTEGER, NULL, FK category ON DELETE SET NULL)
//
// Points d'attention:
//   - Les genres passent par genre_title
//   - La note (rating) n'est JAMAIS stockée: AVG(review.score) à la lecture
//
// ============================================================================

use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "title")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub year: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,

    #[sea_orm(has_many = "super::review::Entity")]
    Review,

    #[sea_orm(has_many = "super::genre_title::Entity")]
    GenreTitle,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::genre_title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenreTitle.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_title::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::genre_title::Relation::Title.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
