use serde::{Deserialize, Serialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "genre")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::genre_title::Entity")]
    GenreTitle,
}

impl Related<super::genre_title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GenreTitle.def()
    }
}

// Many-to-many via la table d'association genre_title
impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        super::genre_title::Relation::Title.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::genre_title::Relation::Genre.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
