// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Colonnes de la table users:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - username (VARCHAR(150), UNIQUE, NOT NULL) - jamais "me"
//   - email (VARCHAR(254), UNIQUE, NOT NULL)
//   - role (TEXT, NOT NULL, DEFAULT 'user') - user | moderator | admin
//   - is_staff (BOOLEAN, DEFAULT FALSE) - droits équivalents à admin
//   - first_name, last_name (VARCHAR(150), NULL)
//   - bio (TEXT, NULL)
//   - confirmation_code (VARCHAR(255), NOT NULL) - régénéré à chaque signup
//
// Points d'attention:
//   - Le code de confirmation n'est jamais sérialisé
//   - ON DELETE CASCADE vers review et comment
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rôle d'un compte. Les comparaisons se font toujours par `match` exhaustif.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    pub role: Role,

    pub is_staff: bool,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[serde(skip_serializing)]
    pub confirmation_code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Review,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
