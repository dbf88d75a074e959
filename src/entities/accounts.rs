use sea_orm::entity::prelude::*;

use crate::domain::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Lowercased address; uniqueness is enforced by the index, not by callers.
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub role: Role,

    pub verified: bool,

    /// Always true for non-judge roles.
    pub approved: bool,

    pub active: bool,

    pub last_login_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::profiles::Entity")]
    Profile,

    #[sea_orm(has_many = "super::verification_tokens::Entity")]
    VerificationTokens,

    #[sea_orm(has_one = "super::account_deactivations::Entity")]
    Deactivation,
}

impl Related<super::profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::verification_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VerificationTokens.def()
    }
}

impl Related<super::account_deactivations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deactivation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
