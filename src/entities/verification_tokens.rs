use sea_orm::entity::prelude::*;

use crate::domain::TokenPurpose;

/// Single-use, time-boxed tokens for email verification and password reset.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "verification_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub account_id: i32,

    /// Address the token was mailed to.
    pub email: String,

    pub purpose: TokenPurpose,

    /// Opaque token value (hex).
    #[sea_orm(unique)]
    pub token: String,

    pub created_at: String,

    /// Unix timestamp (seconds).
    pub expires_at: i64,

    pub used: bool,

    pub used_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
