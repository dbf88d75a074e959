use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::domain::ReactivationStatus;

/// Appeal to restore a closed account. Keyed by the submitted email because
/// the original account row is usually gone.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "reactivation_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub email: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub requested_at: String,

    pub status: ReactivationStatus,

    pub reviewed_at: Option<String>,

    /// Reviewing admin; cleared if that admin account is deleted.
    pub reviewed_by: Option<i32>,

    #[sea_orm(column_type = "Text")]
    pub admin_notes: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ReviewedBy",
        to = "super::accounts::Column::Id",
        on_delete = "SetNull"
    )]
    Reviewer,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviewer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
