use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub account_id: i32,

    pub first_name: String,

    pub last_name: String,

    #[sea_orm(column_type = "Text")]
    pub bio: String,

    /// File name under the uploads directory.
    pub profile_image: Option<String>,

    pub phone_number: String,

    /// ISO-8601 calendar date
    pub date_of_birth: Option<String>,

    pub school_organization: String,

    pub grade_level: String,

    pub expertise_area: String,

    pub years_experience: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
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
