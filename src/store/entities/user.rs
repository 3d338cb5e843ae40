use sea_orm::entity::prelude::*;

/// A GitHub account that has signed in.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub github_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub access_token: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::judgment::Entity")]
    Judgment,
}

impl Related<super::judgment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Judgment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
