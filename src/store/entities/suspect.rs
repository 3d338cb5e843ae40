use sea_orm::entity::prelude::*;

/// Written once, in bulk, when a Judgment completes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "suspects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub judgment_id: String,
    /// Rank within the verdict, 0 is the top suspect
    pub position: i32,
    pub username: String,
    pub avatar_url: Option<String>,
    pub responsibility: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_commit_msg: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::judgment::Entity",
        from = "Column::JudgmentId",
        to = "super::judgment::Column::Id",
        on_delete = "Cascade"
    )]
    Judgment,
}

impl Related<super::judgment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Judgment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
