use sea_orm::entity::prelude::*;

/// The verdict for one Judgment; `judgment_id` is unique so writes upsert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blames")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub judgment_id: String,
    pub target_username: String,
    pub target_avatar: Option<String>,
    pub responsibility: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub intensity: String,
    pub image_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
