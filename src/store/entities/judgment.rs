use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "judgments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub repo_name: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub file_path: String,
    /// `pending` | `completed` | `failed`
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::suspect::Entity")]
    Suspect,
    #[sea_orm(has_one = "super::blame::Entity")]
    Blame,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::suspect::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suspect.def()
    }
}

impl Related<super::blame::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blame.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
