use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::store::entities::user;
use crate::store::Store;

/// Identity returned by GitHub after a successful OAuth exchange.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub github_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub access_token: String,
}

impl Store {
    /// Inserts the user, or refreshes profile and token when the GitHub
    /// account is already known. The local id never changes.
    pub async fn upsert_user(&self, new: NewUser) -> Result<user::Model> {
        let github_id = new.github_id.clone();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            github_id: Set(new.github_id),
            username: Set(new.username),
            avatar_url: Set(new.avatar_url),
            access_token: Set(new.access_token),
            created_at: Set(Utc::now()),
        };

        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::GithubId)
                    .update_columns([
                        user::Column::Username,
                        user::Column::AvatarUrl,
                        user::Column::AccessToken,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        let user = user::Entity::find()
            .filter(user::Column::GithubId.eq(github_id.as_str()))
            .one(&self.conn)
            .await?
            .ok_or_else(|| AppError::Internal(format!("user {} vanished after upsert", github_id)))?;
        debug!(user_id = %user.id, username = %user.username, "upserted user");
        Ok(user)
    }

    pub async fn find_user(&self, id: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id.to_string()).one(&self.conn).await?)
    }
}
