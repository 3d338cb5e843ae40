use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::Intensity;
use crate::store::entities::blame;
use crate::store::Store;

/// A freshly computed verdict, before it is persisted.
#[derive(Debug, Clone)]
pub struct BlameRecord {
    pub judgment_id: String,
    pub target_username: String,
    pub target_avatar: Option<String>,
    pub responsibility: u8,
    pub reason: String,
    pub message: String,
    pub intensity: Intensity,
}

impl Store {
    /// Writes the verdict for a judgment, replacing any previous one. The
    /// image URL is cleared since the old card shows the old message.
    pub async fn upsert_blame(&self, record: BlameRecord) -> Result<blame::Model> {
        let now = Utc::now();
        let judgment_id = record.judgment_id.clone();
        let model = blame::ActiveModel {
            judgment_id: Set(record.judgment_id),
            target_username: Set(record.target_username),
            target_avatar: Set(record.target_avatar),
            responsibility: Set(i32::from(record.responsibility)),
            reason: Set(record.reason),
            message: Set(record.message),
            intensity: Set(record.intensity.as_str().to_string()),
            image_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        blame::Entity::insert(model)
            .on_conflict(
                OnConflict::column(blame::Column::JudgmentId)
                    .update_columns([
                        blame::Column::TargetUsername,
                        blame::Column::TargetAvatar,
                        blame::Column::Responsibility,
                        blame::Column::Reason,
                        blame::Column::Message,
                        blame::Column::Intensity,
                        blame::Column::ImageUrl,
                        blame::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        debug!(judgment_id = %judgment_id, "upserted blame");
        self.find_blame(&judgment_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("blame for {} vanished after upsert", judgment_id)))
    }

    pub async fn find_blame(&self, judgment_id: &str) -> Result<Option<blame::Model>> {
        Ok(blame::Entity::find()
            .filter(blame::Column::JudgmentId.eq(judgment_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn attach_blame_image(&self, judgment_id: &str, image_url: &str) -> Result<blame::Model> {
        let current = self
            .find_blame(judgment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blame for judgment {}", judgment_id)))?;

        let mut active: blame::ActiveModel = current.into();
        active.image_url = Set(Some(image_url.to_string()));
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.conn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewJudgment, NewUser};

    async fn judgment(store: &Store) -> String {
        let user = store
            .upsert_user(NewUser {
                github_id: "1".to_string(),
                username: "alice".to_string(),
                avatar_url: None,
                access_token: "t".to_string(),
            })
            .await
            .unwrap();
        store
            .create_judgment(NewJudgment {
                user_id: user.id,
                repo_name: "acme/shop".to_string(),
                title: "bug".to_string(),
                description: "d".to_string(),
                file_path: "a.rs".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn record(judgment_id: &str, message: &str, intensity: Intensity) -> BlameRecord {
        BlameRecord {
            judgment_id: judgment_id.to_string(),
            target_username: "alice".to_string(),
            target_avatar: Some("https://a/alice".to_string()),
            responsibility: 70,
            reason: "recent refactor".to_string(),
            message: message.to_string(),
            intensity,
        }
    }

    #[tokio::test]
    async fn second_upsert_replaces_message_in_place() {
        let store = Store::in_memory().await;
        let id = judgment(&store).await;

        let first = store.upsert_blame(record(&id, "gentle", Intensity::Mild)).await.unwrap();
        let second = store.upsert_blame(record(&id, "brutal", Intensity::Spicy)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.message, "brutal");
        assert_eq!(second.intensity, "spicy");
        assert_eq!(blame::Entity::find().all(&store.conn).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recomputation_clears_stale_image() {
        let store = Store::in_memory().await;
        let id = judgment(&store).await;

        store.upsert_blame(record(&id, "m", Intensity::Medium)).await.unwrap();
        store.attach_blame_image(&id, "https://cdn/x.svg").await.unwrap();
        let again = store.upsert_blame(record(&id, "m2", Intensity::Medium)).await.unwrap();

        assert_eq!(again.message, "m2");
        assert_eq!(again.image_url, None);
    }

    #[tokio::test]
    async fn attaching_without_verdict_is_not_found() {
        let store = Store::in_memory().await;
        let id = judgment(&store).await;
        let err = store.attach_blame_image(&id, "u").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
