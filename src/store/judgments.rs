use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{JudgmentStatus, SuspectResponse};
use crate::store::entities::{judgment, suspect};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct NewJudgment {
    pub user_id: String,
    pub repo_name: String,
    pub title: String,
    pub description: String,
    pub file_path: String,
}

impl Store {
    /// Creates a judgment in `pending`.
    pub async fn create_judgment(&self, new: NewJudgment) -> Result<judgment::Model> {
        let model = judgment::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(new.user_id),
            repo_name: Set(new.repo_name),
            title: Set(new.title),
            description: Set(new.description),
            file_path: Set(new.file_path),
            status: Set(JudgmentStatus::Pending.as_str().to_string()),
            error_message: Set(None),
            created_at: Set(Utc::now()),
        };
        let created = model.insert(&self.conn).await?;
        debug!(judgment_id = %created.id, repo = %created.repo_name, "created judgment");
        Ok(created)
    }

    pub async fn find_judgment(&self, id: &str) -> Result<Option<judgment::Model>> {
        Ok(judgment::Entity::find_by_id(id.to_string()).one(&self.conn).await?)
    }

    /// The user's judgments, newest first.
    pub async fn list_judgments(&self, user_id: &str) -> Result<Vec<judgment::Model>> {
        Ok(judgment::Entity::find()
            .filter(judgment::Column::UserId.eq(user_id))
            .order_by_desc(judgment::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    /// Stores the suspects and flips the judgment to `completed` in one
    /// transaction. Only a pending judgment can complete.
    pub async fn complete_judgment(&self, id: &str, suspects: &[SuspectResponse]) -> Result<()> {
        let txn = self.conn.begin().await?;

        let current = judgment::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Judgment {}", id)))?;
        ensure_pending(&current)?;

        if !suspects.is_empty() {
            let rows = suspects.iter().enumerate().map(|(position, s)| suspect::ActiveModel {
                judgment_id: Set(id.to_string()),
                position: Set(position as i32),
                username: Set(s.username.clone()),
                avatar_url: Set(s.avatar_url.clone()),
                responsibility: Set(i32::from(s.responsibility)),
                reason: Set(s.reason.clone()),
                last_commit_msg: Set(s.last_commit_msg.clone()),
                ..Default::default()
            });
            suspect::Entity::insert_many(rows).exec_without_returning(&txn).await?;
        }

        let mut active: judgment::ActiveModel = current.into();
        active.status = Set(JudgmentStatus::Completed.as_str().to_string());
        active.update(&txn).await?;

        txn.commit().await?;
        info!(judgment_id = id, suspects = suspects.len(), "judgment completed");
        Ok(())
    }

    /// Moves a pending judgment to `failed`, recording why.
    pub async fn fail_judgment(&self, id: &str, reason: &str) -> Result<()> {
        let current = self
            .find_judgment(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Judgment {}", id)))?;
        ensure_pending(&current)?;

        let mut active: judgment::ActiveModel = current.into();
        active.status = Set(JudgmentStatus::Failed.as_str().to_string());
        active.error_message = Set(Some(reason.to_string()));
        active.update(&self.conn).await?;

        info!(judgment_id = id, reason, "judgment failed");
        Ok(())
    }

    /// Suspects in verdict order.
    pub async fn suspects_for(&self, judgment_id: &str) -> Result<Vec<suspect::Model>> {
        Ok(suspect::Entity::find()
            .filter(suspect::Column::JudgmentId.eq(judgment_id))
            .order_by_asc(suspect::Column::Position)
            .all(&self.conn)
            .await?)
    }

    /// Deletes the judgment with its suspects and verdict. Returns whether
    /// a row existed.
    pub async fn delete_judgment(&self, id: &str) -> Result<bool> {
        let result = judgment::Entity::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

fn ensure_pending(model: &judgment::Model) -> Result<()> {
    if model.status == JudgmentStatus::Pending.as_str() {
        Ok(())
    } else {
        Err(AppError::InvalidState(format!(
            "Judgment {} is already {}",
            model.id, model.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intensity;
    use crate::store::blames::BlameRecord;
    use crate::store::entities::blame;
    use crate::store::NewUser;

    async fn seeded() -> (Store, String) {
        let store = Store::in_memory().await;
        let user = store
            .upsert_user(NewUser {
                github_id: "1".to_string(),
                username: "alice".to_string(),
                avatar_url: None,
                access_token: "t".to_string(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn new_judgment(user_id: &str, title: &str) -> NewJudgment {
        NewJudgment {
            user_id: user_id.to_string(),
            repo_name: "acme/shop".to_string(),
            title: title.to_string(),
            description: "payment returns 500".to_string(),
            file_path: "src/api/payment.ts".to_string(),
        }
    }

    fn suspect(username: &str, responsibility: u8) -> SuspectResponse {
        SuspectResponse {
            username: username.to_string(),
            avatar_url: None,
            responsibility,
            reason: format!("{} touched it", username),
            last_commit_msg: Some("refactor".to_string()),
        }
    }

    #[tokio::test]
    async fn complete_stores_suspects_in_order() {
        let (store, user_id) = seeded().await;
        let j = store.create_judgment(new_judgment(&user_id, "bug")).await.unwrap();
        assert_eq!(j.status, "pending");

        store
            .complete_judgment(&j.id, &[suspect("alice", 70), suspect("bob", 30)])
            .await
            .unwrap();

        let stored = store.find_judgment(&j.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "completed");
        let suspects = store.suspects_for(&j.id).await.unwrap();
        let names: Vec<_> = suspects.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(suspects[0].responsibility, 70);
    }

    #[tokio::test]
    async fn terminal_judgments_do_not_transition_again() {
        let (store, user_id) = seeded().await;
        let j = store.create_judgment(new_judgment(&user_id, "bug")).await.unwrap();
        store.fail_judgment(&j.id, "model timed out").await.unwrap();

        let err = store.complete_judgment(&j.id, &[suspect("alice", 100)]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(store.suspects_for(&j.id).await.unwrap().is_empty());

        let stored = store.find_judgment(&j.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "failed");
        assert_eq!(stored.error_message.as_deref(), Some("model timed out"));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let (store, user_id) = seeded().await;
        store.create_judgment(new_judgment(&user_id, "older")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.create_judgment(new_judgment(&user_id, "newer")).await.unwrap();

        let titles: Vec<_> = store
            .list_judgments(&user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.title)
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);
        assert!(store.list_judgments("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_suspects_and_blame() {
        let (store, user_id) = seeded().await;
        let j = store.create_judgment(new_judgment(&user_id, "bug")).await.unwrap();
        store.complete_judgment(&j.id, &[suspect("alice", 100)]).await.unwrap();
        store
            .upsert_blame(BlameRecord {
                judgment_id: j.id.clone(),
                target_username: "alice".to_string(),
                target_avatar: None,
                responsibility: 100,
                reason: "all hers".to_string(),
                message: "alice, really?".to_string(),
                intensity: Intensity::Medium,
            })
            .await
            .unwrap();

        assert!(store.delete_judgment(&j.id).await.unwrap());
        assert!(store.suspects_for(&j.id).await.unwrap().is_empty());
        assert!(blame::Entity::find().all(&store.conn).await.unwrap().is_empty());
        assert!(!store.delete_judgment(&j.id).await.unwrap());
    }
}
