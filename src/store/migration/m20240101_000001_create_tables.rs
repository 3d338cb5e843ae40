use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    GithubId,
    Username,
    AvatarUrl,
    AccessToken,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Judgments {
    Table,
    Id,
    UserId,
    RepoName,
    Title,
    Description,
    FilePath,
    Status,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Suspects {
    Table,
    Id,
    JudgmentId,
    Position,
    Username,
    AvatarUrl,
    Responsibility,
    Reason,
    LastCommitMsg,
}

#[derive(DeriveIden)]
enum Blames {
    Table,
    Id,
    JudgmentId,
    TargetUsername,
    TargetAvatar,
    Responsibility,
    Reason,
    Message,
    Intensity,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::GithubId).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::AvatarUrl).string())
                    .col(ColumnDef::new(Users::AccessToken).text().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Judgments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Judgments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Judgments::UserId).string().not_null())
                    .col(ColumnDef::new(Judgments::RepoName).string().not_null())
                    .col(ColumnDef::new(Judgments::Title).string().not_null())
                    .col(ColumnDef::new(Judgments::Description).text().not_null())
                    .col(ColumnDef::new(Judgments::FilePath).string().not_null())
                    .col(ColumnDef::new(Judgments::Status).string().not_null())
                    .col(ColumnDef::new(Judgments::ErrorMessage).text())
                    .col(ColumnDef::new(Judgments::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_judgments_user")
                            .from(Judgments::Table, Judgments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_judgments_user_created")
                    .table(Judgments::Table)
                    .col(Judgments::UserId)
                    .col(Judgments::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Suspects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suspects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suspects::JudgmentId).string().not_null())
                    .col(ColumnDef::new(Suspects::Position).integer().not_null())
                    .col(ColumnDef::new(Suspects::Username).string().not_null())
                    .col(ColumnDef::new(Suspects::AvatarUrl).string())
                    .col(ColumnDef::new(Suspects::Responsibility).integer().not_null())
                    .col(ColumnDef::new(Suspects::Reason).text().not_null())
                    .col(ColumnDef::new(Suspects::LastCommitMsg).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suspects_judgment")
                            .from(Suspects::Table, Suspects::JudgmentId)
                            .to(Judgments::Table, Judgments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Blames::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Blames::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Blames::JudgmentId).string().not_null().unique_key())
                    .col(ColumnDef::new(Blames::TargetUsername).string().not_null())
                    .col(ColumnDef::new(Blames::TargetAvatar).string())
                    .col(ColumnDef::new(Blames::Responsibility).integer().not_null())
                    .col(ColumnDef::new(Blames::Reason).text().not_null())
                    .col(ColumnDef::new(Blames::Message).text().not_null())
                    .col(ColumnDef::new(Blames::Intensity).string().not_null())
                    .col(ColumnDef::new(Blames::ImageUrl).string())
                    .col(ColumnDef::new(Blames::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Blames::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blames_judgment")
                            .from(Blames::Table, Blames::JudgmentId)
                            .to(Judgments::Table, Judgments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Blames::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suspects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Judgments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
