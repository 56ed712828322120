use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 links 表
        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Links::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Links::Domain).string_len(255).not_null())
                    .col(ColumnDef::new(Links::Keyword).string_len(128).not_null())
                    .col(ColumnDef::new(Links::DestinationUrl).text().not_null())
                    .col(ColumnDef::new(Links::Title).string_len(512).null())
                    .col(
                        ColumnDef::new(Links::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Links::OwnerId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Links::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 解析路径使用的复合索引 (domain, keyword, active)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_domain_keyword_active")
                    .table(Links::Table)
                    .col(Links::Domain)
                    .col(Links::Keyword)
                    .col(Links::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_links_domain_keyword_active")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Links::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Links {
    Table,
    Id,
    Domain,
    Keyword,
    DestinationUrl,
    Title,
    Active,
    OwnerId,
    CreatedAt,
}
