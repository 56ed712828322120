//! 点击事件表迁移
//!
//! click_events 是一张有序 KV 表：主键即存储 key，按主键范围扫描即前缀扫描。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvents::EventKey)
                            .string_len(512)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvents::Payload).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvents {
    Table,
    EventKey,
    Payload,
}
