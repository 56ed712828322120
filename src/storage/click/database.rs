use async_trait::async_trait;
use sea_orm::sea_query::{LikeExpr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::trace;

use super::{ClickStore, like_pattern};
use crate::errors::Result;
use migration::entities::click_event;

/// 基于 click_events 表的有序 KV
///
/// 主键即 key；前缀扫描是转义后的 LIKE 查询加主键排序，结果严格按字节前缀匹配。
#[derive(Clone)]
pub struct SeaOrmClickStore {
    db: DatabaseConnection,
}

impl SeaOrmClickStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClickStore for SeaOrmClickStore {
    async fn append(&self, key: &str, value: &str) -> Result<()> {
        let model = click_event::ActiveModel {
            event_key: Set(key.to_string()),
            payload: Set(value.to_string()),
        };

        click_event::Entity::insert(model)
            .on_conflict(
                OnConflict::column(click_event::Column::EventKey)
                    .update_column(click_event::Column::Payload)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        trace!("Click event appended: {}", key);
        Ok(())
    }

    async fn scan_prefix(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::with_capacity(limit);
        let mut cursor = after.map(str::to_string);

        // SQLite / MySQL 的 LIKE 默认不区分大小写，返回的行需要再按字节前缀过滤
        while entries.len() < limit {
            let mut query = click_event::Entity::find().filter(
                click_event::Column::EventKey
                    .like(LikeExpr::new(like_pattern(prefix)).escape('\\')),
            );
            if let Some(after) = cursor.as_deref() {
                query = query.filter(click_event::Column::EventKey.gt(after));
            }

            let rows = query
                .order_by_asc(click_event::Column::EventKey)
                .limit(limit as u64)
                .all(&self.db)
                .await?;

            let fetched = rows.len();
            if let Some(last) = rows.last() {
                cursor = Some(last.event_key.clone());
            }
            entries.extend(
                rows.into_iter()
                    .filter(|row| row.event_key.starts_with(prefix))
                    .map(|row| (row.event_key, row.payload)),
            );

            if fetched < limit {
                break;
            }
        }

        entries.truncate(limit);
        Ok(entries)
    }

    fn backend_name(&self) -> &'static str {
        "database"
    }
}
