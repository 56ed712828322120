use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, error};

use super::LinkDirectory;
use crate::config::DatabaseConfig;
use crate::errors::{KurzError, Result};
use crate::storage::Link;
use crate::storage::backend::retry::{self, RetryConfig};
use migration::entities::link;

fn model_to_link(model: link::Model) -> Link {
    Link {
        id: model.id,
        domain: model.domain,
        keyword: model.keyword,
        destination_url: model.destination_url,
        title: model.title,
        active: model.active,
        owner_id: model.owner_id,
    }
}

/// 基于 SeaORM 的链接目录（SQLite / MySQL / PostgreSQL）
#[derive(Clone)]
pub struct SeaOrmLinkDirectory {
    db: DatabaseConnection,
    retry_config: RetryConfig,
    timeout_ms: u64,
}

impl SeaOrmLinkDirectory {
    pub fn new(db: DatabaseConnection, config: &DatabaseConfig) -> Self {
        Self {
            db,
            retry_config: RetryConfig::from(config),
            timeout_ms: config.timeout_ms,
        }
    }

    /// 写入或覆盖一条链接（供导入和测试使用，本服务的请求路径不会写）
    ///
    /// domain 统一存为 ASCII 小写，与请求侧的 Host 规范化一致
    pub async fn upsert(&self, value: &Link) -> Result<()> {
        let model = link::ActiveModel {
            id: Set(value.id.clone()),
            domain: Set(value.domain.to_ascii_lowercase()),
            keyword: Set(value.keyword.clone()),
            destination_url: Set(value.destination_url.clone()),
            title: Set(value.title.clone()),
            active: Set(value.active),
            owner_id: Set(value.owner_id.clone()),
            created_at: Set(Utc::now()),
        };

        link::Entity::insert(model)
            .on_conflict(
                OnConflict::column(link::Column::Id)
                    .update_columns([
                        link::Column::Domain,
                        link::Column::Keyword,
                        link::Column::DestinationUrl,
                        link::Column::Title,
                        link::Column::Active,
                        link::Column::OwnerId,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| {
                KurzError::storage_unavailable(format!(
                    "Upsert link '{}' failed: {}",
                    value.link_key(),
                    e
                ))
            })?;

        debug!("Link upserted: {}", value.link_key());
        Ok(())
    }
}

#[async_trait]
impl LinkDirectory for SeaOrmLinkDirectory {
    async fn find_active_link(&self, domain: &str, keyword: &str) -> Result<Option<Link>> {
        let db = &self.db;
        let normalized = domain.to_ascii_lowercase();
        let domain = normalized.as_str();
        let result = retry::with_retry_timeout(
            "find_active_link",
            self.retry_config,
            self.timeout_ms,
            || async {
                link::Entity::find()
                    .filter(link::Column::Domain.eq(domain))
                    .filter(link::Column::Keyword.eq(keyword))
                    .filter(link::Column::Active.eq(true))
                    .order_by_desc(link::Column::CreatedAt)
                    .one(db)
                    .await
            },
        )
        .await;

        match result {
            Ok(model) => Ok(model.map(model_to_link)),
            Err(e) => {
                error!("Link lookup failed for {}/{}: {}", domain, keyword, e);
                Err(KurzError::storage_unavailable(e.to_string()))
            }
        }
    }

    async fn health_check(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "database"
    }
}
