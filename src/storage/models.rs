use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 构造 link key：`domain + "/" + keyword`
pub fn link_key(domain: &str, keyword: &str) -> String {
    format!("{}/{}", domain, keyword)
}

/// 短链接映射，由外部管理端创建，本服务只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub domain: String,
    pub keyword: String,
    pub destination_url: String,
    pub title: Option<String>,
    pub active: bool,
    /// 外部账户的不透明引用
    pub owner_id: String,
}

impl Link {
    pub fn link_key(&self) -> String {
        link_key(&self.domain, &self.keyword)
    }
}

/// 一次访问记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_key: String,
    /// Unix 毫秒时间戳
    pub timestamp: i64,
    pub remote_address: Option<String>,
    pub user_agent_family: Option<String>,
    pub os_family: Option<String>,
    pub device_family: Option<String>,
    pub referer: Option<String>,
}

impl ClickEvent {
    pub fn at(link_key: impl Into<String>, timestamp: i64) -> Self {
        Self {
            link_key: link_key.into(),
            timestamp,
            remote_address: None,
            user_agent_family: None,
            os_family: None,
            device_family: None,
            referer: None,
        }
    }

    pub fn clicked_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// 拆出存储 value 部分
    pub fn metadata(&self) -> ClickMetadata {
        ClickMetadata {
            remote_address: self.remote_address.clone(),
            user_agent_family: self.user_agent_family.clone(),
            os_family: self.os_family.clone(),
            device_family: self.device_family.clone(),
            referer: self.referer.clone(),
        }
    }

    pub fn from_parts(link_key: impl Into<String>, timestamp: i64, metadata: ClickMetadata) -> Self {
        Self {
            link_key: link_key.into(),
            timestamp,
            remote_address: metadata.remote_address,
            user_agent_family: metadata.user_agent_family,
            os_family: metadata.os_family,
            device_family: metadata.device_family,
            referer: metadata.referer,
        }
    }
}

/// 点击存储的 value，所有字段尽力而为
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}
