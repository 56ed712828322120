use std::net::IpAddr;

use chrono::Utc;

use crate::analytics::user_agent::parse_user_agent;
use crate::storage::{ClickEvent, link_key};

/// 一次重定向产生的待记账任务
///
/// 请求路径只收集原始数据，UA 解析和会话判定都在后台 worker 中完成。
#[derive(Debug, Clone)]
pub struct AccountingJob {
    pub session_id: String,
    pub domain: String,
    pub keyword: String,
    /// 请求时刻（Unix 毫秒）
    pub timestamp: i64,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl AccountingJob {
    pub fn new(session_id: impl Into<String>, domain: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            domain: domain.into(),
            keyword: keyword.into(),
            timestamp: Utc::now().timestamp_millis(),
            client_ip: None,
            user_agent: None,
            referer: None,
        }
    }

    pub fn link_key(&self) -> String {
        link_key(&self.domain, &self.keyword)
    }

    pub fn is_loopback(&self) -> bool {
        self.client_ip.is_some_and(|ip| match ip {
            IpAddr::V4(v4) => v4.is_loopback(),
            IpAddr::V6(v6) => {
                v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
            }
        })
    }

    /// 转换为点击事件
    pub fn to_event(&self) -> ClickEvent {
        let mut event = ClickEvent::at(self.link_key(), self.timestamp);
        event.remote_address = self.client_ip.map(|ip| ip.to_string());
        event.referer = self.referer.clone().filter(|r| !r.is_empty());
        if let Some(ua) = self.user_agent.as_deref() {
            let parsed = parse_user_agent(ua);
            event.user_agent_family = parsed.family;
            event.os_family = parsed.os_family;
            event.device_family = parsed.device_family;
        }
        event
    }
}
