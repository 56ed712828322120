//! 点击记录与读取

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::Stream;
use futures_util::stream;
use tracing::{trace, warn};

use crate::errors::Result;
use crate::storage::click::{self, ClickStore};
use crate::storage::{ClickEvent, ClickMetadata};

/// 把点击事件追加到有序存储
#[derive(Clone)]
pub struct ClickRecorder {
    store: Arc<dyn ClickStore>,
    page_size: usize,
}

impl ClickRecorder {
    pub fn new(store: Arc<dyn ClickStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn ClickStore> {
        &self.store
    }

    /// 写入一条点击；同一毫秒的重复写入会覆盖
    pub async fn record(&self, event: &ClickEvent) -> Result<()> {
        let key = click::click_key(&event.link_key, event.timestamp)?;
        let value = serde_json::to_string(&event.metadata())?;
        self.store.append(&key, &value).await?;
        trace!("Click recorded: {}", key);
        Ok(())
    }

    /// 某链接的点击游标（按时间升序）
    pub fn list_clicks(&self, link_key: &str) -> ClickCursor {
        ClickCursor::new(self.store.clone(), link_key, self.page_size)
    }

    /// 以 Stream 形式读取某链接的完整点击事件
    pub fn list_click_events(&self, link_key: &str) -> impl Stream<Item = Result<ClickEvent>> + use<> {
        self.list_clicks(link_key).into_event_stream()
    }
}

/// 分页前缀扫描游标
///
/// 惰性读取，每次只拉一页；`restart` 后从头重新扫描。
pub struct ClickCursor {
    store: Arc<dyn ClickStore>,
    link_key: String,
    prefix: String,
    page_size: usize,
    after: Option<String>,
    buffer: VecDeque<(i64, String)>,
    exhausted: bool,
}

impl ClickCursor {
    fn new(store: Arc<dyn ClickStore>, link_key: &str, page_size: usize) -> Self {
        Self {
            store,
            link_key: link_key.to_string(),
            prefix: click::click_prefix(link_key),
            page_size,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn link_key(&self) -> &str {
        &self.link_key
    }

    pub fn restart(&mut self) {
        self.after = None;
        self.buffer.clear();
        self.exhausted = false;
    }

    async fn fill(&mut self) -> Result<()> {
        while self.buffer.is_empty() && !self.exhausted {
            let page = self
                .store
                .scan_prefix(&self.prefix, self.after.as_deref(), self.page_size)
                .await?;

            if page.len() < self.page_size {
                self.exhausted = true;
            }
            if let Some((last_key, _)) = page.last() {
                self.after = Some(last_key.clone());
            }

            self.buffer.extend(page.into_iter().filter_map(|(key, value)| {
                click::parse_click_timestamp(&self.prefix, &key).map(|ts| (ts, value))
            }));
        }
        Ok(())
    }

    async fn next_entry(&mut self) -> Result<Option<(i64, String)>> {
        self.fill().await?;
        Ok(self.buffer.pop_front())
    }

    /// 下一个点击时间戳（Unix 毫秒）
    pub async fn next_timestamp(&mut self) -> Result<Option<i64>> {
        Ok(self.next_entry().await?.map(|(ts, _)| ts))
    }

    /// 下一个完整点击事件；元数据损坏时按空元数据返回
    pub async fn next_event(&mut self) -> Result<Option<ClickEvent>> {
        let Some((timestamp, value)) = self.next_entry().await? else {
            return Ok(None);
        };
        let metadata = serde_json::from_str::<ClickMetadata>(&value).unwrap_or_else(|e| {
            warn!(
                "Corrupt click metadata for {} at {}: {}",
                self.link_key, timestamp, e
            );
            ClickMetadata::default()
        });
        Ok(Some(ClickEvent::from_parts(
            self.link_key.clone(),
            timestamp,
            metadata,
        )))
    }

    /// 读取剩余的全部时间戳
    pub async fn collect_timestamps(mut self) -> Result<Vec<i64>> {
        let mut timestamps = Vec::new();
        while let Some(ts) = self.next_timestamp().await? {
            timestamps.push(ts);
        }
        Ok(timestamps)
    }

    pub fn into_timestamp_stream(self) -> impl Stream<Item = Result<i64>> {
        stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next_timestamp().await {
                Ok(Some(ts)) => Some((Ok(ts), Some(cursor))),
                Ok(None) => None,
                // 出错后结束
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    pub fn into_event_stream(self) -> impl Stream<Item = Result<ClickEvent>> {
        stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next_event().await {
                Ok(Some(event)) => Some((Ok(event), Some(cursor))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
