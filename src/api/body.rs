//! 在响应体被释放时提交记账任务
//!
//! 长度为 0 的响应体在 dispatcher 把响应头编码进写缓冲后即被释放（早于 socket flush），
//! 客户端断开时也会释放。记账因此总在 handler 返回、响应交给 dispatcher 之后开始。

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::{BodySize, MessageBody};
use bytes::Bytes;

use crate::analytics::{AccountingJob, AccountingPool};

pub struct AccountingBody {
    job: Option<AccountingJob>,
    pool: Arc<AccountingPool>,
}

impl AccountingBody {
    pub fn new(job: AccountingJob, pool: Arc<AccountingPool>) -> Self {
        Self {
            job: Some(job),
            pool,
        }
    }
}

impl MessageBody for AccountingBody {
    type Error = Infallible;

    // Sized(0) 而不是 None：None 会让 BoxBody 立即丢弃 body
    fn size(&self) -> BodySize {
        BodySize::Sized(0)
    }

    fn poll_next(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        Poll::Ready(None)
    }
}

impl Drop for AccountingBody {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            self.pool.submit(job);
        }
    }
}
