//! 点击记账：后台 worker 池、点击记录与读取

mod job;
mod queue;
mod recorder;
pub mod user_agent;

pub use job::AccountingJob;
pub use queue::{AccountingPool, AccountingSnapshot};
pub use recorder::{ClickCursor, ClickRecorder};
