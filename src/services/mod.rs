//! 业务逻辑层，与 HTTP 框架解耦

mod redirect;
mod resolver;
mod uniqueness;

pub use redirect::{RETRY_AFTER_SECS, RedirectOutcome, RedirectRequest, RedirectService};
pub use resolver::LinkResolver;
pub use uniqueness::UniquenessTracker;
