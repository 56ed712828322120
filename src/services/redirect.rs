use std::net::IpAddr;

use actix_web::http::StatusCode;
use tracing::{debug, instrument};

use crate::analytics::AccountingJob;
use crate::errors::KurzError;
use crate::services::LinkResolver;
use crate::utils::{keyword_from_path, normalize_host};

/// 存储不可用时建议客户端的重试间隔（秒）
pub const RETRY_AFTER_SECS: u64 = 5;

/// 与 HTTP 框架无关的重定向请求
#[derive(Debug, Clone, Default)]
pub struct RedirectRequest {
    pub host: String,
    pub path: String,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub session_id: String,
}

/// 重定向结果
///
/// `result` 为目标地址或错误；成功时 `job` 携带待记账任务，
/// 由调用方在响应交给传输层之后提交。
#[derive(Debug)]
pub struct RedirectOutcome {
    pub result: Result<String, KurzError>,
    pub status: StatusCode,
    pub job: Option<AccountingJob>,
}

impl RedirectOutcome {
    fn redirect(destination: String, job: AccountingJob) -> Self {
        Self {
            result: Ok(destination),
            status: StatusCode::MOVED_PERMANENTLY,
            job: Some(job),
        }
    }

    fn default_redirect(destination: String) -> Self {
        Self {
            result: Ok(destination),
            status: StatusCode::TEMPORARY_REDIRECT,
            job: None,
        }
    }

    fn failed(err: KurzError) -> Self {
        let status = match err {
            KurzError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::NOT_FOUND,
        };
        Self {
            result: Err(err),
            status,
            job: None,
        }
    }

    /// 503 响应需要附带 Retry-After
    pub fn retry_after(&self) -> Option<u64> {
        (self.status == StatusCode::SERVICE_UNAVAILABLE).then_some(RETRY_AFTER_SECS)
    }
}

#[derive(Clone)]
pub struct RedirectService {
    resolver: LinkResolver,
    default_url: Option<String>,
}

impl RedirectService {
    pub fn new(resolver: LinkResolver, default_url: Option<String>) -> Self {
        Self {
            resolver,
            default_url: default_url.filter(|url| !url.is_empty()),
        }
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    #[instrument(skip(self, request), fields(host = %request.host, path = %request.path))]
    pub async fn handle_redirect(&self, request: RedirectRequest) -> RedirectOutcome {
        let domain = normalize_host(&request.host);
        if request.path.trim_start_matches('/').is_empty() {
            return match &self.default_url {
                Some(url) => RedirectOutcome::default_redirect(url.clone()),
                None => RedirectOutcome::failed(KurzError::link_not_found(format!("{}/", domain))),
            };
        }

        let keyword = match keyword_from_path(&request.path) {
            Some(keyword) if !domain.is_empty() => keyword,
            _ => {
                debug!("Rejected malformed redirect target: {}{}", domain, request.path);
                return RedirectOutcome::failed(KurzError::link_not_found(format!(
                    "{}{}",
                    domain, request.path
                )));
            }
        };

        match self.resolver.resolve(&domain, &keyword).await {
            Ok(link) => {
                let mut job = AccountingJob::new(request.session_id, domain, keyword);
                job.client_ip = request.client_ip;
                job.user_agent = request.user_agent;
                job.referer = request.referer;
                RedirectOutcome::redirect(link.destination_url, job)
            }
            Err(e) => RedirectOutcome::failed(e),
        }
    }
}
