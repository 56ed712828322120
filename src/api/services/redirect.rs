use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, error, trace};

use crate::api::{AccountingBody, AppState};
use crate::errors::KurzError;
use crate::services::{RedirectOutcome, RedirectRequest};
use crate::session::{is_valid_session_id, new_session_id, session_cookie};
use crate::utils::ip::extract_client_ip;

pub struct RedirectHandler;

impl RedirectHandler {
    pub async fn handle_redirect(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
        let (session_id, issued) = match req.cookie(&state.session.cookie_name) {
            Some(cookie) if is_valid_session_id(cookie.value()) => (cookie.value().to_string(), false),
            _ => (new_session_id(), true),
        };

        let request = RedirectRequest {
            host: Self::request_host(&req),
            path: req.path().to_string(),
            client_ip: extract_client_ip(&req, &state.trusted_proxies),
            user_agent: Self::header_string(&req, header::USER_AGENT),
            referer: Self::header_string(&req, header::REFERER),
            session_id: session_id.clone(),
        };

        let outcome = state.redirect.handle_redirect(request).await;
        let mut response = Self::into_response(outcome, &state);

        if issued {
            let cookie = session_cookie(&state.session, &session_id);
            if let Err(e) = response.add_cookie(&cookie) {
                error!("Failed to attach session cookie: {}", e);
            }
        }
        response
    }

    fn into_response(outcome: RedirectOutcome, state: &AppState) -> HttpResponse {
        let retry_after = outcome.retry_after();
        match outcome.result {
            Ok(destination) => {
                let mut builder = HttpResponse::build(outcome.status);
                builder
                    .insert_header((header::LOCATION, destination))
                    .insert_header((header::CACHE_CONTROL, "private, no-cache"));

                let Some(job) = outcome.job else {
                    return builder.finish();
                };
                trace!("Deferring accounting for {}", job.link_key());
                builder
                    .message_body(AccountingBody::new(job, state.accounting.clone()))
                    .map(|res| res.map_into_boxed_body())
                    .unwrap_or_else(|e| {
                        error!("Failed to build redirect response: {}", e);
                        HttpResponse::InternalServerError().finish()
                    })
            }
            Err(KurzError::LinkNotFound(key)) => {
                debug!("Redirect target not found: {}", key);
                Self::not_found_response()
            }
            Err(e) => {
                error!(code = e.code(), "Redirect failed: {}", e);
                Self::unavailable_response(retry_after.unwrap_or(crate::services::RETRY_AFTER_SECS))
            }
        }
    }

    /// 只取 Host 头，不信任 X-Forwarded-Host
    fn request_host(req: &HttpRequest) -> String {
        req.headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(String::from)
            .or_else(|| req.uri().host().map(String::from))
            .unwrap_or_default()
    }

    fn header_string(req: &HttpRequest, name: header::HeaderName) -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((header::CACHE_CONTROL, "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn unavailable_response(retry_after: u64) -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((header::RETRY_AFTER, HeaderValue::from(retry_after)))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .body("Service Unavailable")
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{path:.*}", web::get().to(RedirectHandler::handle_redirect))
        .route("/{path:.*}", web::head().to(RedirectHandler::handle_redirect))
}
