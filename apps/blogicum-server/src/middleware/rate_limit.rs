//! Rate limiting middleware.
//!
//! Looks up the `RateLimiter` registered as app data and throttles by client
//! address. Requests pass through when no limiter is registered or the
//! limiter fails.
//!
//! The client address is the TCP peer. `Forwarded`/`X-Forwarded-For` are only
//! honoured when `TRUST_PROXY_HEADERS=true`, i.e. behind a proxy that
//! overwrites them.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use blogicum_core::ports::RateLimiter;
use blogicum_shared::ErrorResponse;

/// Rate limiting middleware factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimit {
    trust_proxy_headers: bool,
}

impl RateLimit {
    pub fn from_env() -> Self {
        Self {
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            trust_proxy_headers: self.trust_proxy_headers,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    trust_proxy_headers: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = req
            .app_data::<web::Data<Arc<dyn RateLimiter>>>()
            .map(|data| Arc::clone(data.get_ref()));

        let key = if self.trust_proxy_headers {
            req.connection_info().realip_remote_addr().map(str::to_owned)
        } else {
            req.peer_addr().map(|addr| addr.ip().to_string())
        }
        .unwrap_or_else(|| "unknown".to_string());

        Box::pin(async move {
            if let Some(limiter) = limiter {
                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        tracing::warn!(client = %key, "Rate limit exceeded");

                        let retry_after = result.reset_after.as_secs().max(1);
                        let error = ErrorResponse::new(429, "Too Many Requests").with_detail(
                            format!("Rate limit exceeded. Try again in {} seconds.", retry_after),
                        );
                        let response = HttpResponse::TooManyRequests()
                            .insert_header(("Retry-After", retry_after.to_string()))
                            .json(error);

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
                }
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}
