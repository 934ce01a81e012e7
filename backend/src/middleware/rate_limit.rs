//! Per-client request quota enforced with a keyed `governor` limiter.
//!
//! Clients are keyed by peer IP. A request over quota short-circuits with a
//! `429` error envelope and a `Retry-After` header in whole seconds. Paths
//! under an exempt prefix (health checks) bypass the limiter.
//!
//! The quota is a GCRA bucket rather than a fixed window: a client may burst
//! the full `requests` at once, then earns one request back every
//! `window / requests`. Keys whose bucket has fully refilled are pruned every
//! [`PRUNE_EVERY`] metered requests so idle clients do not accumulate.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::RETRY_AFTER;
use actix_web::{Error, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use crate::domain::Error as ApiError;

/// Metered requests between sweeps of idle client keys.
pub const PRUNE_EVERY: u64 = 1024;

/// Errors raised when a quota cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RateLimitError {
    #[error("rate limit must allow at least one request per window")]
    ZeroRequests,
    #[error("rate limit window must be longer than zero")]
    ZeroWindow,
}

/// Rate-limiting middleware factory.
///
/// The limiter state is shared by every worker cloned from the factory.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use actix_web::App;
/// use storefront::middleware::RateLimit;
///
/// let limit = RateLimit::new(10, Duration::from_secs(60)).expect("valid quota");
/// let _app = App::new().wrap(limit);
/// ```
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    metered: Arc<AtomicU64>,
    prune_every: u64,
    exempt: Vec<&'static str>,
}

impl RateLimit {
    /// Allow `requests` per `window` for each client, replenished evenly.
    pub fn new(requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(requests).ok_or(RateLimitError::ZeroRequests)?;
        let quota = Quota::with_period(window / requests)
            .ok_or(RateLimitError::ZeroWindow)?
            .allow_burst(burst);
        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            metered: Arc::new(AtomicU64::new(0)),
            prune_every: PRUNE_EVERY,
            exempt: Vec::new(),
        })
    }

    /// Let requests whose path starts with `prefix` through unmetered.
    #[must_use]
    pub fn exempt(mut self, prefix: &'static str) -> Self {
        self.exempt.push(prefix);
        self
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Drop keys whose bucket is full again once every `prune_every` calls.
    fn prune_idle(&self) {
        let seen = self.metered.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % self.prune_every == 0 {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
            debug!(tracked = self.limiter.len(), "pruned idle rate limit keys");
        }
    }

    /// Seconds until `client` may retry, or `None` when allowed now.
    fn check(&self, client: IpAddr) -> Option<u64> {
        self.prune_idle();
        self.limiter.check_key(&client).err().map(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.as_secs() + u64::from(wait.subsec_nanos() > 0)
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`RateLimit`].
pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |addr| addr.ip())
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = client_ip(&req);
        let metered = !self.limit.is_exempt(req.path());
        if let Some(retry_after) = metered.then(|| self.limit.check(client)).flatten() {
            warn!(%client, retry_after, "rate limit exceeded");
            // Built when polled so the error picks up the request's trace id.
            return Box::pin(async move {
                let error =
                    ApiError::too_many_requests("Too many requests, please try again later");
                let mut response = error.error_response();
                if let Ok(value) = retry_after.to_string().parse() {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                let (req, _) = req.into_parts();
                Ok(ServiceResponse::new(req, response).map_into_right_body())
            });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
