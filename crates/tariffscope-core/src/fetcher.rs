//! Resilient network fetcher.
//!
//! A [`FetchPlan`] is plain data: an ordered list of [`Route`]s and a single
//! time budget shared by every attempt. [`ResilientFetcher::fetch`] walks the
//! routes sequentially and stops at the first 2xx response, so a success never
//! causes extra load on relay endpoints. There is no backoff at this layer.
//!
//! ```rust,ignore
//! use tariffscope_core::{FetchPlan, HttpRequest, ReqwestHttpClient, ResilientFetcher, Route};
//!
//! let plan = FetchPlan::new(
//!     vec![Route::Direct, Route::relay("corsproxy", "https://corsproxy.io/?")?],
//!     Duration::from_secs(20),
//!     Duration::from_secs(8),
//! )?;
//! let fetcher = ResilientFetcher::new(Arc::new(ReqwestHttpClient::new()), plan);
//! match fetcher.fetch(HttpRequest::get("https://api.worldbank.org/v2/country")).await {
//!     Ok(success) => println!("served by {}", success.route),
//!     Err(failure) => println!("unavailable: {}", failure.summary()),
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::ValidationError;

const DIRECT_ROUTE_NAME: &str = "direct";

/// One way of reaching a target address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Request the target as given.
    Direct,
    /// Request `prefix + target` through a relay endpoint.
    Relay {
        name: String,
        prefix: String,
        #[serde(default = "default_encode_target")]
        encode_target: bool,
    },
}

fn default_encode_target() -> bool {
    true
}

impl Route {
    pub fn relay(name: impl Into<String>, prefix: impl Into<String>) -> Result<Self, ValidationError> {
        let route = Self::Relay {
            name: name.into(),
            prefix: prefix.into(),
            encode_target: true,
        };
        route.validate()?;
        Ok(route)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Direct => Ok(()),
            Self::Relay { name, prefix, .. } => {
                let prefix = prefix.trim();
                if prefix.starts_with("http://") || prefix.starts_with("https://") {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidRoutePrefix { name: name.clone() })
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Direct => DIRECT_ROUTE_NAME,
            Self::Relay { name, .. } => name,
        }
    }

    /// Address actually requested when `target` goes through this route.
    pub fn resolve(&self, target: &str) -> String {
        match self {
            Self::Direct => target.to_owned(),
            Self::Relay {
                prefix,
                encode_target,
                ..
            } => {
                if *encode_target {
                    format!("{}{}", prefix.trim(), urlencoding::encode(target))
                } else {
                    format!("{}{target}", prefix.trim())
                }
            }
        }
    }
}

/// Ordered routes plus the shared time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    routes: Vec<Route>,
    budget: Duration,
    attempt_timeout: Duration,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            routes: vec![Route::Direct],
            budget: Duration::from_secs(20),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl FetchPlan {
    pub fn new(
        routes: Vec<Route>,
        budget: Duration,
        attempt_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        if routes.is_empty() {
            return Err(ValidationError::EmptyRouteList);
        }
        for route in &routes {
            route.validate()?;
        }

        Ok(Self {
            routes,
            budget,
            attempt_timeout,
        })
    }

    pub fn direct(budget: Duration) -> Self {
        Self {
            budget,
            attempt_timeout: budget,
            ..Self::default()
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }
}

/// A route that was tried and did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAttempt {
    pub route: String,
    pub error: String,
    /// Upstream status when the route answered with a non-2xx response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub response: HttpResponse,
    pub route: String,
    /// Routes that failed before this one succeeded.
    pub attempts: Vec<FetchAttempt>,
    pub latency_ms: u64,
}

/// Every route failed or the budget ran out.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub attempts: Vec<FetchAttempt>,
    pub latency_ms: u64,
}

impl FetchFailure {
    /// True when some route reached the upstream and it answered 404.
    pub fn not_found(&self) -> bool {
        self.attempts.iter().any(|attempt| attempt.status == Some(404))
    }

    pub fn summary(&self) -> String {
        if self.attempts.is_empty() {
            return String::from("no route attempted");
        }

        self.attempts
            .iter()
            .map(|attempt| format!("{}: {}", attempt.route, attempt.error))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub type FetchResult = Result<FetchSuccess, FetchFailure>;

/// Walks a [`FetchPlan`] over an [`HttpClient`].
#[derive(Clone)]
pub struct ResilientFetcher {
    client: Arc<dyn HttpClient>,
    plan: Arc<FetchPlan>,
}

impl ResilientFetcher {
    pub fn new(client: Arc<dyn HttpClient>, plan: FetchPlan) -> Self {
        Self {
            client,
            plan: Arc::new(plan),
        }
    }

    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }

    pub async fn fetch(&self, request: HttpRequest) -> FetchResult {
        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.plan.routes.len());

        for route in &self.plan.routes {
            let remaining = self.plan.budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                attempts.push(FetchAttempt {
                    route: route.name().to_owned(),
                    error: String::from("fetch budget exhausted before attempt"),
                    status: None,
                });
                break;
            }

            let timeout = remaining.min(self.plan.attempt_timeout);
            let mut routed = request.clone().with_timeout(timeout);
            routed.url = route.resolve(&request.url);

            let (error, status) = match tokio::time::timeout(timeout, self.client.execute(routed)).await {
                Ok(Ok(response)) if response.is_success() => {
                    if !attempts.is_empty() {
                        debug!(
                            route = route.name(),
                            failed_attempts = attempts.len(),
                            "fallback route succeeded"
                        );
                    }
                    return Ok(FetchSuccess {
                        response,
                        route: route.name().to_owned(),
                        attempts,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Ok(Ok(response)) => (
                    format!("upstream returned status {}", response.status),
                    Some(response.status),
                ),
                Ok(Err(error)) => (error.message().to_owned(), None),
                Err(_) => (format!("timed out after {} ms", timeout.as_millis()), None),
            };

            debug!(route = route.name(), url = %request.url, %error, "fetch attempt failed");
            attempts.push(FetchAttempt {
                route: route.name().to_owned(),
                error,
                status,
            });
        }

        let failure = FetchFailure {
            attempts,
            latency_ms: elapsed_ms(started),
        };
        warn!(url = %request.url, attempts = %failure.summary(), "all fetch routes failed");
        Err(failure)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
