//! Caller-supplied collaborators invoked by the request pipeline.

use std::collections::BTreeMap;
use std::future::Future;

use crate::client::Verb;
use crate::error::HttpApiError;

/// Capability object injected into [`crate::client::HttpClient`].
///
/// `provide_headers` supplies the base headers for every request (typically
/// credentials); the pipeline suspends until it resolves, then merges in the
/// body content type and the options header. `on_request_failure` observes
/// every failure before it is re-raised to the caller; it is side-effect only
/// and cannot suppress the error.
pub trait RequestHooks {
    fn provide_headers(
        &self,
        url: &str,
        verb: Verb,
    ) -> impl Future<Output = BTreeMap<String, String>> + Send {
        let _ = (url, verb);
        async { BTreeMap::new() }
    }

    fn on_request_failure(&self, failure: &HttpApiError) -> impl Future<Output = ()> + Send {
        let _ = failure;
        async {}
    }
}

/// Default hooks: no extra headers, failures pass through silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl RequestHooks for NoopHooks {}
