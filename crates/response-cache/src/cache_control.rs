use http::{header::CACHE_CONTROL, HeaderValue};

use crate::{CachePolicy, CacheScope, ResolvedCachePolicy, Response, ResponseBody};

/// `max-age=<seconds>, public` or `max-age=<seconds>, private`
pub fn cache_control_header_value(policy: &ResolvedCachePolicy) -> HeaderValue {
    let scope = match policy.scope {
        CacheScope::Public => "public",
        CacheScope::Private => "private",
    };
    let value = format!("max-age={}, {scope}", policy.max_age.as_secs());

    HeaderValue::try_from(value).unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

/// Sets the `Cache-Control` header of a successful single response from its overall policy.
/// Uncacheable responses, responses with errors, incremental responses and responses that already
/// carry a `Cache-Control` header are left untouched.
pub fn write_cache_control_header(policy: &CachePolicy, response: &mut Response) {
    let ResponseBody::Single(result) = &response.body else {
        return;
    };
    if !result.errors.is_empty() || response.headers.contains_key(CACHE_CONTROL) {
        return;
    }
    let Some(policy) = policy.policy_if_cacheable() else {
        return;
    };

    response
        .headers
        .insert(CACHE_CONTROL, cache_control_header_value(&policy));
}
