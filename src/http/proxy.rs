use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// The set escaped by ECMAScript's `encodeURIComponent`: everything but
/// alphanumerics and `- _ . ! ~ * ' ( )`. Proxy endpoints that take the
/// target URL as a query parameter expect exactly this encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Rewrite a request URL for routing through a proxy endpoint.
///
/// With no proxy configured the URL is returned unchanged. Otherwise the
/// result is the proxy prefix concatenated with the URL, percent-encoded
/// when `encode` is set. This is plain string concatenation, not
/// URL-aware composition: a prefix of `https://proxy.com/?url=` combined
/// with `encode` produces a single query-parameter value.
pub fn rewrite_url(url: &str, proxy: Option<&str>, encode: bool) -> String {
    let proxy = match proxy {
        Some(p) if !p.is_empty() => p,
        _ => return url.to_string(),
    };
    if encode {
        format!("{}{}", proxy, utf8_percent_encode(url, URI_COMPONENT))
    } else {
        format!("{}{}", proxy, url)
    }
}
