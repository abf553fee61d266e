use simplenet::http::proxy::rewrite_url;

#[test]
fn test_without_proxy_url_is_unchanged() {
    assert_eq!(
        rewrite_url("http://test.com", None, false),
        "http://test.com"
    );
    assert_eq!(rewrite_url("http://test.com", None, true), "http://test.com");
}

#[test]
fn test_proxy_is_prepended() {
    assert_eq!(
        rewrite_url(
            "http://test.com",
            Some("https://api.domain.com/endpoint?url="),
            false
        ),
        "https://api.domain.com/endpoint?url=http://test.com"
    );
}

#[test]
fn test_proxy_with_encoding() {
    assert_eq!(
        rewrite_url(
            "http://test.com",
            Some("https://api.domain.com/endpoint?url="),
            true
        ),
        "https://api.domain.com/endpoint?url=http%3A%2F%2Ftest.com"
    );
}

#[test]
fn test_path_style_proxy_concatenates() {
    assert_eq!(
        rewrite_url(
            "http://domain.com/path/?query=some+value",
            Some("https://proxy.com/path/"),
            false
        ),
        "https://proxy.com/path/http://domain.com/path/?query=some+value"
    );
}

#[test]
fn test_full_component_encoding() {
    assert_eq!(
        rewrite_url(
            "http://domain.com/path/?query=some+value",
            Some("https://proxy.com/?url="),
            true
        ),
        "https://proxy.com/?url=http%3A%2F%2Fdomain.com%2Fpath%2F%3Fquery%3Dsome%2Bvalue"
    );
}
