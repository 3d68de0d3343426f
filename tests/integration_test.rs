use agui_render::config::Config;

fn config(stream_url: Option<&str>, api_key: Option<&str>) -> Config {
    Config {
        stream_url: stream_url.map(str::to_string),
        api_key: api_key.map(str::to_string),
        thinking_text: "Thinking...".to_string(),
        show_tool_args: true,
    }
}

#[test]
fn test_config_validation_requires_stream_url() {
    assert!(config(None, Some("key")).validate_for_streaming().is_err());
}

#[test]
fn test_config_validation_rejects_non_http_urls() {
    assert!(config(Some("ftp://ops.example.com/agui"), Some("key"))
        .validate_for_streaming()
        .is_err());
}

#[test]
fn test_config_validation_requires_api_key_for_remote_endpoints() {
    assert!(config(Some("https://ops.example.com/agui"), None)
        .validate_for_streaming()
        .is_err());
    assert!(config(Some("https://ops.example.com/agui"), Some("key"))
        .validate_for_streaming()
        .is_ok());
}

#[test]
fn test_config_validation_allows_local_endpoint_without_api_key() {
    assert!(config(Some("http://localhost:8000/agui"), None)
        .validate_for_streaming()
        .is_ok());
}
