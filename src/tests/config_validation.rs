#[cfg(test)]
mod test {
    use std::io::Write;

    use crate::config::loader::load_config;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
vendor:
  base_url: "https://api.lock-vendor.example.com"
  client_id: "cid"
  client_secret: "csecret"
credentials:
  path: "/tmp/lockbridge-credentials.json"
settings:
  server:
    host: "127.0.0.1"
    port: "8080"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let file = write_config(VALID);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.settings.safety_margin_seconds, Some(300));
        assert_eq!(config.settings.fanout_concurrency, 8);
        assert_eq!(config.vendor.request_timeout_seconds, 10);
        assert!(!config.settings.metrics.is_enabled);
    }

    #[test]
    fn empty_client_secret_is_rejected() {
        let file = write_config(&VALID.replace("\"csecret\"", "\"\""));
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn inverted_retry_delays_are_rejected() {
        let yaml = format!(
            "{}  retry:\n    base_delay_ms: 5000\n    max_delay_ms: 100\n",
            VALID
        );
        let file = write_config(&yaml);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("base_delay_ms"));
    }

    #[test]
    fn zero_fanout_concurrency_is_rejected() {
        let yaml = format!("{}  fanout_concurrency: 0\n", VALID);
        let file = write_config(&yaml);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("fanout_concurrency"));
    }

    #[test]
    fn missing_vendor_section_is_rejected() {
        let file = write_config("settings:\n  server:\n    host: a\n    port: b\n");
        assert!(load_config(file.path()).is_err());
    }
}
