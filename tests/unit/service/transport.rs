use super::*;

#[test]
fn urls_follow_service_endpoints() {
    let cfg = ServiceConfig {
        host: "10.0.0.5".to_string(),
        port: 9000,
        ..ServiceConfig::default()
    };
    let t = ComfyTransport::new(&cfg);
    assert_eq!(t.submit_url(), "http://10.0.0.5:9000/prompt");
    assert_eq!(t.stream_url("abc"), "ws://10.0.0.5:9000/ws?clientId=abc");
}

#[test]
fn unreachable_service_is_a_connection_error() {
    // Port 9 (discard) on loopback is expected to refuse connections.
    let cfg = ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 9,
        ..ServiceConfig::default()
    };
    let mut t = ComfyTransport::new(&cfg);
    assert!(matches!(
        t.connect("abc"),
        Err(ParallaxError::Connection { attempts: 1, .. })
    ));
}
