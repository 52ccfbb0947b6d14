// End-to-end tests: a real Pingora server backed by a filesystem source
//
// Run with: cargo test --test integration_tests -- --ignored

use image::{DynamicImage, GenericImageView, RgbImage};
use std::io::Cursor;
use std::net::TcpListener;
use std::time::Duration;
use tempfile::TempDir;

use kagami::config::Config;
use kagami::proxy::KagamiProxy;

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.path().join(name), buffer.into_inner()).unwrap();
}

/// Start a proxy serving `dir` under `/images/` and return its base URL.
fn start_proxy(dir: &TempDir) -> String {
    let port = free_port();
    let yaml = format!(
        r#"
server:
  address: 127.0.0.1
  port: {port}
sources:
  local:
    type: filesystem
    directory: {dir}
processors:
  default:
    maintain_aspect_ratio: true
    max_image_width: 500
routes:
  images:
    pattern: ^/images/(?P<image_path>[^/]+)$
    source: local
    processor: default
"#,
        port = port,
        dir = dir.path().display()
    );
    let config = Config::from_yaml_with_env(&yaml)
        .expect("Failed to parse config")
        .resolve()
        .expect("Failed to resolve config");

    std::thread::spawn(move || {
        let mut server =
            pingora_core::server::Server::new(None).expect("Failed to create Pingora server");
        server.bootstrap();

        let proxy = KagamiProxy::new(&config);
        let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
        proxy_service.add_tcp(&config.server.listen_addr());

        server.add_service(proxy_service);
        server.run_forever();
    });

    // Give server time to start up and bind to port
    std::thread::sleep(Duration::from_secs(2));
    format!("http://127.0.0.1:{}", port)
}

fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

#[test]
#[ignore] // Binds a local port - run with: cargo test --test integration_tests -- --ignored
fn test_serves_resized_image() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir, "wide.png", 1000, 400);
    let base = start_proxy(&dir);

    let response = client()
        .get(format!("{}/images/wide.png?w=250", base))
        .send()
        .expect("Failed to GET from proxy");

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.bytes().unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!(decoded.dimensions(), (250, 100));
}

#[test]
#[ignore] // Binds a local port - run with: cargo test --test integration_tests -- --ignored
fn test_max_width_applies_without_parameters() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir, "wide.png", 1000, 400);
    let base = start_proxy(&dir);

    let body = client()
        .get(format!("{}/images/wide.png", base))
        .send()
        .unwrap()
        .bytes()
        .unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!(decoded.dimensions(), (500, 200));
}

#[test]
#[ignore] // Binds a local port - run with: cargo test --test integration_tests -- --ignored
fn test_head_returns_headers_only() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir, "small.png", 40, 40);
    let base = start_proxy(&dir);

    let response = client()
        .head(format!("{}/images/small.png", base))
        .send()
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert!(response.bytes().unwrap().is_empty());
}

#[test]
#[ignore] // Binds a local port - run with: cargo test --test integration_tests -- --ignored
fn test_error_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_proxy(&dir);
    let client = client();

    let missing = client
        .get(format!("{}/images/missing.png", base))
        .send()
        .unwrap();
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.headers()["content-type"], "application/json");

    let unrouted = client.get(format!("{}/other/x.png", base)).send().unwrap();
    assert_eq!(unrouted.status(), 404);

    let bad_crop = client
        .get(format!("{}/images/x.png?crop_x=3&crop_y=0", base))
        .send()
        .unwrap();
    assert_eq!(bad_crop.status(), 400);

    let post = client
        .post(format!("{}/images/x.png", base))
        .send()
        .unwrap();
    assert_eq!(post.status(), 405);
}

#[test]
#[ignore] // Binds a local port - run with: cargo test --test integration_tests -- --ignored
fn test_health_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_proxy(&dir);
    let client = client();

    let health: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(health["status"], "healthy");

    let metrics = client
        .get(format!("{}/metrics", base))
        .send()
        .unwrap()
        .text()
        .unwrap();
    assert!(metrics.contains("http_requests_total"));
}
