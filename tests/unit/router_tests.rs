// Route matching and request option extraction tests

use kagami::config::Config;
use kagami::image_processor::{CropAnchor, ImageDimensions};
use kagami::router::{self, Router};
use rstest::rstest;

const ROUTES: &str = r#"
sources:
  photos:
    type: filesystem
    directory: /srv/photos
processors:
  default:
routes:
  sized:
    pattern: ^/(?P<w>\d+)x(?P<h>\d+)/(?P<image_path>.+)$
    source: photos
    processor: default
  blurred:
    pattern: ^/blur/(?P<blur>[0-9.]+)?/?(?P<image_path>[^/]+)$
    source: photos
    processor: default
  catch_all:
    pattern: ^/(?P<image_path>.+)$
    source: photos
    processor: default
"#;

fn router() -> Router {
    let resolved = Config::from_yaml_with_env(ROUTES)
        .unwrap()
        .resolve()
        .unwrap();
    Router::new(resolved.routes)
}

// Test: routes are tried in configuration order
#[rstest]
#[case("/200x100/cat.jpg", "sized")]
#[case("/blur/0.5/cat.jpg", "blurred")]
#[case("/cat.jpg", "catch_all")]
#[case("/200x/cat.jpg", "catch_all")]
fn test_first_matching_route_wins(#[case] path: &str, #[case] expected: &str) {
    let router = router();
    assert_eq!(router.match_path(path).unwrap().name, expected);
}

// Test: size captured from the path becomes the requested dimensions
#[test]
fn test_path_captures_become_options() {
    let router = router();
    let route = router.match_path("/200x100/nested/cat.jpg").unwrap();
    let query = router::parse_query(Some("grayscale=true"));

    let request = router::resolve(route, "/200x100/nested/cat.jpg", &query).unwrap();
    assert_eq!(request.source_key, "nested/cat.jpg");
    assert_eq!(request.options.dimensions, ImageDimensions::new(200, 100));
    assert!(request.options.grayscale);
}

// Test: a path capture shadows the query parameter of the same name
#[test]
fn test_path_capture_shadows_query() {
    let router = router();
    let route = router.match_path("/200x100/cat.jpg").unwrap();
    let query = router::parse_query(Some("w=999&h=999"));

    let request = router::resolve(route, "/200x100/cat.jpg", &query).unwrap();
    assert_eq!(request.options.dimensions, ImageDimensions::new(200, 100));
}

// Test: an optional group that did not participate still shadows the query
#[test]
fn test_non_participating_group_shadows_query() {
    let router = router();
    let route = router.match_path("/blur/cat.jpg").unwrap();
    assert_eq!(route.name, "blurred");
    let query = router::parse_query(Some("blur=0.9"));

    let request = router::resolve(route, "/blur/cat.jpg", &query).unwrap();
    assert_eq!(request.options.blur, 0.0);
    assert_eq!(request.source_key, "cat.jpg");
}

// Test: query parameters fill in everything the path does not capture
#[test]
fn test_query_parameters() {
    let router = router();
    let route = router.match_path("/cat.jpg").unwrap();
    let query = router::parse_query(Some(
        "w=320&blur=0.25&grayscale=1&crop_x=0.5&crop_y=1",
    ));

    let request = router::resolve(route, "/cat.jpg", &query).unwrap();
    assert_eq!(request.options.dimensions, ImageDimensions::new(320, 0));
    assert_eq!(request.options.blur, 0.25);
    assert!(request.options.grayscale);
    assert_eq!(request.options.crop, CropAnchor::new(0.5, 1.0));
}

// Test: malformed numbers fall back to defaults; out-of-range crop is rejected
#[test]
fn test_parameter_parsing_edge_cases() {
    let router = router();
    let route = router.match_path("/cat.jpg").unwrap();

    let lenient = router::parse_query(Some("w=abc&h=-3&blur=-1&grayscale=yes"));
    let request = router::resolve(route, "/cat.jpg", &lenient).unwrap();
    assert_eq!(request.options.dimensions, ImageDimensions::new(0, 0));
    assert_eq!(request.options.blur, 0.0);
    assert!(!request.options.grayscale);

    let out_of_range = router::parse_query(Some("crop_x=2&crop_y=0.5"));
    assert!(router::resolve(route, "/cat.jpg", &out_of_range).is_err());
}

// Test: percent-encoded keys are decoded before matching
#[test]
fn test_decoded_path_matches() {
    let router = router();
    let path = router::decode("/my%20photos/cat%2B1.jpg");
    let route = router.match_path(&path).unwrap();
    let request = router::resolve(route, &path, &Default::default()).unwrap();
    assert_eq!(request.source_key, "my photos/cat+1.jpg");
}

// Test: a path no route matches is reported with the path
#[test]
fn test_no_route_matched() {
    let router = Router::default();
    let err = router.match_path("/cat.jpg").unwrap_err();
    assert_eq!(err.path, "/cat.jpg");
}
