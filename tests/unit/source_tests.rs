// Image source tests (filesystem source against a temp directory)

use kagami::config::{Config, FileSystemSourceConfig};
use kagami::source::{FileSystemSource, ImageSource, SourceError, SourceRegistry};
use std::time::Duration;

fn source(dir: &std::path::Path, allow_subdirectories: bool) -> FileSystemSource {
    FileSystemSource::new(&FileSystemSourceConfig {
        name: "local".to_string(),
        directory: dir.to_path_buf(),
        allow_subdirectories,
        timeout: Duration::from_secs(5),
    })
}

// Test: files are read with a mime hint derived from the extension
#[tokio::test]
async fn test_reads_file_with_mime_hint() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cat.png"), b"png bytes").unwrap();

    let raw = source(dir.path(), false).fetch("/cat.png").await.unwrap();
    assert_eq!(raw.data.as_ref(), b"png bytes");
    assert_eq!(raw.mime_type_hint.as_deref(), Some("image/png"));
}

// Test: nested keys need allow_subdirectories
#[tokio::test]
async fn test_subdirectories_are_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested/cat.jpg"), b"jpeg bytes").unwrap();

    let flat = source(dir.path(), false);
    assert!(matches!(
        flat.fetch("nested/cat.jpg").await,
        Err(SourceError::Forbidden(_))
    ));

    let nested = source(dir.path(), true);
    assert!(nested.fetch("nested/cat.jpg").await.is_ok());
}

// Test: traversal out of the base directory is always forbidden
#[tokio::test]
async fn test_parent_traversal_is_forbidden() {
    let dir = tempfile::tempdir().unwrap();
    let err = source(dir.path(), true)
        .fetch("nested/../../etc/passwd")
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Forbidden(_)));
    assert!(err.is_client_error());
}

// Test: a missing file is NotFound
#[tokio::test]
async fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = source(dir.path(), false).fetch("gone.png").await.unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

// Test: the registry builds one source per resolved profile
#[test]
fn test_registry_from_resolved_config() {
    let yaml = r#"
sources:
  default:
    s3_region: eu-central-1
  photos:
    type: s3
    s3_bucket_name: photos
  local:
    type: filesystem
    directory: /srv/images
"#;
    let resolved = Config::from_yaml_with_env(yaml).unwrap().resolve().unwrap();
    let registry = SourceRegistry::from_config(&resolved.sources);

    assert_eq!(registry.len(), 2);
    assert!(registry.get("photos").is_some());
    assert!(registry.get("local").is_some());
    assert!(registry.get("default").is_none());
}
