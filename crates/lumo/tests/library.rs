use lumo::MediaLibrary;
use lumo::domain::Blob;
use lumo::domain::config::{CompressionKind, LibraryConfig};
use tempfile::TempDir;

fn config(root: &TempDir) -> LibraryConfig {
    let mut config = LibraryConfig::default();
    config.storage.data_dir = root.path().to_path_buf();
    config.storage.compression = CompressionKind::Lz4;
    config
}

#[tokio::test]
async fn test_library_opens_from_config() {
    let temp = TempDir::new().unwrap();
    let library = MediaLibrary::from_config(&config(&temp)).unwrap();

    library.open().await.unwrap();

    assert!(temp.path().join("media-db").is_dir());
    assert_eq!(library.photos().collection().name(), "images");
    assert_eq!(library.videos().collection().name(), "videos");
    assert!(library.photos().keys().await.unwrap().is_empty());
    assert!(library.videos().keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stores_share_the_library_handle_table() {
    let temp = TempDir::new().unwrap();
    let library = MediaLibrary::from_config(&config(&temp)).unwrap();
    let lease = library.handles().mint(Blob::from(vec![1, 2, 3]));

    assert_eq!(library.photos().handles().outstanding(), 1);
    assert_eq!(library.videos().handles().resolve(&lease), Some(Blob::from(vec![1, 2, 3])));
}

#[test]
fn test_invalid_names_are_rejected() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp);
    config.storage.photo_collection = "../images".to_owned();

    assert!(MediaLibrary::from_config(&config).is_err());
}
