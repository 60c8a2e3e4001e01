mod common;

use common::{FakeDecoder, database, jpeg};
use lumo_domain::Blob;
use lumo_gallery::{HandleTable, PhotoStore, VideoStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_handles_resolve_until_the_lease_drops() {
    let temp = TempDir::new().unwrap();
    let photos = PhotoStore::from_database(&database(temp.path())).unwrap();
    let created = photos.create("p1", &jpeg(640, 480)).await.unwrap();

    let display = photos.display_handle("p1").await.unwrap().unwrap();
    let thumb = photos.thumbnail_handle("p1").await.unwrap().unwrap();
    let table = photos.handles();

    assert_eq!(table.resolve(&display).as_deref(), Some(created.original.as_bytes()));
    assert_eq!(table.resolve_url(&thumb.url()).as_deref(), Some(created.thumbnail.as_bytes()));
    assert_eq!(table.outstanding(), 2);

    let url = display.url();
    drop(display);
    assert!(table.resolve_url(&url).is_none());

    thumb.release();
    assert_eq!(table.outstanding(), 0);
}

#[tokio::test]
async fn test_each_request_mints_a_distinct_handle() {
    let temp = TempDir::new().unwrap();
    let photos = PhotoStore::from_database(&database(temp.path())).unwrap();
    photos.create("p1", &jpeg(64, 64)).await.unwrap();

    let first = photos.display_handle("p1").await.unwrap().unwrap();
    let second = photos.display_handle("p1").await.unwrap().unwrap();

    assert_ne!(first.handle(), second.handle());
    assert_eq!(first.blob(), second.blob());
    assert_eq!(photos.handles().outstanding(), 2);
}

#[tokio::test]
async fn test_unknown_ids_mint_nothing() {
    let temp = TempDir::new().unwrap();
    let photos = PhotoStore::from_database(&database(temp.path())).unwrap();

    assert!(photos.display_handle("ghost").await.unwrap().is_none());
    assert!(photos.thumbnail_handle("ghost").await.unwrap().is_none());
    assert_eq!(photos.handles().outstanding(), 0);
}

#[tokio::test]
async fn test_stores_can_share_one_table() {
    let temp = TempDir::new().unwrap();
    let db = database(temp.path());
    let table = HandleTable::new();
    let photos = PhotoStore::from_database(&db).unwrap().with_handles(table.clone());
    let decoder = FakeDecoder { width: 64, height: 48, duration: 3.0 };
    let videos = VideoStore::with_decoder(&db, decoder).unwrap().with_handles(table.clone());

    photos.create("p1", &jpeg(64, 64)).await.unwrap();
    videos.create("v1", &Blob::from(vec![7u8; 128])).await.unwrap();

    let _photo = photos.display_handle("p1").await.unwrap().unwrap();
    let _poster = videos.poster_handle("v1").await.unwrap().unwrap();
    assert_eq!(table.outstanding(), 2);
}

#[test]
fn test_detached_handles_stay_live_until_revoked() {
    let table = HandleTable::new();
    let handle = table.mint(Blob::from(vec![1, 2, 3])).detach();

    assert_eq!(table.resolve(&handle).as_deref(), Some(&[1u8, 2, 3][..]));
    assert!(table.revoke(&handle));
    assert!(!table.revoke(&handle));
    assert!(table.resolve(&handle).is_none());
}
