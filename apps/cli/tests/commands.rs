use clap::Parser;
use lumo::MediaLibrary;
use lumo::domain::config::LibraryConfig;
use lumo_cli::{Cli, Command, MediaKind, Variant, execute};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use tempfile::TempDir;

fn library(root: &Path) -> MediaLibrary {
    let mut config = LibraryConfig::default();
    config.storage.data_dir = root.join("data");
    MediaLibrary::from_config(&config).unwrap()
}

fn png(path: &Path) {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
    img.save_with_format(path, ImageFormat::Png).unwrap();
}

#[test]
fn test_kind_detection() {
    assert_eq!(MediaKind::detect(Path::new("a/b.JPG")), Some(MediaKind::Photo));
    assert_eq!(MediaKind::detect(Path::new("clip.mp4")), Some(MediaKind::Video));
    assert_eq!(MediaKind::detect(Path::new("notes.txt")), None);
    assert_eq!(MediaKind::detect(Path::new("README")), None);
}

#[test]
fn test_argument_parsing() {
    let cli = Cli::try_parse_from(["lumo", "import", "cat.png", "--id", "cat"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Import { id: Some(ref id), kind: None, .. } if id == "cat"
    ));

    let argv = ["lumo", "-c", "x.toml", "export", "v1", "out.jpg", "-v", "poster", "-k", "video"];
    let cli = Cli::try_parse_from(argv).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
    assert!(matches!(
        cli.command,
        Command::Export { variant: Variant::Poster, kind: MediaKind::Video, .. }
    ));

    assert!(Cli::try_parse_from(["lumo", "clear", "--kind", "audio"]).is_err());
}

#[tokio::test]
async fn test_import_export_delete() {
    let temp = TempDir::new().unwrap();
    let library = library(temp.path());
    let source = temp.path().join("dot.png");
    png(&source);

    let import = Command::Import { file: source, id: Some("dot".to_owned()), kind: None };
    execute(&library, import).await.unwrap();
    assert_eq!(library.photos().keys().await.unwrap(), ["dot"]);

    let dest = temp.path().join("thumb.jpg");
    let export = Command::Export {
        id: "dot".to_owned(),
        dest: dest.clone(),
        variant: Variant::Thumbnail,
        kind: MediaKind::Photo,
    };
    execute(&library, export).await.unwrap();
    let stored = library.photos().get("dot").await.unwrap().unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), stored.thumbnail.as_bytes());

    let delete = Command::Delete { id: "dot".to_owned(), kind: MediaKind::Photo };
    execute(&library, delete).await.unwrap();
    assert!(library.photos().keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_requires_confirmation() {
    let temp = TempDir::new().unwrap();
    let library = library(temp.path());
    let source = temp.path().join("dot.png");
    png(&source);
    execute(&library, Command::Import { file: source, id: None, kind: None }).await.unwrap();

    let err = execute(&library, Command::Clear { kind: None, yes: false }).await.unwrap_err();
    assert!(err.to_string().contains("--yes"));
    assert_eq!(library.photos().keys().await.unwrap().len(), 1);

    execute(&library, Command::Clear { kind: None, yes: true }).await.unwrap();
    assert!(library.photos().keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_extension_needs_kind() {
    let temp = TempDir::new().unwrap();
    let library = library(temp.path());
    let source = temp.path().join("notes.txt");
    std::fs::write(&source, b"hello").unwrap();

    let err = execute(&library, Command::Import { file: source, id: None, kind: None })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--kind"));
}

#[tokio::test]
async fn test_poster_of_a_photo_is_rejected() {
    let temp = TempDir::new().unwrap();
    let library = library(temp.path());

    let export = Command::Export {
        id: "x".to_owned(),
        dest: temp.path().join("out"),
        variant: Variant::Poster,
        kind: MediaKind::Photo,
    };
    assert!(execute(&library, export).await.is_err());
}
