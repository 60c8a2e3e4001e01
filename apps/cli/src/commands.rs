use crate::args::{Command, MediaKind, Variant};
use anyhow::{Context, Result, bail};
use chrono::{TimeZone, Utc};
use lumo::MediaLibrary;
use lumo::domain::Blob;
use lumo::kernel::safe_nanoid;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Executes one parsed command against `library`.
///
/// # Errors
///
/// Returns any storage, transform or file error, with the failing step as context.
pub async fn execute(library: &MediaLibrary, command: Command) -> Result<()> {
    match command {
        Command::Import { file, id, kind } => {
            let kind = resolve_kind(&file, kind)?;
            let id = id.unwrap_or_else(|| safe_nanoid!());
            let blob = read_blob(&file).await?;
            match kind {
                MediaKind::Photo => {
                    library.photos().create(&id, &blob).await?;
                },
                MediaKind::Video => {
                    library.videos().create(&id, &blob).await?;
                },
            }
            info!(%id, ?kind, "Imported {}", file.display());
            println!("{id}");
        },
        Command::Replace { id, file, kind } => {
            let kind = resolve_kind(&file, kind)?;
            let blob = read_blob(&file).await?;
            match kind {
                MediaKind::Photo => {
                    library.photos().update(&id, &blob).await?;
                },
                MediaKind::Video => {
                    library.videos().update(&id, &blob).await?;
                },
            }
            info!(%id, ?kind, "Replaced with {}", file.display());
        },
        Command::List { kind } => {
            if kind != Some(MediaKind::Video) {
                for id in library.photos().keys().await? {
                    println!("photo\t{id}");
                }
            }
            if kind != Some(MediaKind::Photo) {
                for id in library.videos().keys().await? {
                    println!("video\t{id}");
                }
            }
        },
        Command::Show { id, kind } => show(library, &id, kind).await?,
        Command::Export { id, dest, variant, kind } => {
            let blob = select(library, &id, kind, variant).await?;
            fs::write(&dest, blob.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            info!(%id, ?variant, bytes = blob.len(), "Exported to {}", dest.display());
        },
        Command::Delete { id, kind } => match kind {
            MediaKind::Photo => library.photos().delete(&id).await?,
            MediaKind::Video => library.videos().delete(&id).await?,
        },
        Command::Clear { kind, yes } => {
            if !yes {
                bail!("Refusing to clear without --yes");
            }
            if kind != Some(MediaKind::Video) {
                library.photos().clear().await?;
            }
            if kind != Some(MediaKind::Photo) {
                library.videos().clear().await?;
            }
        },
    }
    Ok(())
}

fn resolve_kind(file: &Path, kind: Option<MediaKind>) -> Result<MediaKind> {
    kind.or_else(|| MediaKind::detect(file)).with_context(|| {
        format!("Can't tell whether {} is a photo or a video; pass --kind", file.display())
    })
}

async fn read_blob(file: &Path) -> Result<Blob> {
    let bytes =
        fs::read(file).await.with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(Blob::from(bytes))
}

async fn select(
    library: &MediaLibrary,
    id: &str,
    kind: MediaKind,
    variant: Variant,
) -> Result<Blob> {
    let photos = library.photos();
    let videos = library.videos();
    let blob = match (kind, variant) {
        (MediaKind::Photo, Variant::Original) => photos.get(id).await?.map(|r| r.original),
        (MediaKind::Photo, Variant::Thumbnail) => photos.get(id).await?.map(|r| r.thumbnail),
        (MediaKind::Video, Variant::Original) => videos.get(id).await?.map(|r| r.original),
        (MediaKind::Video, Variant::Poster) => videos.get(id).await?.map(|r| r.poster),
        (kind, variant) => bail!("{kind:?} records have no {variant:?} variant"),
    };
    blob.with_context(|| format!("No {kind:?} with id '{id}'"))
}

async fn show(library: &MediaLibrary, id: &str, kind: MediaKind) -> Result<()> {
    match kind {
        MediaKind::Photo => {
            let record = library.photos().get(id).await?;
            let record = record.with_context(|| format!("No photo with id '{id}'"))?;
            println!("id:         {}", record.id);
            println!("original:   {} bytes", record.original.len());
            println!("thumbnail:  {} bytes", record.thumbnail.len());
            println!("created at: {}", timestamp(record.created_at));
            println!("updated at: {}", timestamp(record.updated_at));
        },
        MediaKind::Video => {
            let record = library.videos().get(id).await?;
            let record = record.with_context(|| format!("No video with id '{id}'"))?;
            println!("id:         {}", record.id);
            println!("original:   {} bytes", record.original.len());
            println!("poster:     {} bytes", record.poster.len());
            println!("duration:   {:.3}s", record.duration);
            println!("created at: {}", timestamp(record.created_at));
            println!("updated at: {}", timestamp(record.updated_at));
        },
    }
    Ok(())
}

fn timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms).single().map_or_else(|| ms.to_string(), |t| t.to_rfc3339())
}
