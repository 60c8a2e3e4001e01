use lumo_derive::lumo_error;
use std::borrow::Cow;

#[lumo_error]
pub enum ArchiveError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Corrupt entry {key}{}: {source}", format_context(.context))]
    Corrupt { key: String, source: std::fmt::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open_archive() -> Result<(), ArchiveError> {
    Err(std::io::Error::other("disk gone")).context("Opening archive")
}

fn reopen() -> Result<(), ArchiveError> {
    open_archive().context("Retrying once")
}

fn main() {
    let err = open_archive().unwrap_err();
    assert!(err.to_string().contains("Opening archive"));
    assert!(reopen().unwrap_err().to_string().contains("Retrying once"));

    let from_io: ArchiveError = std::io::Error::other("eof").into();
    assert!(matches!(from_io, ArchiveError::Io { context: None, .. }));

    let internal: ArchiveError = String::from("fallback").into();
    assert!(matches!(internal, ArchiveError::Internal { .. }));
}
