use std::borrow::Cow;

/// A specialized [`TransformError`] enum of this crate.
#[lumo_derive::lumo_error]
pub enum TransformError {
    #[error("Image decode failed{}: {source}", format_context(.context))]
    Decode { source: image::ImageError, context: Option<Cow<'static, str>> },

    #[error("Image encode failed{}: {message}", format_context(.context))]
    Encode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Video probe failed{}: {message}", format_context(.context))]
    Probe { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Video seek failed{}: {message}", format_context(.context))]
    Seek { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid video duration{}: {duration}", format_context(.context))]
    InvalidDuration { duration: f64, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl TransformError {
    pub(crate) fn worker(err: &tokio::task::JoinError) -> Self {
        Self::Internal { message: err.to_string().into(), context: Some("Transform worker failed".into()) }
    }
}
