//! The record envelope written to disk.
//!
//! ```text
//! [VERSION: u8][FLAGS: u8][PAYLOAD: postcard, LZ4 block when FLAGS & LZ4]
//! ```
//!
//! The flag travels with each file, so records stay readable after the database's
//! compression setting changes.

use crate::engine::Compression;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

const ENVELOPE_V1: u8 = 1;
const FLAG_LZ4: u8 = 0b0000_0001;
const HEADER_LEN: usize = 2;

/// A value that can be stored in a [`Collection`](crate::Collection).
///
/// The id returned by [`Record::id`] is the record's primary key; it must be non-empty and
/// at most [`MAX_KEY_BYTES`](crate::MAX_KEY_BYTES) long.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
}

pub(crate) fn encode<T: Serialize>(
    record: &T,
    compression: Compression,
) -> Result<Vec<u8>, Cow<'static, str>> {
    let payload = postcard::to_allocvec(record)
        .map_err(|e| Cow::Owned(format!("Record serialization failed: {e}")))?;

    let (flags, body) = match compression {
        Compression::None => (0, payload),
        Compression::Lz4 => (FLAG_LZ4, lz4_flex::compress_prepend_size(&payload)),
    };

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.push(ENVELOPE_V1);
    out.push(flags);
    out.extend_from_slice(&body);
    Ok(out)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Cow<'static, str>> {
    let Some((&[version, flags], body)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(Cow::Borrowed("Record envelope is truncated"));
    };

    if version != ENVELOPE_V1 {
        return Err(Cow::Owned(format!("Unsupported record envelope version {version}")));
    }

    let payload = if flags & FLAG_LZ4 != 0 {
        Cow::Owned(
            lz4_flex::decompress_size_prepended(body)
                .map_err(|e| Cow::Owned(format!("LZ4 decompression failed: {e}")))?,
        )
    } else {
        Cow::Borrowed(body)
    };

    postcard::from_bytes(&payload)
        .map_err(|e| Cow::Owned(format!("Record deserialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: Vec<u8>,
    }

    fn note() -> Note {
        Note { id: "n-1".into(), body: vec![7; 2048] }
    }

    #[test]
    fn compressed_envelope_is_flagged_and_smaller() {
        let plain = encode(&note(), Compression::None).unwrap();
        let packed = encode(&note(), Compression::Lz4).unwrap();

        assert_eq!(plain[..2], [ENVELOPE_V1, 0]);
        assert_eq!(packed[..2], [ENVELOPE_V1, FLAG_LZ4]);
        assert!(packed.len() < plain.len());

        assert_eq!(decode::<Note>(&plain).unwrap(), note());
        assert_eq!(decode::<Note>(&packed).unwrap(), note());
    }

    #[test]
    fn rejects_truncated_and_unknown_envelopes() {
        assert!(decode::<Note>(&[]).unwrap_err().contains("truncated"));
        assert!(decode::<Note>(&[ENVELOPE_V1]).unwrap_err().contains("truncated"));
        assert!(decode::<Note>(&[9, 0, 1, 2]).unwrap_err().contains("version 9"));
        assert!(decode::<Note>(&[ENVELOPE_V1, FLAG_LZ4, 0xff]).unwrap_err().contains("LZ4"));
    }
}
