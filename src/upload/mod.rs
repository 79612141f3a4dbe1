//! Image upload core
//!
//! Validates an extracted upload (size, then image signature) and writes it
//! into the date-partitioned store. HTTP concerns live in
//! `handler::upload`; everything here can be driven without a server.

mod error;
pub mod extract;
pub mod sniff;
pub mod storage;

pub use error::UploadError;
pub use extract::{extract_file, UploadedFile};
pub use storage::{sanitize_file_name, ImageStore, StoredImage};

use chrono::NaiveDate;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::UploadConfig;

/// Validate `upload` and persist it under `today`.
///
/// Steps, each terminal on failure:
/// 1. declared size against `max_file_size`
/// 2. sniff the first [`sniff::SNIFF_LEN`] bytes for an image signature
/// 3. reduce the file name to a safe final component
/// 4. write the full content to the store
pub async fn process_upload(
    upload: &UploadedFile,
    settings: &UploadConfig,
    store: &ImageStore,
    today: NaiveDate,
) -> Result<StoredImage, UploadError> {
    if upload.declared_size() > settings.max_file_size {
        return Err(UploadError::TooLarge(settings.messages.too_large.clone()));
    }

    // Reader is released at the end of this block on every path
    let head = {
        let mut reader = upload.open();
        read_head(&mut reader).await.map_err(UploadError::Read)?
    };

    if !sniff::classify(&head) {
        return Err(UploadError::NotImage(settings.messages.not_image.clone()));
    }

    let name = sanitize_file_name(upload.file_name())?;
    store.save(today, &name, upload.content()).await
}

/// Read up to [`sniff::SNIFF_LEN`] bytes; a short read is not an error
async fn read_head<R>(reader: &mut R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut head = vec![0u8; sniff::SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        let n = reader.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    Ok(head)
}
