//! Multipart extraction of the uploaded file

use hyper::body::Bytes;
use std::io::Cursor;

use super::UploadError;

/// Form field carrying the image
pub const FILE_FIELD: &str = "file";

/// File part pulled out of a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    file_name: String,
    declared_size: u64,
    content: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            file_name: file_name.into(),
            declared_size: content.len() as u64,
            content,
        }
    }

    /// Override the size the client claimed for this part
    #[cfg(test)]
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    /// Client supplied name, unsanitized
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub const fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    /// Open a reader over the buffered part
    pub fn open(&self) -> Cursor<&[u8]> {
        Cursor::new(self.content.as_ref())
    }
}

/// Pull the [`FILE_FIELD`] part out of `multipart`.
///
/// Other fields are skipped. Reading stops as soon as the part grows past
/// `max_size`, so an oversize body is never buffered in full.
pub async fn extract_file(
    multipart: &mut multer::Multipart<'_>,
    max_size: u64,
    too_large_message: &str,
) -> Result<UploadedFile, UploadError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            return Err(UploadError::Extraction(format!(
                "multipart field '{FILE_FIELD}' is not a file"
            )));
        };

        let mut content = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if (content.len() + chunk.len()) as u64 > max_size {
                return Err(UploadError::TooLarge(too_large_message.to_string()));
            }
            content.extend_from_slice(&chunk);
        }

        return Ok(UploadedFile::new(file_name, content));
    }

    Err(UploadError::Extraction(format!(
        "no such file: multipart field '{FILE_FIELD}' is missing"
    )))
}
