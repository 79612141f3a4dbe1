//! Image signature sniffing
//!
//! Classifies a buffer by its leading magic bytes, independent of the
//! filename extension. 261 bytes are enough for every signature below.

/// Number of leading bytes read before classification
pub const SNIFF_LEN: usize = 261;

/// Image formats recognized by their signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Jpeg2000,
    Png,
    Gif,
    Webp,
    Bmp,
    Tiff,
    JpegXr,
    Psd,
    Ico,
    Heif,
    Avif,
    Dwg,
    Exr,
}

impl ImageKind {
    /// MIME type served for this format
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Jpeg2000 => "image/jp2",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::JpegXr => "image/vnd.ms-photo",
            Self::Psd => "image/vnd.adobe.photoshop",
            Self::Ico => "image/vnd.microsoft.icon",
            Self::Heif => "image/heif",
            Self::Avif => "image/avif",
            Self::Dwg => "image/vnd.dwg",
            Self::Exr => "image/x-exr",
        }
    }
}

/// Fixed-offset prefixes; checked in order
const PREFIXES: &[(&[u8], ImageKind)] = &[
    (&[0xFF, 0xD8, 0xFF], ImageKind::Jpeg),
    (
        &[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A],
        ImageKind::Jpeg2000,
    ),
    (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], ImageKind::Png),
    (b"GIF87a", ImageKind::Gif),
    (b"GIF89a", ImageKind::Gif),
    (b"BM", ImageKind::Bmp),
    // Also matches TIFF based raw formats such as CR2
    (&[b'I', b'I', 0x2A, 0x00], ImageKind::Tiff),
    (&[b'M', b'M', 0x00, 0x2A], ImageKind::Tiff),
    (&[b'I', b'I', 0xBC], ImageKind::JpegXr),
    (b"8BPS", ImageKind::Psd),
    (&[0x00, 0x00, 0x01, 0x00], ImageKind::Ico),
    (b"AC10", ImageKind::Dwg),
    (&[0x76, 0x2F, 0x31, 0x01], ImageKind::Exr),
];

const HEIF_BRANDS: &[&[u8]] = &[b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"];
const AVIF_BRANDS: &[&[u8]] = &[b"avif", b"avis"];

/// Detect the image format of `head`, if any.
///
/// `head` may be shorter than [`SNIFF_LEN`]; a signature that does not fit
/// simply does not match.
pub fn detect(head: &[u8]) -> Option<ImageKind> {
    if let Some(&(_, kind)) = PREFIXES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return Some(kind);
    }

    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return Some(ImageKind::Webp);
    }

    detect_iso_bmff(head)
}

/// HEIF and AVIF share the ISO base media `ftyp` box
fn detect_iso_bmff(head: &[u8]) -> Option<ImageKind> {
    if head.len() < 12 || &head[4..8] != b"ftyp" {
        return None;
    }
    let brand = &head[8..12];
    if AVIF_BRANDS.contains(&brand) {
        Some(ImageKind::Avif)
    } else if HEIF_BRANDS.contains(&brand) {
        Some(ImageKind::Heif)
    } else {
        None
    }
}

/// Whether `head` starts with a known image signature
pub fn classify(head: &[u8]) -> bool {
    detect(head).is_some()
}
