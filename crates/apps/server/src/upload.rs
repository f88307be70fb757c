//! Upload validation and storage layout.
//!
//! The file type is decided from the leading bytes of the upload; the MIME
//! type sent by the client is never trusted.

use std::path::{Path, PathBuf};

use uuid::Uuid;

const MIB: usize = 1024 * 1024;

/// Request body cap for upload routes: the largest file plus multipart
/// framing.
pub const MAX_BODY_BYTES: usize = 51 * MIB;

/// Longest filename accepted by delete.
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Image,
    Audio,
}

/// Upload endpoint, one per asset role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Panorama,
    FloorPlan,
    Audio,
    Logo,
}

impl UploadKind {
    pub const ALL: [UploadKind; 4] = [
        UploadKind::Panorama,
        UploadKind::FloorPlan,
        UploadKind::Audio,
        UploadKind::Logo,
    ];

    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "panorama" => Some(Self::Panorama),
            "floorplan" => Some(Self::FloorPlan),
            "audio" => Some(Self::Audio),
            "logo" => Some(Self::Logo),
            _ => None,
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Self::Panorama => "panoramas",
            Self::FloorPlan => "floorplans",
            Self::Audio => "audio",
            Self::Logo => "logos",
        }
    }

    /// Response field repeating the URL under the asset's own name.
    pub fn url_field(self) -> &'static str {
        match self {
            Self::Panorama => "panoramaUrl",
            Self::FloorPlan => "imageUrl",
            Self::Audio => "audioUrl",
            Self::Logo => "logoUrl",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::Audio => Category::Audio,
            _ => Category::Image,
        }
    }

    pub fn max_bytes(self) -> usize {
        match self {
            Self::Panorama => 50 * MIB,
            Self::FloorPlan | Self::Logo => 10 * MIB,
            Self::Audio => 20 * MIB,
        }
    }
}

/// Storage directories a delete may address.
pub fn deletable_dir(segment: &str) -> Option<&'static str> {
    UploadKind::ALL
        .iter()
        .map(|k| k.dir())
        .find(|dir| *dir == segment)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    pub mime: &'static str,
    pub ext: &'static str,
    pub category: Category,
}

const fn image(mime: &'static str, ext: &'static str) -> Sniffed {
    Sniffed {
        mime,
        ext,
        category: Category::Image,
    }
}

const fn audio(mime: &'static str, ext: &'static str) -> Sniffed {
    Sniffed {
        mime,
        ext,
        category: Category::Audio,
    }
}

fn has_magic(bytes: &[u8], offset: usize, magic: &[u8]) -> bool {
    bytes.get(offset..offset + magic.len()) == Some(magic)
}

/// Identifies a supported file type from its magic bytes.
pub fn sniff(bytes: &[u8]) -> Option<Sniffed> {
    if has_magic(bytes, 0, &[0xFF, 0xD8, 0xFF]) {
        return Some(image("image/jpeg", "jpg"));
    }
    if has_magic(bytes, 0, b"\x89PNG\r\n\x1a\n") {
        return Some(image("image/png", "png"));
    }
    if has_magic(bytes, 0, b"GIF87a") || has_magic(bytes, 0, b"GIF89a") {
        return Some(image("image/gif", "gif"));
    }
    if has_magic(bytes, 0, b"RIFF") && has_magic(bytes, 8, b"WEBP") {
        return Some(image("image/webp", "webp"));
    }
    if has_magic(bytes, 0, b"RIFF") && has_magic(bytes, 8, b"WAVE") {
        return Some(audio("audio/wav", "wav"));
    }
    if has_magic(bytes, 0, b"OggS") {
        return Some(audio("audio/ogg", "ogg"));
    }
    if has_magic(bytes, 0, &[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(audio("audio/webm", "webm"));
    }
    if has_magic(bytes, 4, b"ftyp") {
        return Some(if has_magic(bytes, 8, b"M4A ") {
            audio("audio/x-m4a", "m4a")
        } else {
            audio("audio/mp4", "mp4")
        });
    }
    if has_magic(bytes, 0, b"ID3") {
        return Some(audio("audio/mpeg", "mp3"));
    }
    // Bare MPEG audio frame: 11 sync bits, then a non-reserved layer.
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 && bytes[1] & 0x06 != 0 {
        return Some(audio("audio/mpeg", "mp3"));
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooLarge { max_bytes: usize },
    UnsupportedType,
    WrongCategory { expected: Category },
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "No file uploaded".to_string(),
            Self::TooLarge { max_bytes } => {
                format!("File too large (max {} MB)", max_bytes / MIB)
            }
            Self::UnsupportedType => "Unsupported file type".to_string(),
            Self::WrongCategory {
                expected: Category::Image,
            } => "Only image files (JPEG, PNG, WebP, GIF) are allowed".to_string(),
            Self::WrongCategory {
                expected: Category::Audio,
            } => "Only audio files (MP3, WAV, OGG, WebM, M4A) are allowed".to_string(),
        }
    }
}

/// Checks an upload against the rules of `kind`.
pub fn validate(kind: UploadKind, bytes: &[u8]) -> Result<Sniffed, Rejection> {
    if bytes.is_empty() {
        return Err(Rejection::Empty);
    }
    if bytes.len() > kind.max_bytes() {
        return Err(Rejection::TooLarge {
            max_bytes: kind.max_bytes(),
        });
    }
    let sniffed = sniff(bytes).ok_or(Rejection::UnsupportedType)?;
    if sniffed.category != kind.category() {
        return Err(Rejection::WrongCategory {
            expected: kind.category(),
        });
    }
    Ok(sniffed)
}

/// Strips path separators, NUL, `..` and leading dots; caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", "");
    }
    let cleaned = cleaned.trim_start_matches('.');
    let truncated: String = cleaned.chars().take(MAX_FILENAME_LEN).collect();
    if truncated.is_empty() {
        "unnamed".to_string()
    } else {
        truncated
    }
}

/// Fresh storage name for an accepted upload.
pub fn stored_name(sniffed: &Sniffed) -> String {
    format!("{}.{}", Uuid::new_v4(), sniffed.ext)
}

/// Public URL of a stored file.
pub fn public_url(dir: &str, filename: &str) -> String {
    format!("/uploads/{dir}/{filename}")
}

pub fn storage_path(root: &Path, dir: &str, filename: &str) -> PathBuf {
    root.join(dir).join(filename)
}

/// Creates every upload subdirectory under `root`.
pub async fn ensure_dirs(root: &Path) -> std::io::Result<()> {
    for kind in UploadKind::ALL {
        tokio::fs::create_dir_all(root.join(kind.dir())).await?;
    }
    Ok(())
}
