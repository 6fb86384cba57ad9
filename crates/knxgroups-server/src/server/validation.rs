use std::fmt;
use std::io::Cursor;

pub struct FileValidator {
    max_size_bytes: usize,
    max_uncompressed_size_bytes: u64,
}

impl FileValidator {
    pub fn new(max_size_bytes: usize, max_uncompressed_size_bytes: usize) -> Self {
        Self {
            max_size_bytes,
            max_uncompressed_size_bytes: max_uncompressed_size_bytes as u64,
        }
    }

    pub fn validate_upload(&self, filename: &str, data: &[u8]) -> Result<(), ValidationError> {
        if data.len() > self.max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size: data.len(),
                max: self.max_size_bytes,
            });
        }

        match upload_kind(filename) {
            Some(UploadKind::Archive) => self.validate_archive(data),
            Some(UploadKind::Xml) => validate_xml(data),
            None => Err(ValidationError::InvalidFileFormat {
                expected: "*.xml, *.knxproj or *.zip",
                got: filename.to_string(),
            }),
        }
    }

    fn validate_archive(&self, data: &[u8]) -> Result<(), ValidationError> {
        if !is_zip_signature(data) {
            return Err(ValidationError::InvalidArchive);
        }

        let uncompressed_size = estimate_uncompressed_size(data)?;
        if uncompressed_size > self.max_uncompressed_size_bytes {
            return Err(ValidationError::UncompressedTooLarge {
                size: uncompressed_size,
                max: self.max_uncompressed_size_bytes,
            });
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ValidationError {
    FileTooLarge { size: usize, max: usize },
    InvalidFileFormat { expected: &'static str, got: String },
    InvalidArchive,
    InvalidXml,
    UncompressedTooLarge { size: u64, max: u64 },
    ArchiveError(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FileTooLarge { size, max } => {
                write!(f, "File too large ({} bytes, max {} bytes)", size, max)
            }
            ValidationError::InvalidFileFormat { expected, got } => {
                write!(f, "Invalid file format (expected {}, got {})", expected, got)
            }
            ValidationError::InvalidArchive => write!(f, "Invalid or corrupted ZIP archive"),
            ValidationError::InvalidXml => write!(f, "File does not look like an XML document"),
            ValidationError::UncompressedTooLarge { size, max } => {
                write!(f, "Uncompressed data too large ({} bytes, max {} bytes)", size, max)
            }
            ValidationError::ArchiveError(message) => write!(f, "Archive error: {}", message),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Archive,
    Xml,
}

fn upload_kind(filename: &str) -> Option<UploadKind> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".knxproj") || lower.ends_with(".zip") {
        Some(UploadKind::Archive)
    } else if lower.ends_with(".xml") {
        Some(UploadKind::Xml)
    } else {
        None
    }
}

fn validate_xml(data: &[u8]) -> Result<(), ValidationError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match data.iter().find(|byte| !byte.is_ascii_whitespace()) {
        Some(b'<') => Ok(()),
        _ => Err(ValidationError::InvalidXml),
    }
}

fn is_zip_signature(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    matches!(
        &data[0..4],
        b"PK\x03\x04" | b"PK\x05\x06" | b"PK\x07\x08"
    )
}

fn estimate_uncompressed_size(data: &[u8]) -> Result<u64, ValidationError> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| ValidationError::ArchiveError(e.to_string()))?;
    let mut total: u64 = 0;
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| ValidationError::ArchiveError(e.to_string()))?;
        total = total.saturating_add(file.size());
    }
    Ok(total)
}
