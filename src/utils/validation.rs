use std::collections::HashSet;
use thiserror::Error;

/// Default extension allow-set: documents, images, archives, media.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    // Documents
    "txt", "pdf", "doc", "docx", "xls", "xlsx", // Images
    "png", "jpg", "jpeg", "gif", // Archives
    "zip", "rar", // Media
    "mp3", "mp4", "avi", "mov",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid filename: {0}")]
    InvalidName(String),

    #[error("file type not allowed: .{0}")]
    DisallowedType(String),
}

/// A proposed upload that passed validation: sanitized name plus the
/// lowercased extension it was matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub filename: String,
    pub extension: String,
}

/// Upload gate. The allow-set is fixed at construction; validation is a pure
/// decision function with no side effects.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_extensions: HashSet<String>,
}

impl UploadPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension.to_lowercase())
    }

    /// Validates a proposed upload name before any storage call is made.
    ///
    /// Checks, in order: the name must not encode path traversal, must be
    /// non-empty after sanitization, and its extension (final dot segment,
    /// case-insensitive) must be in the allow-set.
    pub fn validate(&self, raw_filename: &str) -> Result<UploadCandidate, ValidationError> {
        if raw_filename.contains("..")
            || raw_filename.contains('/')
            || raw_filename.contains('\\')
        {
            tracing::warn!("Path traversal attempt rejected: {}", raw_filename);
            return Err(ValidationError::InvalidName(
                "filename must not contain path segments".to_string(),
            ));
        }

        let filename = sanitize_filename(raw_filename);
        if filename.is_empty() {
            return Err(ValidationError::InvalidName(
                "filename is empty after sanitization".to_string(),
            ));
        }

        let extension = match filename.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => {
                return Err(ValidationError::DisallowedType(String::new()));
            }
        };

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::DisallowedType(extension));
        }

        Ok(UploadCandidate {
            filename,
            extension,
        })
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS.iter().copied())
    }
}

/// Maps control and filesystem-reserved characters to `_` and caps the
/// result at 255 bytes on a char boundary. Path separators are rejected
/// before this runs, so only character-level cleanup happens here.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}
