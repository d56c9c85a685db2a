//! Form body values and multipart part preparation.

use crate::error::Result;
use crate::transport::{MultipartPart, PartContents};
use std::path::{Path, PathBuf};

/// A file to upload, identified by where its content lives and the name the
/// client originally supplied for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    original_name: String,
}

impl FileHandle {
    /// Create a handle for `path` that uploads as `original_name`.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
        }
    }

    /// Create a handle whose original name is the last path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            original_name,
        }
    }

    /// Filesystem location of the content.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Client-supplied file name.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

/// Value of a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain text field.
    Text(String),
    /// File upload; forces a multipart body.
    File(FileHandle),
}

impl FormValue {
    /// Returns true for file uploads.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<FileHandle> for FormValue {
    fn from(value: FileHandle) -> Self {
        Self::File(value)
    }
}

/// Ordered form fields.
pub type FormData = Vec<(String, FormValue)>;

/// Text fields of a form for URL encoding. File values are left out; they
/// can only travel in a multipart body.
#[must_use]
pub fn url_encoded_fields(form: &[(String, FormValue)]) -> Vec<(String, String)> {
    form.iter()
        .filter_map(|(name, value)| match value {
            FormValue::Text(text) => Some((name.clone(), text.clone())),
            FormValue::File(_) => None,
        })
        .collect()
}

/// Convert form fields into multipart parts, opening every file for reading.
///
/// The returned parts own the open handles; dropping them closes the files.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if a file cannot be opened.
pub async fn open_multipart(form: &[(String, FormValue)]) -> Result<Vec<MultipartPart>> {
    let mut parts = Vec::with_capacity(form.len());
    for (name, value) in form {
        let part = match value {
            FormValue::Text(text) => MultipartPart {
                name: name.clone(),
                contents: PartContents::Text(text.clone()),
                filename: None,
            },
            FormValue::File(file) => {
                let handle = tokio::fs::File::open(file.path()).await?;
                MultipartPart {
                    name: name.clone(),
                    contents: PartContents::File(handle),
                    filename: Some(file.original_name().to_string()),
                }
            }
        };
        parts.push(part);
    }
    Ok(parts)
}
