//! Upload admission checks
//!
//! Runs before any row is parsed. A file is accepted when it declares a CSV
//! content type or has a `.csv` name, and fits under the size limit.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Unsupported file type: {file_name:?} ({content_type:?}); only CSV files are accepted")]
    UnsupportedFileType {
        file_name: Option<String>,
        content_type: Option<String>,
    },

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct UploadGate {
    max_bytes: usize,
}

impl UploadGate {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Type check only; usable before the body has been read
    pub fn check_type(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<(), UploadRejection> {
        if is_csv(file_name, content_type) {
            Ok(())
        } else {
            Err(UploadRejection::UnsupportedFileType {
                file_name: file_name.map(str::to_string),
                content_type: content_type.map(str::to_string),
            })
        }
    }

    pub fn check_size(&self, size: usize) -> Result<(), UploadRejection> {
        if size > self.max_bytes {
            Err(UploadRejection::TooLarge {
                size,
                limit: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    pub fn check(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        size: usize,
    ) -> Result<(), UploadRejection> {
        self.check_type(file_name, content_type)?;
        self.check_size(size)
    }
}

impl Default for UploadGate {
    fn default() -> Self {
        Self::new(collab_common::config::DEFAULT_MAX_UPLOAD_BYTES)
    }
}

fn is_csv(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let type_is_csv = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("csv"))
        .unwrap_or(false);
    let name_is_csv = file_name
        .map(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .unwrap_or(false);
    type_is_csv || name_is_csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_csv_by_content_type_or_name() {
        let gate = UploadGate::default();
        assert!(gate.check_type(Some("data.csv"), Some("text/csv")).is_ok());
        assert!(gate.check_type(Some("data.CSV"), Some("application/octet-stream")).is_ok());
        assert!(gate.check_type(Some("export"), Some("application/vnd.ms-excel; x=csv")).is_ok());
        assert!(gate.check_type(Some("export.bin"), Some("text/CSV")).is_ok());
    }

    #[test]
    fn test_rejects_non_csv() {
        let gate = UploadGate::default();
        assert!(matches!(
            gate.check_type(Some("test.txt"), Some("text/plain")),
            Err(UploadRejection::UnsupportedFileType { .. })
        ));
        assert!(gate.check_type(None, None).is_err());
        assert!(gate.check_type(Some("archive.csv.zip"), Some("application/zip")).is_err());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let gate = UploadGate::new(10);
        assert!(gate.check_size(10).is_ok());
        assert_eq!(
            gate.check_size(11),
            Err(UploadRejection::TooLarge { size: 11, limit: 10 })
        );
    }

    #[test]
    fn test_default_limit_is_ten_mebibytes() {
        assert_eq!(UploadGate::default().max_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_type_checked_before_size() {
        let gate = UploadGate::new(1);
        assert!(matches!(
            gate.check(Some("big.txt"), Some("text/plain"), 100),
            Err(UploadRejection::UnsupportedFileType { .. })
        ));
    }
}
