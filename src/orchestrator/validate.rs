use crate::model::UploadRequest;
use thiserror::Error as ThisError;

/// Client-side rejections; none of these ever reach the network.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one file to upload")]
    NoFiles,

    #[error("Please select at least one output format (Excel or PPT)")]
    NoOutputFormat,

    #[error("Unsupported file type: {name} (expected .{expected})")]
    UnsupportedFileType { name: String, expected: String },
}

fn has_extension(name: &str, ext: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, e)) => e.eq_ignore_ascii_case(ext),
        None => false,
    }
}

/// Check an upload before submission. The whole batch fails on the first file
/// without `required_extension`, even when earlier files were fine.
pub fn validate_upload(req: &UploadRequest, required_extension: &str) -> Result<(), ValidationError> {
    if req.files.is_empty() {
        return Err(ValidationError::NoFiles);
    }
    if !req.generate_excel && !req.generate_ppt {
        return Err(ValidationError::NoOutputFormat);
    }
    if let Some(bad) = req
        .files
        .iter()
        .find(|f| !has_extension(&f.name, required_extension))
    {
        return Err(ValidationError::UnsupportedFileType {
            name: bad.name.clone(),
            expected: required_extension.to_string(),
        });
    }
    Ok(())
}
