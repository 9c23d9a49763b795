//! crates/edusync_core/src/images.rs
//!
//! Image uploads are encoded as base64 data URLs and travel only inside
//! generation requests; nothing is stored.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::domain::MAX_IMAGES;
use crate::ports::{PortError, PortResult};

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub image_urls: Vec<String>,
    /// Names of files skipped because they were not images.
    pub skipped: Vec<String>,
}

pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

pub fn is_image_data_url(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("data:image/") else {
        return false;
    };
    match rest.split_once(";base64,") {
        Some((subtype, payload)) => {
            !subtype.is_empty() && !payload.is_empty() && STANDARD.decode(payload).is_ok()
        }
        None => false,
    }
}

/// Encodes a batch of uploads. The whole batch is refused when it would take
/// the learner past `MAX_IMAGES`; individual non-image files are skipped.
pub fn accept_uploads(already_held: usize, uploads: Vec<ImageUpload>) -> PortResult<UploadReport> {
    if already_held + uploads.len() > MAX_IMAGES {
        return Err(PortError::Validation(format!(
            "You can only upload a maximum of {} images.",
            MAX_IMAGES
        )));
    }
    let mut report = UploadReport::default();
    for upload in uploads {
        if upload.content_type.starts_with("image/") {
            report
                .image_urls
                .push(encode_data_url(&upload.content_type, &upload.bytes));
        } else {
            report.skipped.push(upload.file_name);
        }
    }
    Ok(report)
}
