use std::path::Path;

use tokio::fs;

use crate::error::{Error, Result};

pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];
pub const REPORT_EXTENSIONS: [&str; 1] = ["pdf"];

/// Lower-cased extension if allowed and the leading bytes agree with it.
pub fn checked_extension(filename: &str, data: &[u8], allowed: &[&str]) -> Result<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !allowed.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed (expected one of: {})",
            ext,
            allowed.join(", ")
        )));
    }
    if data.is_empty() {
        return Err(Error::BadRequest("Uploaded file is empty".into()));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    // docx is a zip container, legacy doc an OLE2 compound file.
    if ext == "docx" && !data.starts_with(b"PK\x03\x04") {
        return Err(Error::BadRequest("Invalid DOCX file content".into()));
    }
    if ext == "doc" && !data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
        return Err(Error::BadRequest("Invalid DOC file content".into()));
    }
    Ok(ext)
}

/// Writes the file under `<uploads_dir>/<folder>/` and returns its public `/uploads/...` path.
pub async fn save_upload(folder: &str, filename: &str, data: &[u8], allowed: &[&str]) -> Result<String> {
    let ext = checked_extension(filename, data, allowed)?;
    let root = &crate::config::get_config().uploads_dir;
    let dir = format!("{}/{}", root.trim_end_matches('/'), folder);
    fs::create_dir_all(&dir).await?;

    let stored = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    fs::write(format!("{}/{}", dir, stored), data).await.map_err(|e| {
        tracing::error!(error = %e, folder, "failed to write upload");
        Error::Internal(format!("Failed to save file: {}", e))
    })?;

    Ok(format!("/uploads/{}/{}", folder, stored))
}
