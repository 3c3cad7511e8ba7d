// src/handlers/files.rs
use bytes::BufMut;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{error, info, warn};
use rand::Rng;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use warp::multipart::{FormData, Part};
use warp::{Rejection, Reply};

use crate::config::AppConfig;
use crate::handlers::error::{reject, ApiError};
use crate::models::{FileType, StoredFile};
use crate::services::db::{record_id, DocumentStore};

pub const MAX_FILES_PER_UPLOAD: usize = 5;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
const PDF_TYPE: &str = "application/pdf";

fn classify(mime: &str) -> Option<FileType> {
    if ALLOWED_IMAGE_TYPES.contains(&mime) {
        Some(FileType::Image)
    } else if mime == PDF_TYPE {
        Some(FileType::Pdf)
    } else {
        None
    }
}

fn generated_name(original: &str, file_type: FileType) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| {
            match file_type {
                FileType::Image => ".img",
                FileType::Pdf => ".pdf",
            }
            .to_string()
        });
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, ext)
}

/// Drain a multipart form into stored files on disk.
///
/// Accepts up to [`MAX_FILES_PER_UPLOAD`] parts named `files` (JPEG, PNG,
/// GIF, or PDF; at most [`MAX_FILE_BYTES`] each) plus an optional
/// `documentType` text part tagging the batch. Used by both the general
/// upload endpoint and loan document intake.
pub(crate) async fn collect_uploads(
    form: FormData,
    cfg: &AppConfig,
) -> Result<Vec<StoredFile>, Rejection> {
    let parts: Vec<Part> = form.try_collect().await.map_err(|e| {
        error!("Malformed multipart request: {}", e);
        reject(ApiError::validation("Malformed multipart request"))
    })?;

    // Buffer every part first; `documentType` may arrive after the files
    // it tags.
    let mut document_type: Option<String> = None;
    let mut raw_files: Vec<(String, String, Vec<u8>)> = Vec::new();

    for part in parts {
        let name = part.name().to_string();
        let filename = part.filename().unwrap_or("upload").to_string();
        let mime = part.content_type().unwrap_or("").to_string();

        let data = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| {
                acc.put(buf);
                async move { Ok(acc) }
            })
            .await
            .map_err(|e| {
                error!("Failed reading multipart body: {}", e);
                reject(ApiError::validation("Malformed multipart request"))
            })?;

        match name.as_str() {
            "files" => raw_files.push((filename, mime, data)),
            "documentType" => {
                document_type = Some(String::from_utf8_lossy(&data).trim().to_string());
            }
            other => warn!("Ignoring unexpected multipart field '{}'", other),
        }
    }

    if raw_files.len() > MAX_FILES_PER_UPLOAD {
        return Err(reject(ApiError::validation(format!(
            "At most {} files per upload",
            MAX_FILES_PER_UPLOAD
        ))));
    }

    let mut stored = Vec::with_capacity(raw_files.len());
    for (original_name, mime, data) in raw_files {
        let Some(file_type) = classify(&mime) else {
            return Err(reject(ApiError::validation(
                "Invalid file type. Only images (JPEG, PNG, GIF) and PDFs are allowed.",
            )));
        };
        if data.len() > MAX_FILE_BYTES {
            return Err(reject(ApiError::validation(format!(
                "File '{}' exceeds the 10MB limit",
                original_name
            ))));
        }

        let subdir = match file_type {
            FileType::Image => "images",
            FileType::Pdf => "pdfs",
        };
        let dir = cfg.upload_dir.join(subdir);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!("Failed to create upload directory: {}", e);
            reject(ApiError::internal("File upload failed"))
        })?;

        let filename = generated_name(&original_name, file_type);
        let path = dir.join(&filename);
        let size = data.len() as u64;
        tokio::fs::write(&path, data).await.map_err(|e| {
            error!("Failed to write uploaded file: {}", e);
            reject(ApiError::internal("File upload failed"))
        })?;

        stored.push(StoredFile {
            id: record_id(),
            url: format!("{}/uploads/{}/{}", cfg.base_url, subdir, filename),
            filename,
            original_name,
            file_type,
            document_type: document_type.clone(),
            mime_type: mime,
            path: path.to_string_lossy().into_owned(),
            size,
            uploaded_at: Utc::now(),
        });
    }

    Ok(stored)
}

pub async fn upload_files(
    user_id: String,
    form: FormData,
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
) -> Result<impl Reply, Rejection> {
    info!("Handling file upload for user {}", user_id);

    let files = collect_uploads(form, &cfg).await?;
    if files.is_empty() {
        return Err(reject(ApiError::validation("No files uploaded")));
    }
    let count = files.len();

    db.push_files(&user_id, files.clone()).await.map_err(|e| {
        error!("Upload error: {}", e);
        reject(ApiError::database_error("File upload failed"))
    })?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": format!("Successfully uploaded {} file(s)", count),
        "files": files,
    })))
}

pub async fn list_files(user_id: String, db: Arc<DocumentStore>) -> Result<impl Reply, Rejection> {
    let set = db
        .get_file_set(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("No files found for this user")))?;

    let data: Vec<_> = set
        .files
        .iter()
        .map(|f| {
            json!({
                "originalName": f.original_name,
                "url": f.url,
            })
        })
        .collect();

    Ok(warp::reply::json(&json!({
        "success": true,
        "data": data,
    })))
}

pub async fn files_by_type(
    file_type: String,
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    let wanted = match file_type.as_str() {
        "image" => FileType::Image,
        "pdf" => FileType::Pdf,
        _ => {
            return Err(reject(ApiError::validation(
                "Invalid file type. Must be 'image' or 'pdf'",
            )))
        }
    };

    let set = db
        .get_file_set(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("No files found for this user")))?;

    let data: Vec<_> = set
        .files
        .into_iter()
        .filter(|f| f.file_type == wanted)
        .collect();

    Ok(warp::reply::json(&json!({
        "success": true,
        "data": data,
    })))
}

pub async fn files_by_document_type(
    document_type: String,
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    let set = db
        .get_file_set(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("No files found for this user")))?;

    let data: Vec<_> = set
        .files
        .into_iter()
        .filter(|f| f.document_type.as_deref() == Some(document_type.as_str()))
        .collect();

    Ok(warp::reply::json(&json!({
        "success": true,
        "data": data,
    })))
}

pub async fn delete_file(
    file_id: String,
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Deleting file {} for user {}", file_id, user_id);

    if db
        .get_file_set(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .is_none()
    {
        return Err(reject(ApiError::not_found("No files found for this user")));
    }

    let removed = db
        .remove_file(&user_id, &file_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("File not found")))?;

    if let Err(e) = tokio::fs::remove_file(&removed.path).await {
        warn!("Error deleting file from disk: {}", e);
    }

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": "File deleted successfully",
    })))
}
