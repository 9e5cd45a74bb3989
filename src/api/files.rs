use std::path::{Component, Path as FsPath, PathBuf};

use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Path;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;

use crate::database::AppState;
use crate::env;
use crate::error::{ServiceError, ServiceResult};
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/files/*path", get_with(get_file, get_file_docs))
        .with_state(app_state)
}

fn mimetype_for(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Relative paths only, no parent traversal.
fn sanitize(path: &str) -> Option<PathBuf> {
    let path = FsPath::new(path);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            _ => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        return None;
    }
    Some(clean)
}

async fn get_file(
    mut state: RequestState,
    Path(path): Path<String>,
) -> ServiceResult<(StatusCode, HeaderMap, Vec<u8>)> {
    state.session_require()?;

    let relative = sanitize(&path).ok_or(ServiceError::NotFound)?;
    let full_path = FsPath::new(env::UPLOAD_STORAGE.as_str()).join(&relative);

    let data = match tokio::fs::read(&full_path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServiceError::NotFound)
        }
        Err(e) => return Err(e.into()),
    };

    let mut header_map = HeaderMap::new();
    if let Ok(content_type) = HeaderValue::from_str(mimetype_for(&relative)) {
        header_map.insert(header::CONTENT_TYPE, content_type);
    }

    Ok((StatusCode::OK, header_map, data))
}

fn get_file_docs(op: TransformOperation) -> TransformOperation {
    op.description("Serve an uploaded document or image.")
        .tag("files")
        .response_with::<200, (), _>(|res| res.description("The file contents."))
        .response_with::<404, (), _>(|res| res.description("The requested file does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

#[cfg(test)]
mod tests {
    use super::sanitize;
    use std::path::PathBuf;

    #[test]
    fn accepts_plain_relative_paths() {
        assert_eq!(
            sanitize("loan-documents/abc123.png"),
            Some(PathBuf::from("loan-documents/abc123.png"))
        );
    }

    #[test]
    fn rejects_traversal_and_absolute_paths() {
        assert_eq!(sanitize("../etc/passwd"), None);
        assert_eq!(sanitize("loan-documents/../../etc/passwd"), None);
        assert_eq!(sanitize("/etc/passwd"), None);
        assert_eq!(sanitize(""), None);
    }
}
