use crate::api::error::AppError;
use crate::models::{CatalogEntry, CatalogStats};
use crate::services::catalog::{self, Catalog};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::{Html, Redirect, Response},
};
use chrono::Utc;
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio_util::io::StreamReader;

/// Renders the file catalog as a server-side HTML page with upload,
/// download, and delete controls.
pub async fn index(State(state): State<crate::AppState>) -> Result<Html<String>, AppError> {
    let records = state
        .storage
        .list_assets(&state.config.storage_folder)
        .await?;
    let catalog = catalog::build(&records);
    Ok(Html(render_index(&catalog)))
}

#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "Current file catalog, most recently modified first", body = Vec<CatalogEntry>),
        (status = 502, description = "Storage provider unavailable")
    ),
    tag = "files"
)]
pub async fn api_files(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let records = state
        .storage
        .list_assets(&state.config.storage_folder)
        .await?;
    let catalog = catalog::build(&records);
    if catalog.skipped > 0 {
        tracing::warn!(skipped = catalog.skipped, "Listing contained malformed records");
    }
    Ok(Json(catalog.entries))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Aggregate statistics over all stored files", body = CatalogStats),
        (status = 502, description = "Storage provider unavailable")
    ),
    tag = "files"
)]
pub async fn api_stats(State(state): State<crate::AppState>) -> Result<Json<CatalogStats>, AppError> {
    let records = state
        .storage
        .list_assets(&state.config.storage_folder)
        .await?;
    Ok(Json(catalog::stats(&records, Utc::now())))
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, description = "Multipart form with a 'file' field"),
    responses(
        (status = 303, description = "File uploaded, redirect to the catalog"),
        (status = 400, description = "Invalid filename or disallowed file type"),
        (status = 502, description = "Storage provider unavailable")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field.file_name().unwrap_or_default().to_string();

        // 1. Validate before anything touches the provider
        let candidate = state.policy.validate(&original_filename)?;

        // 2. Avoid clobbering an existing asset with the same display name
        let records = state
            .storage
            .list_assets(&state.config.storage_folder)
            .await?;
        let existing: Vec<String> = catalog::build(&records)
            .entries
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        let filename = catalog::unique_display_name(&existing, &candidate.filename);

        // 3. Stream the field body straight to the provider
        let body_with_io_error =
            field.map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
        let reader = StreamReader::new(body_with_io_error);

        let record = state
            .storage
            .upload_asset(&state.config.storage_folder, &filename, Box::new(reader))
            .await?;

        tracing::info!(
            filename = %filename,
            bytes = record.bytes,
            "Uploaded file to cloud storage"
        );
        return Ok(Redirect::to("/"));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

#[utoipa::path(
    get,
    path = "/download/{reference}",
    params(
        ("reference" = String, Path, description = "Percent-encoded opaque file reference")
    ),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 404, description = "Reference does not resolve to a stored file"),
        (status = 502, description = "Storage provider unavailable")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Path(reference): Path<String>,
) -> Result<Response, AppError> {
    let Some(data) = state.storage.fetch_asset(&reference).await? else {
        return Err(AppError::NotFound(
            "File not found in cloud storage".to_string(),
        ));
    };

    let filename = reference
        .rsplit('/')
        .next()
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "download".to_string());

    Response::builder()
        .header(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "_")),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/delete/{reference}",
    params(
        ("reference" = String, Path, description = "Percent-encoded opaque file reference")
    ),
    responses(
        (status = 303, description = "File deleted, redirect to the catalog"),
        (status = 404, description = "Reference does not resolve to a stored file"),
        (status = 502, description = "Storage provider unavailable")
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Path(reference): Path<String>,
) -> Result<Redirect, AppError> {
    if !state.storage.delete_asset(&reference).await? {
        return Err(AppError::NotFound(
            "File not found in cloud storage".to_string(),
        ));
    }

    tracing::info!(reference = %reference, "Deleted file from cloud storage");
    Ok(Redirect::to("/"))
}

fn render_index(catalog: &Catalog) -> String {
    let mut rows = String::new();
    for entry in &catalog.entries {
        let reference = utf8_percent_encode(&entry.reference, NON_ALPHANUMERIC);
        rows.push_str(&format!(
            "<tr>\
             <td>{name}</td>\
             <td>{size}</td>\
             <td>{modified}</td>\
             <td><a href=\"/download/{reference}\">Download</a> \
             <form method=\"post\" action=\"/delete/{reference}\" style=\"display:inline\">\
             <button type=\"submit\">Delete</button></form></td>\
             </tr>",
            name = escape_html(&entry.display_name),
            size = escape_html(&entry.size_formatted),
            modified = entry.modified_at.format("%Y-%m-%d %H:%M:%S"),
            reference = reference,
        ));
    }

    let notice = if catalog.skipped > 0 {
        format!(
            "<p class=\"notice\">{} file(s) could not be listed.</p>",
            catalog.skipped
        )
    } else {
        String::new()
    };

    format!(
        "<!DOCTYPE html>\
         <html><head><meta charset=\"utf-8\"><title>Cloud File Manager</title></head>\
         <body>\
         <h1>Cloud File Manager</h1>\
         <form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" required>\
         <button type=\"submit\">Upload</button>\
         </form>\
         {notice}\
         <table>\
         <thead><tr><th>Name</th><th>Size</th><th>Modified</th><th>Actions</th></tr></thead>\
         <tbody>{rows}</tbody>\
         </table>\
         </body></html>",
        notice = notice,
        rows = rows,
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
