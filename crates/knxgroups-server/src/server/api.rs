use axum::{extract::{Multipart, State}, http::StatusCode, Json};

use knxgroups_core::{
    import_functional_models,
    load_project_data_bytes,
    ImportOutcome,
    ImportSource,
    InvalidPasswordError,
    PasswordRequiredError,
};
use crate::server::config::ServerConfig;
use crate::server::validation::{FileValidator, ValidationError};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn handle_import(
    State(config): State<ServerConfig>,
    mut multipart: Multipart,
) -> Result<Json<ImportOutcome>, (StatusCode, String)> {
    log::info!("Received import request");

    let mut filename = None;
    let mut data = None;
    let mut password: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read form data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or("");
        if name == "file" {
            filename = Some(field.file_name().unwrap_or("upload.xml").to_string());
            data = Some(field.bytes().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file data: {}", e),
                )
            })?);
        } else if name == "password" {
            let value = field.text().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read password: {}", e),
                )
            })?;
            let value = value.trim().to_string();
            if !value.is_empty() {
                password = Some(value);
            }
        }
    }

    let filename = filename.ok_or((StatusCode::BAD_REQUEST, "No file in request".to_string()))?;
    let data = data.ok_or((
        StatusCode::BAD_REQUEST,
        "No file content in request".to_string(),
    ))?;

    log::info!("Importing file: {} ({} bytes)", filename, data.len());
    if let Some(value) = password.as_ref() {
        log::info!("Password provided (len={})", value.len());
    }

    let validator = FileValidator::new(
        config.max_upload_size_bytes,
        config.max_uncompressed_size_bytes,
    );
    if let Err(error) = validator.validate_upload(&filename, data.as_ref()) {
        let status = match error {
            ValidationError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        log::warn!("Upload validation failed: {}", error);
        return Err((status, error.to_string()));
    }

    let source = ImportSource::from_file(&filename, data.to_vec(), password).map_err(|e| {
        log::warn!("Unreadable import file: {:?}", e);
        (StatusCode::BAD_REQUEST, format!("Failed to read {}: {:#}", filename, e))
    })?;

    let (source, project_name) = match source {
        ImportSource::ProjectArchive { data, password } => {
            let docs = load_project_data_bytes(&data, password.as_deref()).map_err(|e| {
                log::warn!("KNX archive error: {:?}", e);
                if e.downcast_ref::<PasswordRequiredError>().is_some() {
                    (
                        StatusCode::BAD_REQUEST,
                        "Encrypted KNX project: password required".to_string(),
                    )
                } else if e.downcast_ref::<InvalidPasswordError>().is_some() {
                    (
                        StatusCode::BAD_REQUEST,
                        "Invalid password for KNX project".to_string(),
                    )
                } else {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to open KNX project: {}", e),
                    )
                }
            })?;
            (ImportSource::ProjectData(docs.data_xml), Some(docs.project_name))
        }
        other => (other, None),
    };

    let mut outcome = import_functional_models(&source);
    if outcome.report.depth.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} does not contain group addresses", filename),
        ));
    }
    if project_name.is_some() {
        outcome.report.project_name = project_name;
    }

    log::info!(
        "Imported {} functional models from {}",
        outcome.models.len(),
        filename
    );
    Ok(Json(outcome))
}
