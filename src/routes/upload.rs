//! Logo upload route handlers
//!
//! Accepts a single image per request in the `logo` multipart field, along
//! with the owning team's name in `teamName`.

use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::images::{logo_public_id, StoredImage, UploadInfo, UploadOptions, UploadPolicy, LOGO_FOLDER};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLogoRequest {
    pub public_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedLogo {
    #[serde(flatten)]
    pub image: StoredImage,
    pub original_name: Option<String>,
    pub team_name: String,
}

#[derive(Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
}

#[derive(Serialize)]
pub struct DeleteResult {
    pub result: &'static str,
}

struct LogoFile {
    bytes: Vec<u8>,
    content_type: Option<String>,
    file_name: Option<String>,
}

/// POST /api/upload/logo
pub async fn upload_logo(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<Data<UploadedLogo>>>> {
    let policy = state.upload_policy;
    let mut logo: Option<LogoFile> = None;
    let mut team_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &policy))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("logo") => {
                if logo.is_some() {
                    return Err(validation_error("Only a single file may be uploaded"));
                }
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, &policy))?;
                logo = Some(LogoFile {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            }
            Some("teamName") => {
                team_name = Some(field.text().await.map_err(|e| multipart_error(e, &policy))?);
            }
            _ if field.file_name().is_some() => {
                return Err(validation_error("Only a single file may be uploaded"));
            }
            _ => {}
        }
    }

    let logo = logo.ok_or_else(|| validation_error("No image file provided"))?;
    policy.check(logo.content_type.as_deref(), logo.bytes.len())?;

    let team_name = team_name
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| validation_error("Team name is required"))?;

    debug!("Uploading logo for team: {}", team_name);

    let options = UploadOptions {
        folder: LOGO_FOLDER.to_string(),
        public_id: logo_public_id(&team_name),
        content_type: logo.content_type.unwrap_or_default(),
    };
    let image = state.images.upload(logo.bytes, options).await?;

    info!("Successfully uploaded logo for team: {}", team_name);

    Ok(Json(SuccessResponse::with_data(
        "Logo uploaded successfully",
        Data {
            data: UploadedLogo {
                image,
                original_name: logo.file_name,
                team_name,
            },
        },
    )))
}

/// DELETE /api/upload/logo
pub async fn delete_logo(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteLogoRequest>, AppError>,
) -> ApiResult<Json<SuccessResponse<Data<DeleteResult>>>> {
    let public_id = req
        .public_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| validation_error("Public ID is required"))?;

    if !state.images.delete(public_id.trim()).await? {
        return Err(not_found_error("Logo not found or already deleted"));
    }

    Ok(Json(SuccessResponse::with_data(
        "Logo deleted successfully",
        Data {
            data: DeleteResult { result: "ok" },
        },
    )))
}

/// GET /api/upload/logo/{*id}
pub async fn logo_metadata(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, AppError>,
) -> ApiResult<Json<StoredImage>> {
    state
        .images
        .metadata(id.trim_start_matches('/'))
        .await?
        .map(Json)
        .ok_or_else(|| not_found_error("Logo not found"))
}

/// GET /api/upload/info
pub async fn upload_info(
    State(state): State<SharedState>,
) -> Json<SuccessResponse<Data<UploadInfo>>> {
    Json(SuccessResponse::with_data(
        "Upload configuration",
        Data {
            data: state.upload_policy.info(),
        },
    ))
}

/// Oversized bodies surface as multipart read failures
fn multipart_error(err: MultipartError, policy: &UploadPolicy) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        validation_error(format!(
            "File size too large. Maximum size is {}.",
            policy.info().max_file_size
        ))
    } else {
        validation_error(format!("Malformed upload: {}", err.body_text()))
    }
}
