use axum::{
    extract::Path,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::a003_attachment::aggregate::{
    AttachmentMeta, MessageResponse, UploadAttachmentRequest, UploadAttachmentResponse,
};

use crate::domain::a003_attachment;
use crate::shared::api_error::{ApiError, ApiResult};
use crate::shared::data::db::get_connection;

/// GET /api/contracts/:contract_number/attachments
pub async fn list_by_contract(
    Path(contract_number): Path<String>,
) -> ApiResult<Json<Vec<AttachmentMeta>>> {
    let items =
        a003_attachment::service::list_by_contract(get_connection(), &contract_number).await?;
    Ok(Json(items))
}

/// POST /api/contracts/:contract_number/attachments
pub async fn upload(
    Path(contract_number): Path<String>,
    Json(req): Json<UploadAttachmentRequest>,
) -> ApiResult<Json<UploadAttachmentResponse>> {
    let id = a003_attachment::service::upload(get_connection(), &contract_number, req).await?;
    Ok(Json(UploadAttachmentResponse {
        id,
        message: "Anexo salvo com sucesso".to_string(),
    }))
}

/// GET /api/attachments/:id/download
pub async fn download(Path(id): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let attachment = a003_attachment::service::download(get_connection(), id).await?;

    let disposition = content_disposition(&attachment.meta.file_name);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("invalid header value: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        attachment.file_data,
    )
        .into_response())
}

/// DELETE /api/attachments/:id
pub async fn delete(Path(id): Path<String>) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    a003_attachment::service::delete(get_connection(), id).await?;
    Ok(Json(MessageResponse {
        message: "Anexo excluído com sucesso".to_string(),
    }))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid attachment id: {}", raw)))
}

/// `attachment; filename="..."; filename*=UTF-8''...`: ASCII-вариант имени
/// для старых клиентов и точное имя в percent-encoding.
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    )
}
