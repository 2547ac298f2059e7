use base64::{engine::general_purpose::STANDARD, Engine as _};
use contracts::domain::a003_attachment::aggregate::{
    Attachment, AttachmentMeta, UploadAttachmentRequest,
};
use sea_orm::DatabaseConnection;

use super::repository;
use crate::shared::api_error::{ApiError, ApiResult};

const MISSING_FIELDS: &str = "Nome do arquivo e dados são obrigatórios";
const NOT_FOUND: &str = "Anexo não encontrado";

/// Проверенные данные загрузки
#[derive(Debug)]
struct ValidUpload {
    file_name: String,
    file_data: Vec<u8>,
    file_size: i64,
}

fn validate(req: UploadAttachmentRequest) -> ApiResult<ValidUpload> {
    let file_name = req
        .file_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_FIELDS.to_string()))?;
    let encoded = req
        .file_data
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_FIELDS.to_string()))?;

    // браузер может прислать data URL целиком
    let payload = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded.as_str(),
    };
    let file_data = STANDARD
        .decode(payload.trim())
        .map_err(|e| ApiError::BadRequest(format!("fileData não é base64 válido: {}", e)))?;

    let file_size = req.file_size.unwrap_or(file_data.len() as i64);

    Ok(ValidUpload {
        file_name,
        file_data,
        file_size,
    })
}

/// Сохраняет вложение контракта, возвращает id новой записи.
pub async fn upload(
    conn: &DatabaseConnection,
    contract_number: &str,
    req: UploadAttachmentRequest,
) -> ApiResult<i64> {
    if contract_number.trim().is_empty() {
        return Err(ApiError::BadRequest("contractNumber é obrigatório".to_string()));
    }
    let upload = validate(req)?;

    let id = repository::insert(
        conn,
        contract_number,
        &upload.file_name,
        upload.file_data,
        upload.file_size,
    )
    .await
    .map_err(ApiError::Storage)?;

    tracing::info!(
        "Attachment {} saved for contract {}: {} ({} bytes)",
        id,
        contract_number,
        upload.file_name,
        upload.file_size
    );
    Ok(id)
}

pub async fn list_by_contract(
    conn: &DatabaseConnection,
    contract_number: &str,
) -> ApiResult<Vec<AttachmentMeta>> {
    repository::list_by_contract(conn, contract_number)
        .await
        .map_err(ApiError::Storage)
}

pub async fn download(conn: &DatabaseConnection, id: i64) -> ApiResult<Attachment> {
    repository::get_by_id(conn, id)
        .await
        .map_err(ApiError::Storage)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))
}

pub async fn delete(conn: &DatabaseConnection, id: i64) -> ApiResult<()> {
    let deleted = repository::delete_by_id(conn, id)
        .await
        .map_err(ApiError::Storage)?;
    if !deleted {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!("Attachment {} deleted", id);
    Ok(())
}
