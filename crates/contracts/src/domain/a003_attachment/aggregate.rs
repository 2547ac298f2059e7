use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Метаданные вложения (PDF), без содержимого файла.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub id: i64,
    pub contract_number: String,
    pub file_name: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
}

/// Вложение вместе с содержимым. В JSON не отдаётся.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub meta: AttachmentMeta,
    pub file_data: Vec<u8>,
}

/// Тело `POST /api/contracts/:contractNumber/attachments`.
///
/// Поля опциональные: без имени или данных ответ 400 с понятным
/// сообщением, а не ошибка разбора JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttachmentRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    /// Содержимое файла в base64
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAttachmentResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
