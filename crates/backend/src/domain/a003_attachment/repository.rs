use chrono::{DateTime, Utc};
use contracts::domain::a003_attachment::aggregate::{Attachment, AttachmentMeta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;

use sea_orm::{
    ActiveValue::NotSet, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_attachment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub contract_number: String,
    pub file_name: String,
    #[serde(skip)]
    pub file_data: Vec<u8>,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Attachment {
    fn from(m: Model) -> Self {
        Attachment {
            meta: AttachmentMeta {
                id: m.id,
                contract_number: m.contract_number,
                file_name: m.file_name,
                file_size: m.file_size,
                upload_date: m.upload_date,
            },
            file_data: m.file_data,
        }
    }
}

/// Строка списка без BLOB'а
#[derive(Debug, FromQueryResult)]
struct MetaRow {
    id: i64,
    contract_number: String,
    file_name: String,
    file_size: i64,
    upload_date: DateTime<Utc>,
}

impl From<MetaRow> for AttachmentMeta {
    fn from(r: MetaRow) -> Self {
        AttachmentMeta {
            id: r.id,
            contract_number: r.contract_number,
            file_name: r.file_name,
            file_size: r.file_size,
            upload_date: r.upload_date,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    contract_number: String,
    count: i64,
}

pub async fn insert(
    conn: &DatabaseConnection,
    contract_number: &str,
    file_name: &str,
    file_data: Vec<u8>,
    file_size: i64,
) -> anyhow::Result<i64> {
    let active = ActiveModel {
        id: NotSet,
        contract_number: Set(contract_number.to_string()),
        file_name: Set(file_name.to_string()),
        file_data: Set(file_data),
        file_size: Set(file_size),
        upload_date: Set(Utc::now()),
    };
    let result = Entity::insert(active).exec(conn).await?;
    Ok(result.last_insert_id)
}

/// Вложения контракта, новые первыми. Содержимое файлов не читается.
pub async fn list_by_contract(
    conn: &DatabaseConnection,
    contract_number: &str,
) -> anyhow::Result<Vec<AttachmentMeta>> {
    let rows = Entity::find()
        .select_only()
        .column(Column::Id)
        .column(Column::ContractNumber)
        .column(Column::FileName)
        .column(Column::FileSize)
        .column(Column::UploadDate)
        .filter(Column::ContractNumber.eq(contract_number))
        .order_by_desc(Column::Id)
        .into_model::<MetaRow>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn get_by_id(conn: &DatabaseConnection, id: i64) -> anyhow::Result<Option<Attachment>> {
    let result = Entity::find_by_id(id).one(conn).await?;
    Ok(result.map(Into::into))
}

/// `false`, если записи с таким id не было.
pub async fn delete_by_id(conn: &DatabaseConnection, id: i64) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id).exec(conn).await?;
    Ok(result.rows_affected > 0)
}

/// Количество вложений по номеру контракта
pub async fn counts_by_contract(conn: &DatabaseConnection) -> anyhow::Result<HashMap<String, i64>> {
    let rows = Entity::find()
        .select_only()
        .column(Column::ContractNumber)
        .column_as(Expr::col(Column::Id).count(), "count")
        .group_by(Column::ContractNumber)
        .into_model::<CountRow>()
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.contract_number, r.count))
        .collect())
}

pub async fn total_count(conn: &DatabaseConnection) -> anyhow::Result<u64> {
    Ok(Entity::find().count(conn).await?)
}
