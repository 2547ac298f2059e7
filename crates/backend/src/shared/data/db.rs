use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Открывает (или создаёт) файл SQLite и приводит схему к актуальной.
pub async fn connect(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    let conn = Database::connect(&db_url).await?;
    ensure_schema(&conn).await?;
    Ok(conn)
}

/// Инициализация глобального подключения, вызывается один раз при старте.
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    let conn = connect(db_file).await?;
    tracing::info!("SQLite attachment database ready: {}", db_file.display());
    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("database already initialized"))
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("initialize_database must be called before get_connection")
}

async fn ensure_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    // WAL: чтения не блокируются записью вложений
    conn.query_one(Statement::from_string(
        DatabaseBackend::Sqlite,
        "PRAGMA journal_mode = WAL;".to_string(),
    ))
    .await?;

    let create_attachment_table_sql = r#"
        CREATE TABLE IF NOT EXISTS a003_attachment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            contract_number TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_data BLOB NOT NULL,
            file_size INTEGER NOT NULL,
            upload_date TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#;
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        create_attachment_table_sql.to_string(),
    ))
    .await?;

    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "CREATE INDEX IF NOT EXISTS idx_a003_attachment_contract_number \
         ON a003_attachment (contract_number);"
            .to_string(),
    ))
    .await?;

    Ok(())
}

/// `PRAGMA integrity_check`; `true`, если база в порядке.
pub async fn check_integrity(conn: &DatabaseConnection) -> anyhow::Result<bool> {
    let row = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "PRAGMA integrity_check;".to_string(),
        ))
        .await?;
    let status: String = match row {
        Some(row) => row.try_get("", "integrity_check")?,
        None => return Ok(false),
    };
    Ok(status == "ok")
}
