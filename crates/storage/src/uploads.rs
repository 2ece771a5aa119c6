use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};
use tally_core::{FileKind, Upload, UploadId};

use crate::error::StoreError;

type UploadRow = (i64, String, String, DateTime<Utc>);

fn to_upload(r: UploadRow) -> Result<Upload, StoreError> {
    Ok(Upload {
        id: UploadId(r.0),
        file_name: r.1,
        kind: r.2.parse()?,
        uploaded_at: r.3,
    })
}

pub async fn create_upload<'c, E>(db: E, file_name: &str, kind: FileKind) -> Result<Upload, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, UploadRow>(
        "INSERT INTO uploads (file_name, kind, uploaded_at) VALUES (?, ?, ?) RETURNING id, file_name, kind, uploaded_at",
    )
    .bind(file_name)
    .bind(kind.as_str())
    .bind(Utc::now())
    .fetch_one(db)
    .await?;

    to_upload(row)
}

/// Uploads of one kind, newest first.
pub async fn list_uploads<'c, E>(db: E, kind: FileKind) -> Result<Vec<Upload>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, UploadRow>(
        "SELECT id, file_name, kind, uploaded_at FROM uploads WHERE kind = ? ORDER BY uploaded_at DESC, id DESC",
    )
    .bind(kind.as_str())
    .fetch_all(db)
    .await?
    .into_iter()
    .map(to_upload)
    .collect()
}
