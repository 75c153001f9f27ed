//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use nicval_core::{
  record::{
    NewRecord, RecordTable, UploadedFile, ValidationRecord, ValidationStatus,
  },
  store::{RecordQuery, RecordStore},
};

use crate::{
  encode::{
    encode_dt, encode_eligibility, encode_location, encode_nics, encode_uuid,
    RawRecord, RawUpload, RECORD_COLUMNS,
  },
  schema::SCHEMA,
  Result,
};

const TABLES: [RecordTable; 2] = [RecordTable::Validated, RecordTable::Invalid];

fn select_from(table: RecordTable) -> String {
  format!("SELECT '{table}', {RECORD_COLUMNS} FROM {table}")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A nicval record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn record(
    &self,
    input: NewRecord,
    as_of: NaiveDate,
  ) -> Result<ValidationRecord> {
    let table = input.status.table();
    let nic = input.key();
    let kind = input.kind.as_ref().to_owned();
    let reason = match &input.status {
      ValidationStatus::Valid => None,
      ValidationStatus::Invalid { reason } => Some(reason.clone()),
    };
    let eligibility = encode_eligibility(input.reported_eligibility);
    let location = encode_location(input.location.as_ref())?;
    let now = encode_dt(Utc::now());

    let raw: RawRecord = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO {table} (
             nic, kind, reason, reported_eligibility, location_json,
             first_seen, last_seen, duplicate_count
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0)
           ON CONFLICT (nic) DO UPDATE SET
             reason               = excluded.reason,
             reported_eligibility = COALESCE(excluded.reported_eligibility,
                                             reported_eligibility),
             location_json        = COALESCE(excluded.location_json,
                                             location_json),
             last_seen            = excluded.last_seen,
             duplicate_count      = duplicate_count + 1
           RETURNING '{table}', {RECORD_COLUMNS}"
        );
        Ok(conn.query_row(
          &sql,
          rusqlite::params![nic, kind, reason, eligibility, location, now],
          RawRecord::from_row,
        )?)
      })
      .await?;

    Ok(raw.into_stored()?.materialize(as_of))
  }

  async fn get(
    &self,
    nic: &str,
    as_of: NaiveDate,
  ) -> Result<Option<ValidationRecord>> {
    let key = nicval_core::record::record_key(nic);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        for table in TABLES {
          let found = conn
            .query_row(
              &format!("{} WHERE nic = ?1", select_from(table)),
              rusqlite::params![key],
              RawRecord::from_row,
            )
            .optional()?;
          if found.is_some() {
            return Ok(found);
          }
        }
        Ok(None)
      })
      .await?;

    Ok(
      raw
        .map(RawRecord::into_stored)
        .transpose()?
        .map(|stored| stored.materialize(as_of)),
    )
  }

  async fn list(
    &self,
    query: &RecordQuery,
    as_of: NaiveDate,
  ) -> Result<Vec<ValidationRecord>> {
    let tables: Vec<RecordTable> = match query.table {
      Some(table) => vec![table],
      None => TABLES.to_vec(),
    };
    let kind = query.kind.map(|k| k.as_ref().to_owned());
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let selects: Vec<String> = tables
          .into_iter()
          .map(|t| format!("{} WHERE (?1 IS NULL OR kind = ?1)", select_from(t)))
          .collect();
        let sql = format!(
          "{} ORDER BY last_seen DESC, nic LIMIT ?2 OFFSET ?3",
          selects.join(" UNION ALL ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![kind, limit, offset], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| Ok(raw.into_stored()?.materialize(as_of)))
      .collect()
  }

  // ── Uploads ───────────────────────────────────────────────────────────────

  async fn record_upload(
    &self,
    name: String,
    nics: Vec<String>,
  ) -> Result<UploadedFile> {
    let upload = UploadedFile {
      file_id: Uuid::new_v4(),
      name,
      first_created: Utc::now(),
      nics,
    };

    let id_str = encode_uuid(upload.file_id);
    let name = upload.name.clone();
    let at_str = encode_dt(upload.first_created);
    let nics_json = encode_nics(&upload.nics)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO uploaded_files (file_id, name, first_created, nics_json)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, at_str, nics_json],
        )?;
        Ok(())
      })
      .await?;

    Ok(upload)
  }

  async fn recent_uploads(&self, limit: usize) -> Result<Vec<UploadedFile>> {
    let limit = limit as i64;

    let raws: Vec<RawUpload> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT file_id, name, first_created, nics_json
           FROM uploaded_files
           ORDER BY first_created DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawUpload {
              file_id:       row.get(0)?,
              name:          row.get(1)?,
              first_created: row.get(2)?,
              nics_json:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUpload::into_upload).collect()
  }
}
