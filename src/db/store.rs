//! Local persistent store for the scouting records.
//!
//! Each record is a whole JSON value under a namespaced key. Reads migrate the payload to the
//! current record version and fall back to the record's default when it cannot be decoded.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tokio::sync::Mutex as AsyncMutex;

use crate::errors::AppError;
use crate::models::{
    AdminScouter, CreateScouterRequest, Datastore, EntryPatch, Match, RevisionInfo,
    ScoutingEntry, UpdateScouterRequest, User,
};

/// Namespace shared by every record key.
pub const KEY_PREFIX: &str = "frc_scouting_";

/// Version written with every record.
pub const CURRENT_RECORD_VERSION: i64 = 1;

/// The five records held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    User,
    Matches,
    ScoutingData,
    AdminScouters,
    SelectedEvent,
}

impl RecordKey {
    pub const ALL: [RecordKey; 5] = [
        RecordKey::User,
        RecordKey::Matches,
        RecordKey::ScoutingData,
        RecordKey::AdminScouters,
        RecordKey::SelectedEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::User => "frc_scouting_user",
            RecordKey::Matches => "frc_scouting_matches",
            RecordKey::ScoutingData => "frc_scouting_data",
            RecordKey::AdminScouters => "frc_scouting_admin_scouters",
            RecordKey::SelectedEvent => "frc_scouting_selected_event",
        }
    }

    /// Accepts the full key or just the part after `KEY_PREFIX`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| {
            let full = key.as_str();
            full == s || full.strip_prefix(KEY_PREFIX) == Some(s)
        })
    }
}

/// A record that could not be decoded and was served as its default instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreIssue {
    pub key: String,
    pub stored_version: i64,
    pub message: String,
    pub detected_at: String,
}

/// Where an entry sat in the collection when it was captured for a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSlot {
    pub position: usize,
    pub id: String,
}

/// The unsynced entries at one instant, with the slots needed to mark exactly them later.
#[derive(Debug, Clone, Default)]
pub struct UnsyncedBatch {
    pub entries: Vec<ScoutingEntry>,
    pub slots: Vec<BatchSlot>,
}

impl UnsyncedBatch {
    pub fn capture(collection: &[ScoutingEntry]) -> Self {
        let mut batch = Self::default();
        for (position, entry) in collection.iter().enumerate() {
            if !entry.synced {
                batch.slots.push(BatchSlot {
                    position,
                    id: entry.id.clone(),
                });
                batch.entries.push(entry.clone());
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Bring a stored payload up to `CURRENT_RECORD_VERSION`.
pub fn migrate_record(key: RecordKey, version: i64, raw: &str) -> Result<Value, String> {
    if version > CURRENT_RECORD_VERSION {
        return Err(format!(
            "record version {} is newer than supported version {}",
            version, CURRENT_RECORD_VERSION
        ));
    }
    if version < 0 {
        return Err(format!("invalid record version {}", version));
    }

    let mut value = if version == 0 {
        legacy_value(key, raw)?
    } else {
        serde_json::from_str(raw).map_err(|e| e.to_string())?
    };

    let mut version = version;
    while version < CURRENT_RECORD_VERSION {
        value = upgrade_record(key, version, value)?;
        version += 1;
    }

    Ok(value)
}

/// Decode an unversioned payload as written by the browser build.
fn legacy_value(key: RecordKey, raw: &str) -> Result<Value, String> {
    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        // The browser build stored the selected event key as bare text.
        Err(_) if key == RecordKey::SelectedEvent => Ok(Value::String(raw.to_string())),
        Err(e) => Err(e.to_string()),
    }
}

/// Step a record from `version` to `version + 1`.
fn upgrade_record(key: RecordKey, version: i64, value: Value) -> Result<Value, String> {
    match (version, key) {
        // Browser entries could omit `synced` when written by older builds.
        (0, RecordKey::ScoutingData) => {
            let Value::Array(items) = value else {
                return Err("scouting data is not an array".to_string());
            };
            let items = items
                .into_iter()
                .map(|mut item| {
                    if let Value::Object(fields) = &mut item {
                        fields
                            .entry("synced")
                            .or_insert(Value::Bool(false));
                    }
                    item
                })
                .collect();
            Ok(Value::Array(items))
        }
        (0, _) => Ok(value),
        (v, _) => Err(format!("no migration from record version {}", v)),
    }
}

async fn bump_revision(conn: &mut SqliteConnection, now: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Durable record holder for one device.
///
/// Read-modify-write operations on a record are serialized by an in-process lock, so the
/// submission flow and the sync-completion flow never overwrite each other's changes.
pub struct LocalStore {
    pool: SqlitePool,
    write_lock: AsyncMutex<()>,
    /// Latest problem per record, dropped once the record is written again
    issues: Mutex<HashMap<RecordKey, StoreIssue>>,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: AsyncMutex::new(()),
            issues: Mutex::new(HashMap::new()),
        }
    }

    // ==================== RECORD PRIMITIVES ====================

    async fn read<T>(&self, key: RecordKey) -> Result<T, AppError>
    where
        T: DeserializeOwned + Default,
    {
        let row = sqlx::query("SELECT version, value FROM records WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(T::default());
        };

        let version: i64 = row.get("version");
        let raw: String = row.get("value");

        let decoded = migrate_record(key, version, &raw)
            .and_then(|value| serde_json::from_value::<T>(value).map_err(|e| e.to_string()));

        match decoded {
            Ok(value) => Ok(value),
            Err(message) => {
                self.report_issue(key, version, message);
                Ok(T::default())
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: RecordKey, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)?;
        self.write_raw(key, CURRENT_RECORD_VERSION, &json).await
    }

    async fn write_raw(&self, key: RecordKey, version: i64, raw: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO records (key, version, value, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET version = excluded.version, value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(version)
        .bind(raw)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx, &now).await?;
        tx.commit().await?;

        self.issues_mut().remove(&key);
        Ok(())
    }

    fn issues_mut(&self) -> std::sync::MutexGuard<'_, HashMap<RecordKey, StoreIssue>> {
        self.issues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Keep the latest problem for `key`. Only the first report for a payload is logged.
    fn report_issue(&self, key: RecordKey, stored_version: i64, message: String) {
        let first_report = {
            let mut issues = self.issues_mut();
            let first = issues.get(&key).map_or(true, |known| {
                known.stored_version != stored_version || known.message != message
            });
            issues.insert(
                key,
                StoreIssue {
                    key: key.as_str().to_string(),
                    stored_version,
                    message: message.clone(),
                    detected_at: Utc::now().to_rfc3339(),
                },
            );
            first
        };

        if first_report {
            tracing::warn!(
                key = key.as_str(),
                stored_version,
                "Unreadable record replaced by default: {}",
                message
            );
        }
    }

    /// Records currently unreadable, one issue per record in key order.
    pub fn issues(&self) -> Vec<StoreIssue> {
        let issues = self.issues_mut();
        RecordKey::ALL
            .iter()
            .filter_map(|key| issues.get(key).cloned())
            .collect()
    }

    /// Store a payload exactly as a browser build persisted it. It is migrated on the next read.
    pub async fn import_legacy(&self, key: RecordKey, raw: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write_raw(key, 0, raw).await
    }

    // ==================== META ====================

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Get every record at once.
    pub async fn get_datastore(&self) -> Result<Datastore, AppError> {
        let meta =
            sqlx::query("SELECT schema_version, revision_id, generated_at FROM meta WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(Datastore {
            schema_version: meta.get("schema_version"),
            revision_id: meta.get("revision_id"),
            generated_at: meta.get("generated_at"),
            user: self.get_user().await?,
            matches: self.get_matches().await?,
            scouting_data: self.get_scouting_data().await?,
            admin_scouters: self.get_admin_scouters().await?,
            selected_event: self.get_selected_event().await?,
        })
    }

    // ==================== USER ====================

    pub async fn get_user(&self) -> Result<Option<User>, AppError> {
        self.read(RecordKey::User).await
    }

    pub async fn set_user(&self, user: &User) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(RecordKey::User, user).await
    }

    // ==================== MATCHES ====================

    pub async fn get_matches(&self) -> Result<Vec<Match>, AppError> {
        self.read(RecordKey::Matches).await
    }

    pub async fn set_matches(&self, matches: &[Match]) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(RecordKey::Matches, matches).await
    }

    // ==================== SCOUTING ENTRIES ====================

    pub async fn get_scouting_data(&self) -> Result<Vec<ScoutingEntry>, AppError> {
        self.read(RecordKey::ScoutingData).await
    }

    pub async fn set_scouting_data(&self, entries: &[ScoutingEntry]) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(RecordKey::ScoutingData, entries).await
    }

    /// Append an entry and return the resulting collection. Never deduplicates.
    pub async fn add_entry(&self, entry: ScoutingEntry) -> Result<Vec<ScoutingEntry>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut entries: Vec<ScoutingEntry> = self.read(RecordKey::ScoutingData).await?;
        entries.push(entry);
        self.write(RecordKey::ScoutingData, &entries).await?;
        Ok(entries)
    }

    /// Merge `patch` into every entry with `id`. An unknown id leaves the collection untouched.
    pub async fn update_entry(
        &self,
        id: &str,
        patch: &EntryPatch,
    ) -> Result<Vec<ScoutingEntry>, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut entries: Vec<ScoutingEntry> = self.read(RecordKey::ScoutingData).await?;

        let mut found = false;
        for entry in entries.iter_mut().filter(|e| e.id == id) {
            entry.apply(patch);
            found = true;
        }

        if found {
            self.write(RecordKey::ScoutingData, &entries).await?;
        } else {
            tracing::debug!("update_entry: no entry with id {}", id);
        }
        Ok(entries)
    }

    /// Entries not yet synced, in stored order.
    pub async fn get_unsynced(&self) -> Result<Vec<ScoutingEntry>, AppError> {
        Ok(self.capture_unsynced().await?.entries)
    }

    /// Snapshot the unsynced entries together with their slots.
    pub async fn capture_unsynced(&self) -> Result<UnsyncedBatch, AppError> {
        let entries = self.get_scouting_data().await?;
        Ok(UnsyncedBatch::capture(&entries))
    }

    /// Flip `synced` on exactly the captured slots that still hold the same entry.
    /// Returns how many entries changed.
    pub async fn mark_synced(&self, slots: &[BatchSlot]) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut entries: Vec<ScoutingEntry> = self.read(RecordKey::ScoutingData).await?;

        let mut marked = 0;
        for slot in slots {
            if let Some(entry) = entries.get_mut(slot.position) {
                if entry.id == slot.id && !entry.synced {
                    entry.synced = true;
                    marked += 1;
                }
            }
        }

        if marked > 0 {
            self.write(RecordKey::ScoutingData, &entries).await?;
        }
        Ok(marked)
    }

    // ==================== SCOUT ROSTER ====================

    pub async fn get_admin_scouters(&self) -> Result<Vec<AdminScouter>, AppError> {
        self.read(RecordKey::AdminScouters).await
    }

    pub async fn set_admin_scouters(&self, scouters: &[AdminScouter]) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(RecordKey::AdminScouters, scouters).await
    }

    /// Add a scout to the roster under a freshly generated id.
    pub async fn create_scouter(
        &self,
        request: &CreateScouterRequest,
    ) -> Result<AdminScouter, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut scouters: Vec<AdminScouter> = self.read(RecordKey::AdminScouters).await?;

        let scouter = AdminScouter {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            assigned_alliance: request.assigned_alliance,
            assigned_position: request.assigned_position,
            status: request.status,
        };
        scouters.push(scouter.clone());

        self.write(RecordKey::AdminScouters, &scouters).await?;
        Ok(scouter)
    }

    pub async fn update_scouter(
        &self,
        id: &str,
        request: &UpdateScouterRequest,
    ) -> Result<AdminScouter, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut scouters: Vec<AdminScouter> = self.read(RecordKey::AdminScouters).await?;

        let scouter = scouters
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Scouter {} not found", id)))?;
        scouter.apply(request);
        let updated = scouter.clone();

        self.write(RecordKey::AdminScouters, &scouters).await?;
        Ok(updated)
    }

    pub async fn delete_scouter(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut scouters: Vec<AdminScouter> = self.read(RecordKey::AdminScouters).await?;

        let before = scouters.len();
        scouters.retain(|s| s.id != id);
        if scouters.len() == before {
            return Err(AppError::NotFound(format!("Scouter {} not found", id)));
        }

        self.write(RecordKey::AdminScouters, &scouters).await
    }

    // ==================== SELECTED EVENT ====================

    pub async fn get_selected_event(&self) -> Result<Option<String>, AppError> {
        self.read(RecordKey::SelectedEvent).await
    }

    pub async fn set_selected_event(&self, event_key: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.write(RecordKey::SelectedEvent, event_key).await
    }

    // ==================== CLEAR ====================

    /// Remove all five records in one transaction.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for key in RecordKey::ALL {
            sqlx::query("DELETE FROM records WHERE key = ?")
                .bind(key.as_str())
                .execute(&mut *tx)
                .await?;
        }

        bump_revision(&mut tx, &now).await?;
        tx.commit().await?;
        self.issues_mut().clear();

        tracing::info!("Cleared all local records");
        Ok(())
    }
}
