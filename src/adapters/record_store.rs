//! File-backed record store.
//!
//! The datafile holds one JSON document per line, each with an `_id`.
//! Updates are appended rather than rewritten in place; when the file is
//! loaded the last line for an id wins and `{"_id": .., "$$deleted": true}`
//! removes it. Loading compacts a file with stale lines back to one line
//! per record.

use crate::core::{Record, RecordStore};
use crate::utils::error::StoreError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

const DELETED_FLAG: &str = "$$deleted";

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl StoreState {
    fn from_records(records: Vec<Record>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .filter_map(|(pos, r)| r.id.clone().map(|id| (id, pos)))
            .collect();
        Self { records, index }
    }

    fn upsert(&mut self, record: Record, id: String) {
        let existing = self.index.get(&id).copied();
        match existing {
            Some(pos) => self.records[pos] = record,
            None => {
                self.index.insert(id, self.records.len());
                self.records.push(record);
            }
        }
    }

    fn remove(&mut self, id: &str) {
        if self.index.remove(id).is_some() {
            self.records.retain(|r| r.id.as_deref() != Some(id));
            *self = Self::from_records(std::mem::take(&mut self.records));
        }
    }
}

#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileRecordStore {
    /// Opens the store at `path`; a missing file is an empty store.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let (state, lines) = match tokio::fs::read_to_string(&path).await {
            Ok(content) => parse_datafile(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (StoreState::default(), 0),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            state: Mutex::new(state),
        };

        {
            let state = store.state.lock().await;
            // 有被覆寫或刪除的行才需要壓縮
            if lines != state.records.len() {
                store.rewrite(&state.records).await?;
            }
            tracing::debug!(
                "Opened store {} with {} records",
                store.path.display(),
                state.records.len()
            );
        }

        Ok(store)
    }

    /// Replaces the datafile through a temp file so a crash never leaves it
    /// half written.
    async fn rewrite(&self, records: &[Record]) -> Result<(), StoreError> {
        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn append(&self, record: &Record) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Replays the datafile. Also returns the number of lines read, blank ones
/// included, so the caller can tell whether compaction is worthwhile.
fn parse_datafile(path: &Path, content: &str) -> Result<(StoreState, usize), StoreError> {
    let mut state = StoreState::default();
    let mut lines = 0;

    for (number, line) in content.lines().enumerate() {
        lines += 1;
        if line.trim().is_empty() {
            continue;
        }

        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.display().to_string(),
            line: number + 1,
            reason,
        };

        let value: Value = serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
        let Value::Object(obj) = value else {
            return Err(corrupt("not a JSON object".to_string()));
        };

        let deleted = obj.get(DELETED_FLAG).and_then(Value::as_bool).unwrap_or(false);
        let record = Record::from_object(obj);
        let Some(id) = record.id.clone() else {
            return Err(corrupt("document has no _id".to_string()));
        };

        if deleted {
            state.remove(&id);
        } else {
            state.upsert(record, id);
        }
    }

    Ok((state, lines))
}

/// `$`-prefixed names are store markers such as `$$deleted`; a record
/// carrying one would be misread when the file is replayed.
fn check_field_names(fields: &Map<String, Value>) -> Result<(), StoreError> {
    match fields.keys().find(|k| k.starts_with('$')) {
        Some(field) => Err(StoreError::ReservedField {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl RecordStore for FileRecordStore {
    async fn import_all(&self, records: Vec<Record>) -> Result<usize, StoreError> {
        for record in &records {
            check_field_names(&record.data)?;
        }

        let records: Vec<Record> = records
            .into_iter()
            .map(|mut r| {
                r.id = Some(new_id());
                r
            })
            .collect();

        let mut state = self.state.lock().await;
        self.rewrite(&records).await?;
        *state = StoreState::from_records(records);

        Ok(state.records.len())
    }

    async fn find_unprocessed(&self) -> Result<Vec<Record>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|r| !r.is_processed())
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        check_field_names(&fields)?;

        let mut state = self.state.lock().await;
        let pos = *state
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let mut updated = state.records[pos].clone();
        updated.merge(fields);

        // 先寫入檔案，成功後才更新記憶體
        self.append(&updated).await?;
        state.records[pos] = updated;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .cloned()
            .map(Record::without_id)
            .collect())
    }

    async fn count(&self) -> usize {
        self.state.lock().await.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::from_object(v.as_object().cloned().unwrap()))
            .collect()
    }

    fn status_fields(status: &str) -> Map<String, Value> {
        json!({"GeocodeStatus": status}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_import_assigns_fresh_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path().join("a.db")).await.unwrap();

        let imported = store
            .import_all(records(vec![
                json!({"_id": "stale", "city": "Paris"}),
                json!({"city": "Lyon"}),
            ]))
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let pending = store.find_unprocessed().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|r| r.id.as_deref().is_some_and(|id| id.len() == 32)));
        assert_ne!(pending[0].id.as_deref(), Some("stale"));
        assert_ne!(pending[0].id, pending[1].id);
    }

    #[tokio::test]
    async fn test_import_clears_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path().join("a.db")).await.unwrap();

        store.import_all(records(vec![json!({"city": "Old"})])).await.unwrap();
        store.import_all(records(vec![json!({"city": "New"})])).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].data["city"], json!("New"));
    }

    #[tokio::test]
    async fn test_find_unprocessed_excludes_records_with_status() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path().join("a.db")).await.unwrap();

        store
            .import_all(records(vec![
                json!({"city": "Paris", "GeocodeStatus": "ROOFTOP"}),
                json!({"city": "Lyon"}),
                json!({"city": "Nice", "GeocodeStatus": null}),
            ]))
            .await
            .unwrap();

        let pending = store.find_unprocessed().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data["city"], json!("Lyon"));

        let id = pending[0].id.clone().unwrap();
        store.update(&id, status_fields("ERROR")).await.unwrap();
        assert!(store.find_unprocessed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_field_names_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.db");
        let store = FileRecordStore::open(&path).await.unwrap();

        store
            .import_all(records(vec![json!({"city": "Lyon"})]))
            .await
            .unwrap();

        let err = store
            .import_all(records(vec![
                json!({"city": "Paris", "$$deleted": true}),
                json!({"city": "Lyon"}),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReservedField { ref field } if field == "$$deleted"));

        // 匯入失敗時原本的資料不變
        assert_eq!(store.count().await, 1);

        let id = store.find_unprocessed().await.unwrap()[0].id.clone().unwrap();
        let fields = json!({"$set": 1}).as_object().cloned().unwrap();
        assert!(matches!(
            store.update(&id, fields).await,
            Err(StoreError::ReservedField { .. })
        ));

        drop(store);
        let store = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(store.count().await, 1);
        assert_eq!(store.find_all().await.unwrap()[0].data["city"], json!("Lyon"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path().join("a.db")).await.unwrap();

        let err = store.update("missing", status_fields("ROOFTOP")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id } if id == "missing"));
    }

    #[tokio::test]
    async fn test_updates_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.db");

        {
            let store = FileRecordStore::open(&path).await.unwrap();
            store
                .import_all(records(vec![json!({"city": "Paris"}), json!({"city": "Lyon"})]))
                .await
                .unwrap();
            let pending = store.find_unprocessed().await.unwrap();
            let id = pending[0].id.clone().unwrap();
            store.update(&id, status_fields("ROOFTOP")).await.unwrap();
        }

        // import line x2 + one appended update
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 3);

        let store = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(store.count().await, 2);
        let pending = store.find_unprocessed().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data["city"], json!("Lyon"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);

        // already compact, left alone
        drop(store);
        let store = FileRecordStore::open(&path).await.unwrap();
        assert_eq!(store.count().await, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_find_all_strips_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRecordStore::open(temp_dir.path().join("a.db")).await.unwrap();
        store.import_all(records(vec![json!({"city": "Paris"})])).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all[0].id, None);
        assert_eq!(serde_json::to_value(&all[0]).unwrap(), json!({"city": "Paris"}));
    }

    #[test]
    fn test_parse_datafile_last_line_wins_and_tombstones() {
        let content = r#"{"_id":"a","city":"Paris"}
{"_id":"b","city":"Lyon"}

{"_id":"a","city":"Paris","GeocodeStatus":"ROOFTOP"}
{"_id":"b","$$deleted":true}
{"_id":"c","city":"Nice"}
"#;
        let (state, lines) = parse_datafile(Path::new("test.db"), content).unwrap();
        assert_eq!(lines, 6);

        assert_eq!(state.records.len(), 2);
        assert_eq!(state.records[0].id.as_deref(), Some("a"));
        assert_eq!(state.records[0].status(), Some("ROOFTOP"));
        assert_eq!(state.records[1].id.as_deref(), Some("c"));
        assert_eq!(state.index.get("c"), Some(&1));
    }

    #[test]
    fn test_parse_datafile_reports_corrupt_line() {
        let content = "{\"_id\":\"a\"}\nnot json\n";
        let err = parse_datafile(Path::new("test.db"), content).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));

        let err = parse_datafile(Path::new("test.db"), "{\"city\":\"Paris\"}\n").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 1, .. }));
    }
}
