use crate::domain::model::{Document, FieldMap, FieldValue};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Document store backed by a single JSON file:
/// `{ "<collection>": { "<id>": { "<field>": <value> } } }`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // 序列化寫入，避免並發更新互相覆蓋
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&content)? {
            Value::Object(root) => Ok(root),
            _ => Err(UpdaterError::ConfigError {
                message: format!("{} must contain a JSON object", self.path.display()),
            }),
        }
    }

    async fn save(&self, root: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 先寫暫存檔再改名，確保檔案不會只寫一半
        let tmp_path = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(root)?;
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        let root = self.load().await?;
        let Some(entries) = root.get(collection) else {
            return Ok(Vec::new());
        };

        let Value::Object(entries) = entries else {
            return Err(UpdaterError::StoreReadError {
                collection: collection.to_string(),
                message: "collection is not a JSON object".to_string(),
            });
        };

        let mut documents = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            let fields = match value {
                Value::Object(obj) => obj
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json(v.clone())))
                    .collect(),
                // 非物件的記錄交由上層視為格式錯誤
                _ => FieldMap::new(),
            };
            documents.push(Document::new(id.clone(), fields));
        }

        tracing::debug!(
            "Loaded {} documents from {}",
            documents.len(),
            self.path.display()
        );
        Ok(documents)
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut root = self.load().await?;

        let record = root
            .get_mut(collection)
            .and_then(Value::as_object_mut)
            .and_then(|entries| entries.get_mut(id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| UpdaterError::StoreWriteError {
                id: id.to_string(),
                message: format!("document not found in '{}'", collection),
            })?;

        for (key, value) in fields {
            record.insert(key.clone(), value.to_json());
        }

        self.save(&root).await
    }
}
