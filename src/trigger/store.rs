use crate::error::{Result, ScenarioError};
use crate::trigger::model::TriggerRecord;
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// 触发文件存储
///
/// 每个文件整体替换：写入持有 `fs2` 排他锁，读取持有共享锁。
/// 运行文件只追加不删除。
#[derive(Debug, Clone)]
pub struct TriggerStore {
    dir: PathBuf,
}

impl TriggerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(ScenarioError::IoError)?;
        }
        Ok(())
    }

    /// `<dir>/<id>.json`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// 写入运行文件 `<triggerId>-<timestampStart>[-n].json`
    pub fn write_run(&self, record: &TriggerRecord) -> Result<PathBuf> {
        let path = self.dir.join(record.run_file_name());
        self.write_json(&path, record)?;
        Ok(path)
    }

    /// 写入最新指针文件 `<triggerId>.json`
    pub fn write_pointer<T: Serialize>(&self, trigger_id: &str, value: &T) -> Result<PathBuf> {
        let path = self.path_for(trigger_id);
        self.write_json(&path, value)?;
        Ok(path)
    }

    /// 读取 `<id>.json`；文件不存在时返回 NotFound
    pub fn read<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        Self::read_json(&self.path_for(id))
    }

    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(value)?;

        // 先加锁再截断，避免读者看到半截文件
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(ScenarioError::IoError)?;
        file.lock_exclusive().map_err(ScenarioError::IoError)?;

        file.set_len(0).map_err(ScenarioError::IoError)?;
        file.seek(SeekFrom::Start(0)).map_err(ScenarioError::IoError)?;
        file.write_all(json.as_bytes()).map_err(ScenarioError::IoError)?;
        file.flush().map_err(ScenarioError::IoError)?;

        // Unlock on drop
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let mut file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ScenarioError::NotFound(format!(
                    "trigger file {}",
                    path.display()
                )));
            }
            Err(e) => return Err(ScenarioError::IoError(e)),
        };
        file.lock_shared().map_err(ScenarioError::IoError)?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(ScenarioError::IoError)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 最近的运行记录（按开始时间倒序）
    ///
    /// 只包含运行文件，指针文件和无法解析的文件被跳过。
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<TriggerRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(ScenarioError::IoError)? {
            let path = entry.map_err(ScenarioError::IoError)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Self::read_json::<TriggerRecord>(&path) {
                Ok(record) if !record.trigger_id.is_empty() && record.run_id() == stem => {
                    runs.push(record)
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
            }
        }

        runs.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        runs.truncate(limit);
        Ok(runs)
    }
}
