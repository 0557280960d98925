use async_trait::async_trait;
use cardcade_core::{repo::Repository, Card, CardId, CoreError, ReviewLog};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: Vec<Card>,
    reviews: Vec<ReviewLog>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: HashMap<CardId, Card>,
    reviews: Vec<ReviewLog>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            cards: HashMap::new(),
            reviews: Vec::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut cards: Vec<Card> = self.cards.values().cloned().collect();
        cards.sort_by_key(|c| (c.created_at, c.id));
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cards,
            reviews: self.reviews.clone(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            cards: img.cards.into_iter().map(|c| (c.id, c)).collect(),
            reviews: img.reviews,
        }
    }
}

/// Card store backed by a single JSON file.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // Serializes commits so each one starts from the last persisted state.
    writer: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    /// Opens the store at `path`, next to a `backups` directory.
    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let backups = path
            .parent()
            .map(|p| p.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        Self::open_with(path, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let max_backups = max_backups.max(1);
        let state = load_or_init(&path, &backups_dir, max_backups).await?;
        debug!(path = %path.display(), cards = state.cards.len(), "opened json store");
        Ok(Self {
            path,
            backups_dir,
            max_backups,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the state, writes that copy, and only then makes it
    /// visible. A failed change or write leaves the store untouched.
    async fn commit<T, F>(&self, change: F) -> Result<T, CoreError>
    where
        T: Send,
        F: FnOnce(&mut State) -> Result<T, CoreError> + Send,
    {
        let _writer = self.writer.lock().await;
        let mut next = self.state.read().clone();
        let out = change(&mut next)?;
        next.updated_at = Utc::now();

        let snapshot = next.to_image();
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;
        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|e| {
                warn!(error = %e, "json store writer task failed");
                CoreError::Storage("io")
            })?
            .map_err(|e| {
                warn!(error = %e, "json store write failed");
                CoreError::Storage("io")
            })?;

        *self.state.write() = next;
        debug!(path = %self.path.display(), "saved json store");
        Ok(out)
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "cannot create directory");
        CoreError::Storage("io")
    })
}

async fn load_or_init(path: &Path, backups: &Path, keep: usize) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let img = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(img)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))?
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot read json store");
            CoreError::Storage("corrupt store file")
        })?;
        if img.version != FILE_VERSION {
            return Err(CoreError::Storage("unsupported store version"));
        }
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        write_with_backup(path, backups, keep, &st.to_image()).map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot create json store");
            CoreError::Storage("io")
        })?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;

    // Backup first: the store file is only replaced once the backup is on disk.
    let ts = Utc::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("cardcade-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path)?;

    if let Err(e) = rotate_backups(backups_dir, max_backups) {
        warn!(dir = %backups_dir.display(), error = %e, "backup rotation failed");
    }
    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Timestamped names sort chronologically.
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl Repository for JsonStore {
    async fn add_card(&self, front: &str, back: &str) -> Result<Card, CoreError> {
        let card = Card::new(front, back);
        self.commit(|s| {
            s.cards.insert(card.id, card.clone());
            Ok(())
        })
        .await?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        Ok(s.cards.values().cloned().collect())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        self.commit(|s| {
            if s.cards.remove(&id).is_none() {
                return Err(CoreError::NotFound("card"));
            }
            s.reviews.retain(|r| r.card_id != id);
            Ok(())
        })
        .await
    }

    async fn record_review(&self, card: &Card, log: &ReviewLog) -> Result<(), CoreError> {
        if card.id != log.card_id {
            return Err(CoreError::Conflict("log belongs to another card"));
        }
        self.commit(|s| {
            if !s.cards.contains_key(&card.id) {
                return Err(CoreError::NotFound("card"));
            }
            s.cards.insert(card.id, card.clone());
            s.reviews.push(log.clone());
            Ok(())
        })
        .await
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewLog>, CoreError> {
        Ok(self.state.read().reviews.clone())
    }

    async fn list_reviews_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, CoreError> {
        let s = self.state.read();
        Ok(s.reviews
            .iter()
            .filter(|r| r.card_id == card_id)
            .cloned()
            .collect())
    }
}
