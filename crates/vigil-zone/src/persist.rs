use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::info;
use vigil_proto::{GuardError, Result};

use crate::ZoneStore;

/// Byte storage behind SAVE_ZONES / LOAD_ZONES. `read` returns `None` when
/// nothing was ever saved; that is not an error.
pub trait ZoneRepository: Send {
    fn read(&self) -> Result<Option<Vec<u8>>>;
    fn write(&self, bytes: &[u8]) -> Result<()>;
    fn describe(&self) -> String;
}

pub struct FileZoneRepository {
    path: PathBuf,
}

impl FileZoneRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ZoneRepository for FileZoneRepository {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(b) => Ok(Some(b)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("zones: no zone file at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(GuardError::Storage(format!("read {}: {}", self.path.display(), e))),
        }
    }

    // write to a sibling then rename, so a crash never leaves half a file
    fn write(&self, bytes: &[u8]) -> Result<()> {
        let storage = |e: std::io::Error| GuardError::Storage(format!("write {}: {}", self.path.display(), e));
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(storage)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(storage)?;
        std::fs::rename(&tmp, &self.path).map_err(storage)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process repository, for tests and for running without a zone file.
#[derive(Default)]
pub struct MemoryZoneRepository {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: Mutex::new(Some(bytes.into())) }
    }
}

impl ZoneRepository for MemoryZoneRepository {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        let guard = self.bytes.lock().map_err(|_| GuardError::Storage("memory repository poisoned".into()))?;
        Ok(guard.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.bytes.lock().map_err(|_| GuardError::Storage("memory repository poisoned".into()))?;
        *guard = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// Load persisted zones into `store`. Missing data leaves the store as is and
/// reports zero zones loaded.
pub fn load_into(repo: &dyn ZoneRepository, store: &mut ZoneStore) -> Result<usize> {
    match repo.read()? {
        Some(bytes) => store.load(&bytes),
        None => Ok(0),
    }
}

pub fn save_from(repo: &dyn ZoneRepository, store: &ZoneStore) -> Result<usize> {
    let bytes = store.save()?;
    repo.write(&bytes)?;
    info!("zones: saved {} zones to {}", store.zones().len(), repo.describe());
    Ok(store.zones().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_proto::Point;

    fn triangle_store() -> ZoneStore {
        let mut s = ZoneStore::new();
        for (x, y) in [(0, 0), (40, 0), (0, 40)] {
            s.add_point(Point::new(x, y));
        }
        s.close_zone();
        s
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = FileZoneRepository::new(tmp.path().join("zones.json"));
        let mut store = triangle_store();
        assert_eq!(load_into(&repo, &mut store).unwrap(), 0);
        assert_eq!(store.zones().len(), 1);
    }

    #[test]
    fn file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = FileZoneRepository::new(tmp.path().join("nested/zones.json"));
        let store = triangle_store();
        assert_eq!(save_from(&repo, &store).unwrap(), 1);

        let mut restored = ZoneStore::new();
        assert_eq!(load_into(&repo, &mut restored).unwrap(), 1);
        assert_eq!(restored.zones(), store.zones());
        assert!(!repo.path().with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_reports_corrupt_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("zones.json");
        std::fs::write(&path, "[[[1,").unwrap();
        let repo = FileZoneRepository::new(&path);
        let mut store = triangle_store();
        let err = load_into(&repo, &mut store).unwrap_err();
        assert!(matches!(err, GuardError::CorruptData(_)));
        assert_eq!(store.zones().len(), 1);
    }

    #[test]
    fn memory_repository_round_trip() {
        let repo = MemoryZoneRepository::new();
        assert!(repo.read().unwrap().is_none());
        save_from(&repo, &triangle_store()).unwrap();
        let mut restored = ZoneStore::new();
        assert_eq!(load_into(&repo, &mut restored).unwrap(), 1);
    }
}
