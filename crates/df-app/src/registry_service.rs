//! Task registry access: every mutation is one locked load-modify-store cycle.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use df_project::{Region, RegionSpec, Registry, RunCase, validate_case_count};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

/// Serializes registry transactions within this process.
static REGISTRY_LOCK: Mutex<()> = Mutex::new(());

const LOCK_POLL: Duration = Duration::from_millis(10);

/// A lock file older than this belongs to a process that died holding it.
const STALE_LOCK_AGE: Duration = Duration::from_secs(60);

/// Exclusive lock file next to the registry; removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path, timeout: Duration) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let start = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                    if is_stale(path, STALE_LOCK_AGE) {
                        reclaim_stale(path);
                        continue;
                    }
                    if start.elapsed() > timeout {
                        return Err(AppError::LockTimeout {
                            path: path.to_path_buf(),
                        });
                    }
                    debug!(path = %path.display(), "registry lock busy, waiting");
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn is_stale(path: &Path, max_age: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > max_age)
}

/// Move a stale lock aside before deleting it.
///
/// The rename is atomic, so of several waiters only one gets the file. If the
/// file it got turns out to be a fresh lock (another waiter already reclaimed
/// and re-locked), it is linked back into place.
fn reclaim_stale(path: &Path) {
    let aside = path.with_extension(format!("stale-{}", uuid::Uuid::new_v4()));
    if std::fs::rename(path, &aside).is_err() {
        return;
    }
    if is_stale(&aside, STALE_LOCK_AGE) {
        warn!(path = %path.display(), "removed stale registry lock");
    } else {
        let _ = std::fs::hard_link(&aside, path);
    }
    let _ = std::fs::remove_file(&aside);
}

pub struct RegistryService<'a> {
    config: &'a AppConfig,
}

impl<'a> RegistryService<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.registry_path
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Run `f` while holding both the process and the file lock.
    fn transaction<T>(&self, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
        let _process = REGISTRY_LOCK.lock();
        let _file = LockFile::acquire(&self.config.lock_path(), self.config.lock_timeout)?;
        f()
    }

    fn load(&self) -> AppResult<Registry> {
        if !self.exists() {
            return Err(AppError::RegistryMissing {
                path: self.path().to_path_buf(),
            });
        }
        Ok(df_project::load_json(self.path())?)
    }

    pub fn get(&self) -> AppResult<Registry> {
        self.load()
    }

    pub fn get_case(&self, name: &str) -> AppResult<RunCase> {
        self.load()?
            .case(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownCase {
                name: name.to_string(),
            })
    }

    fn ensure_absent(&self) -> AppResult<()> {
        if self.exists() {
            return Err(AppError::RegistryExists {
                path: self.path().to_path_buf(),
            });
        }
        Ok(())
    }

    /// Create the registry with `count` cases of `case_type`.
    ///
    /// `case_type` may be any accepted spelling; it is normalized first.
    /// Every rejection happens before the lock is taken, so a failed call
    /// leaves the filesystem untouched.
    pub fn initialize(&self, case_type: &str, count: i64) -> AppResult<Registry> {
        let case_type = self.config.normalize_case_type(case_type);
        self.ensure_absent()?;
        if !self.config.is_supported(&case_type) {
            return Err(AppError::UnsupportedCaseType {
                case_type: case_type.to_string(),
            });
        }
        let count = validate_case_count(count)?;

        self.transaction(|| {
            self.ensure_absent()?;
            let defaults = self.config.case_defaults(&case_type);
            let registry = Registry::with_cases(&case_type, count, &defaults);
            df_project::save_json(self.path(), &registry)?;
            info!(
                case_type = %case_type,
                count,
                path = %self.path().display(),
                "initialized task registry"
            );
            Ok(registry)
        })
    }

    /// Apply `f` to one case and persist the whole registry.
    ///
    /// If `f` fails, or the case is unknown, the file is left untouched.
    pub fn mutate<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut RunCase) -> AppResult<T>,
    ) -> AppResult<T> {
        self.transaction(|| {
            let mut registry = self.load()?;
            let case = registry
                .case_mut(name)
                .ok_or_else(|| AppError::UnknownCase {
                    name: name.to_string(),
                })?;
            let out = f(case)?;
            df_project::save_json(self.path(), &registry)?;
            Ok(out)
        })
    }

    /// Validate `spec` and append it to the case's regions.
    pub fn add_region(&self, name: &str, spec: &RegionSpec) -> AppResult<Region> {
        let region = spec.validate()?;
        self.add_regions(name, vec![region.clone()])?;
        Ok(region)
    }

    /// Append already-validated regions, keeping their order.
    ///
    /// Returns the case's full region list as written by this transaction.
    pub fn add_regions(&self, name: &str, regions: Vec<Region>) -> AppResult<Vec<Region>> {
        let added = regions.len();
        let all = self.mutate(name, |case| {
            case.case_config.set_fields.regions.extend(regions);
            Ok(case.regions().to_vec())
        })?;
        info!(case = name, added, total = all.len(), "appended regions to registry");
        Ok(all)
    }
}
