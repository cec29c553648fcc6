//! Which cities have already been posted, and which one goes next.
//!
//! The used-id set is append-only: once an id is written it is never
//! selected again. Persisted as one integer per line; duplicates and blank
//! lines are tolerated because the file is always read back into a set.
//!
//! Storage sits behind [`UsedIdStore`] so the runner can be driven by the
//! in-memory [`MemoryUsedIdStore`] in tests and dry runs.

use crate::dataset::{CityId, CityRecord};
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{path}:{line}: not a city id: {content:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("All {total} cities in the dataset have already been used")]
    Exhausted { total: usize },
}

/// Durable record of posted city ids.
pub trait UsedIdStore {
    /// Read the full set of used ids.
    fn load(&self) -> Result<HashSet<CityId>, StoreError>;

    /// Record one more id as used.
    fn append(&self, id: CityId) -> Result<(), StoreError>;
}

/// Newline-delimited id file, e.g. `used.txt`.
#[derive(Debug, Clone)]
pub struct FileUsedIdStore {
    path: PathBuf,
}

impl FileUsedIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl UsedIdStore for FileUsedIdStore {
    /// A missing file means nothing has been posted yet.
    fn load(&self) -> Result<HashSet<CityId>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        parse_used_ids(&content).map_err(|(line, content)| StoreError::Parse {
            path: self.path.clone(),
            line,
            content,
        })
    }

    fn append(&self, id: CityId) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{id}").map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))
    }
}

/// Parse newline-delimited ids. On failure returns the 1-based line number
/// and its content.
fn parse_used_ids(content: &str) -> Result<HashSet<CityId>, (usize, String)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| line.parse::<CityId>().map_err(|_| (n, line.to_string())))
        .collect()
}

/// In-memory store. Seeded from the real file for dry runs so nothing is
/// written to disk.
#[derive(Debug, Default)]
pub struct MemoryUsedIdStore {
    appended: RefCell<Vec<CityId>>,
}

impl MemoryUsedIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = CityId>) -> Self {
        Self {
            appended: RefCell::new(ids.into_iter().collect()),
        }
    }

    /// Copy of `store`'s current set. Appends go to the copy only, which is
    /// what a dry run uses in place of the real file.
    pub fn snapshot_of(store: &dyn UsedIdStore) -> Result<Self, StoreError> {
        Ok(Self::with_ids(store.load()?))
    }

    /// Every id appended so far, in order, duplicates included.
    pub fn appended(&self) -> Vec<CityId> {
        self.appended.borrow().clone()
    }
}

impl UsedIdStore for MemoryUsedIdStore {
    fn load(&self) -> Result<HashSet<CityId>, StoreError> {
        Ok(self.appended().into_iter().collect())
    }

    fn append(&self, id: CityId) -> Result<(), StoreError> {
        self.appended.borrow_mut().push(id);
        Ok(())
    }
}

/// Number of candidates not yet used.
pub fn remaining(candidates: &[CityRecord], used: &HashSet<CityId>) -> usize {
    candidates.iter().filter(|c| !used.contains(&c.id)).count()
}

/// Pick one unused candidate uniformly at random.
///
/// Fails with [`SelectionError::Exhausted`] when every candidate id is in
/// `used`, including the empty-dataset case.
pub fn pick<'a, R: Rng>(
    candidates: &'a [CityRecord],
    used: &HashSet<CityId>,
    rng: &mut R,
) -> Result<&'a CityRecord, SelectionError> {
    let eligible: Vec<&CityRecord> = candidates
        .iter()
        .filter(|c| !used.contains(&c.id))
        .collect();

    if eligible.is_empty() {
        return Err(SelectionError::Exhausted {
            total: candidates.len(),
        });
    }
    let index = rng.random_range(0..eligible.len());
    Ok(eligible[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{city, springfield_trio};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    // =========================================================================
    // pick tests
    // =========================================================================

    #[test]
    fn pick_returns_only_unused_candidate() {
        let cities = springfield_trio();
        let used: HashSet<CityId> = [1, 2].into();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            assert_eq!(pick(&cities, &used, &mut rng).unwrap().id, 3);
        }
    }

    #[test]
    fn pick_never_returns_used_id() {
        let cities: Vec<CityRecord> = (1..=50).map(|id| city(id, "Town", "Ohio", None)).collect();
        let used: HashSet<CityId> = (1..=50).filter(|id| id % 3 != 0).collect();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let picked = pick(&cities, &used, &mut rng).unwrap();
            assert!(!used.contains(&picked.id));
        }
    }

    #[test]
    fn pick_reaches_every_eligible_candidate() {
        let cities: Vec<CityRecord> = (1..=5).map(|id| city(id, "Town", "Utah", None)).collect();
        let used = HashSet::new();
        let mut rng = StdRng::seed_from_u64(1);

        let seen: HashSet<CityId> = (0..200)
            .map(|_| pick(&cities, &used, &mut rng).unwrap().id)
            .collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn pick_exhausted_when_all_used() {
        let cities = springfield_trio();
        let used: HashSet<CityId> = [1, 2, 3].into();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            pick(&cities, &used, &mut rng),
            Err(SelectionError::Exhausted { total: 3 })
        );
    }

    #[test]
    fn pick_exhausted_on_empty_dataset() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            pick(&[], &HashSet::new(), &mut rng),
            Err(SelectionError::Exhausted { total: 0 })
        );
    }

    #[test]
    fn used_ids_outside_dataset_are_ignored() {
        let cities = springfield_trio();
        let used: HashSet<CityId> = [99, 100].into();
        assert_eq!(remaining(&cities, &used), 3);
    }

    #[test]
    fn remaining_counts_unused() {
        let cities = springfield_trio();
        assert_eq!(remaining(&cities, &HashSet::from([2])), 2);
        assert_eq!(remaining(&cities, &HashSet::from([1, 2, 3])), 0);
    }

    // =========================================================================
    // FileUsedIdStore tests
    // =========================================================================

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileUsedIdStore::new(tmp.path().join("used.txt"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn append_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileUsedIdStore::new(tmp.path().join("used.txt"));

        store.append(4).unwrap();
        store.append(17).unwrap();

        assert_eq!(store.load().unwrap(), HashSet::from([4, 17]));
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "4\n17\n");
    }

    #[test]
    fn append_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = FileUsedIdStore::new(tmp.path().join("state/bot/used.txt"));
        store.append(1).unwrap();
        assert_eq!(store.load().unwrap(), HashSet::from([1]));
    }

    #[test]
    fn duplicates_and_blank_lines_collapse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("used.txt");
        fs::write(&path, "3\n\n3\n  8 \n\n").unwrap();

        let store = FileUsedIdStore::new(&path);
        assert_eq!(store.load().unwrap(), HashSet::from([3, 8]));
    }

    #[test]
    fn append_never_rewrites_existing_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("used.txt");
        fs::write(&path, "5\n5\n").unwrap();

        let store = FileUsedIdStore::new(&path);
        store.append(5).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "5\n5\n5\n");
    }

    #[test]
    fn garbage_line_reports_line_number() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("used.txt");
        fs::write(&path, "1\n2\nthree\n").unwrap();

        let err = FileUsedIdStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Parse { line: 3, ref content, .. } if content == "three"
        ));
    }

    #[test]
    fn used_set_grows_monotonically() {
        let tmp = TempDir::new().unwrap();
        let store = FileUsedIdStore::new(tmp.path().join("used.txt"));
        let mut previous = store.load().unwrap();

        for id in [10, 20, 10, 30] {
            store.append(id).unwrap();
            let current = store.load().unwrap();
            assert!(current.is_superset(&previous));
            assert!(current.contains(&id));
            previous = current;
        }
    }

    // =========================================================================
    // MemoryUsedIdStore tests
    // =========================================================================

    #[test]
    fn memory_store_seeded_and_appended() {
        let store = MemoryUsedIdStore::with_ids([1, 2]);
        store.append(2).unwrap();
        store.append(3).unwrap();

        assert_eq!(store.appended(), vec![1, 2, 2, 3]);
        assert_eq!(store.load().unwrap(), HashSet::from([1, 2, 3]));
    }
}
