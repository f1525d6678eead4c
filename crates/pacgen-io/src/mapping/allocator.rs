//! Per-project PLC tag → %R register reconciliation
//!
//! Every project keeps a master map (`<project>_global_io_map.csv`) from PLC
//! tag to destination register. The master map is authoritative: a register
//! declared in the sheet only lands in the map for a tag the map has never
//! seen, and a sheet value that disagrees with the map is overridden with a
//! warning. Re-running the same sheet is therefore a fixed point.

use anyhow::{Context, Result};
use fslock::LockFile;
use log::{debug, info, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::names::project_stem;
use crate::SheetError;

/// Suffix of the per-project master map file
const MAP_FILE_SUFFIX: &str = "_global_io_map.csv";

/// Location of a project's master map inside `map_dir`
pub fn map_path_for(map_dir: &Path, project: &str) -> PathBuf {
    map_dir.join(format!("{}{MAP_FILE_SUFFIX}", project_stem(project)))
}

/// Outcome of reconciling one row against the master map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The row left the register blank; the map supplied it
    OnFile(String),
    /// The row agrees with the map
    Confirmed(String),
    /// The row disagrees with the map; the map value wins
    Conflict { declared: String, on_file: String },
    /// First sighting of the tag; the declared register was recorded
    Learned(String),
    /// Neither the row nor the map has a register
    Unresolved,
}

impl Resolution {
    /// The authoritative register, if any
    pub fn register(&self) -> Option<&str> {
        match self {
            Resolution::OnFile(register)
            | Resolution::Confirmed(register)
            | Resolution::Learned(register) => Some(register),
            Resolution::Conflict { on_file, .. } => Some(on_file),
            Resolution::Unresolved => None,
        }
    }
}

/// A sheet register that was overridden by the master map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub project: String,
    pub tag: String,
    pub declared: String,
    pub on_file: String,
}

/// Tag → register map of a single project, kept sorted by tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: BTreeMap<String, String>,
}

fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(&normalize(tag)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in tag order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(tag, reg)| (tag.as_str(), reg.as_str()))
    }

    /// Decide the register for `tag` given the register the row declares (may be empty)
    ///
    /// Only a tag the map has never seen can change the map. Blank tags are
    /// never recorded and never resolve.
    pub fn reconcile(&mut self, tag: &str, declared: &str) -> Resolution {
        let tag = normalize(tag);
        let declared = normalize(declared);

        if tag.is_empty() {
            return Resolution::Unresolved;
        }

        match self.entries.entry(tag) {
            Entry::Occupied(entry) => {
                let on_file = entry.get().clone();
                if declared.is_empty() {
                    Resolution::OnFile(on_file)
                } else if declared == on_file {
                    Resolution::Confirmed(on_file)
                } else {
                    Resolution::Conflict { declared, on_file }
                }
            }
            Entry::Vacant(entry) => {
                if declared.is_empty() {
                    Resolution::Unresolved
                } else {
                    entry.insert(declared.clone());
                    Resolution::Learned(declared)
                }
            }
        }
    }

    /// Load a master map; a missing file is an empty map
    ///
    /// The file is a headerless two-column CSV. Rows with an empty cell are
    /// ignored and both cells are upper-cased.
    pub fn load(path: &Path) -> Result<Self> {
        let mut table = MappingTable::new();
        if !path.exists() {
            return Ok(table);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open master map: {}", path.display()))?;

        for record in reader.records() {
            let record = record
                .with_context(|| format!("Failed to read master map: {}", path.display()))?;
            let tag = normalize(record.get(0).unwrap_or(""));
            let register = normalize(record.get(1).unwrap_or(""));
            if !tag.is_empty() && !register.is_empty() {
                table.entries.insert(tag, register);
            }
        }

        Ok(table)
    }

    /// Replace the master map at `path` with this table
    ///
    /// The table is written to a temporary file next to `path` and renamed
    /// into place, so readers only ever see a complete map.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create map directory: {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            for (tag, register) in &self.entries {
                writer.write_record([tag, register])?;
            }
            writer.flush()?;
        }

        tmp.persist(path)
            .with_context(|| format!("Failed to write master map: {}", path.display()))?;

        Ok(())
    }
}

/// A loaded project map plus the lock that keeps other runs off it
struct ProjectMap {
    path: PathBuf,
    table: MappingTable,
    _lock: LockFile,
}

/// Owns the master maps of every project touched in a run
///
/// Maps are loaded on first use and written back by [`RegisterAllocator::save`].
/// Projects are keyed by their file stem, so names that only differ in
/// characters the stem replaces (`Line 1`, `Line_1`) share one map.
pub struct RegisterAllocator {
    map_dir: PathBuf,
    projects: BTreeMap<String, ProjectMap>,
    conflicts: Vec<Conflict>,
}

impl RegisterAllocator {
    pub fn new(map_dir: impl Into<PathBuf>) -> Self {
        Self {
            map_dir: map_dir.into(),
            projects: BTreeMap::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn map_dir(&self) -> &Path {
        &self.map_dir
    }

    /// Resolve the register for `tag` in `project`, loading the project's map if needed
    pub fn resolve(&mut self, project: &str, tag: &str, declared: &str) -> Result<Resolution> {
        let map = self.ensure_loaded(project)?;
        let resolution = map.table.reconcile(tag, declared);

        if let Resolution::Conflict { declared, on_file } = &resolution {
            warn!(
                "{}: overriding sheet register {} with master map register {} ({})",
                tag.trim(),
                declared,
                on_file,
                project
            );
            self.conflicts.push(Conflict {
                project: project.to_string(),
                tag: normalize(tag),
                declared: declared.clone(),
                on_file: on_file.clone(),
            });
        }

        Ok(resolution)
    }

    fn ensure_loaded(&mut self, project: &str) -> Result<&mut ProjectMap> {
        match self.projects.entry(project_stem(project)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = map_path_for(&self.map_dir, project);
                let lock = acquire_lock(&self.map_dir, &path)?;
                let table = MappingTable::load(&path)?;
                debug!(
                    "Loaded {} master map entries for {} from {}",
                    table.len(),
                    project,
                    path.display()
                );
                Ok(entry.insert(ProjectMap {
                    path,
                    table,
                    _lock: lock,
                }))
            }
        }
    }

    /// The map of a project, if any of its rows were resolved
    pub fn table(&self, project: &str) -> Option<&MappingTable> {
        self.projects.get(&project_stem(project)).map(|map| &map.table)
    }

    /// File stems of the projects whose maps are loaded, in order
    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    /// Every conflict seen so far, in row order
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Write every loaded map back to disk and release the locks
    ///
    /// The `.lock` files stay in the map directory and are reused by later runs.
    pub fn save(self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.projects.len());

        for (project, map) in self.projects {
            map.table.save(&map.path)?;
            info!(
                "Master map for {} updated: {} ({} entries)",
                project,
                map.path.display(),
                map.table.len()
            );
            written.push(map.path);
        }

        Ok(written)
    }
}

fn acquire_lock(map_dir: &Path, map_path: &Path) -> Result<LockFile> {
    fs::create_dir_all(map_dir)
        .with_context(|| format!("Failed to create map directory: {}", map_dir.display()))?;

    let lock_path = map_path.with_extension("lock");
    let mut lock = LockFile::open(lock_path.as_path())
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

    let acquired = lock
        .try_lock()
        .with_context(|| format!("Failed to lock: {}", lock_path.display()))?;
    if !acquired {
        return Err(SheetError::TableLocked(map_path.to_path_buf()).into());
    }

    Ok(lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(entries: &[(&str, &str)]) -> MappingTable {
        let mut table = MappingTable::new();
        for (tag, register) in entries {
            table.reconcile(tag, register);
        }
        table
    }

    #[test]
    fn test_blank_register_uses_map() {
        let mut map = table(&[("%I00001", "%R01001")]);
        assert_eq!(
            map.reconcile(" %i00001 ", ""),
            Resolution::OnFile("%R01001".to_string())
        );
    }

    #[test]
    fn test_conflict_keeps_map_value() {
        let mut map = table(&[("%I00001", "%R01001")]);
        let resolution = map.reconcile("%I00001", "%R02002");

        assert_eq!(
            resolution,
            Resolution::Conflict {
                declared: "%R02002".to_string(),
                on_file: "%R01001".to_string(),
            }
        );
        assert_eq!(resolution.register(), Some("%R01001"));
        assert_eq!(map.get("%I00001"), Some("%R01001"));
    }

    #[test]
    fn test_new_tag_is_learned() {
        let mut map = MappingTable::new();
        assert_eq!(
            map.reconcile("%q00005", "%r01005"),
            Resolution::Learned("%R01005".to_string())
        );
        assert_eq!(map.get("%Q00005"), Some("%R01005"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_matching_register_is_confirmed() {
        let mut map = table(&[("%I00001", "%R01001")]);
        assert_eq!(
            map.reconcile("%I00001", "%r01001"),
            Resolution::Confirmed("%R01001".to_string())
        );
    }

    #[test]
    fn test_unresolved_leaves_map_alone() {
        let mut map = MappingTable::new();
        assert_eq!(map.reconcile("%I00009", "  "), Resolution::Unresolved);
        assert_eq!(map.reconcile("%I00009", "").register(), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_blank_tag_is_never_recorded() {
        let mut map = MappingTable::new();
        assert_eq!(map.reconcile("  ", "%R00001"), Resolution::Unresolved);
        assert_eq!(map.reconcile("", ""), Resolution::Unresolved);
        assert!(map.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let rows = [
            ("%I00001", "%R01001"),
            ("%I00002", ""),
            ("%Q00001", "%R01100"),
            ("%I00001", ""),
        ];

        let mut map = MappingTable::new();
        for (tag, register) in rows {
            map.reconcile(tag, register);
        }
        let first_pass = map.clone();

        let conflicts = rows
            .iter()
            .map(|(tag, register)| map.reconcile(tag, register))
            .filter(|r| matches!(r, Resolution::Conflict { .. }))
            .count();

        assert_eq!(map, first_pass);
        assert_eq!(conflicts, 0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("maps").join("P_global_io_map.csv");

        let map = table(&[("%q00002", "%r01002"), ("%I00001", "%R01001")]);
        map.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec!["%I00001,%R01001", "%Q00002,%R01002"]
        );

        let loaded = MappingTable::load(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_load_skips_incomplete_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.csv");
        fs::write(&path, " %i1 , %r1 \n%I2,\n,%R3\n%I4\n").unwrap();

        let loaded = MappingTable::load(&path).unwrap();
        assert_eq!(loaded.iter().collect::<Vec<_>>(), vec![("%I1", "%R1")]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = MappingTable::load(&dir.path().join("absent.csv")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_allocator_records_conflicts_and_persists() {
        let dir = TempDir::new().unwrap();

        let mut allocator = RegisterAllocator::new(dir.path());
        allocator.resolve("Line 1", "%I00001", "%R01001").unwrap();
        let resolution = allocator.resolve("Line 1", "%I00001", "%R05555").unwrap();
        assert_eq!(resolution.register(), Some("%R01001"));
        assert_eq!(
            allocator.conflicts(),
            &[Conflict {
                project: "Line 1".to_string(),
                tag: "%I00001".to_string(),
                declared: "%R05555".to_string(),
                on_file: "%R01001".to_string(),
            }]
        );

        let written = allocator.save().unwrap();
        assert_eq!(written, vec![dir.path().join("Line_1_global_io_map.csv")]);

        // The next run starts from the persisted map
        let mut allocator = RegisterAllocator::new(dir.path());
        assert_eq!(
            allocator.resolve("Line 1", "%I00001", "").unwrap(),
            Resolution::OnFile("%R01001".to_string())
        );
        assert!(allocator.conflicts().is_empty());
    }

    #[test]
    fn test_projects_are_isolated() {
        let dir = TempDir::new().unwrap();

        let mut allocator = RegisterAllocator::new(dir.path());
        allocator.resolve("A", "%I00001", "%R00001").unwrap();
        assert_eq!(
            allocator.resolve("B", "%I00001", "").unwrap(),
            Resolution::Unresolved
        );
        assert_eq!(allocator.projects().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(allocator.table("B").unwrap().is_empty());
    }

    #[test]
    fn test_projects_with_same_stem_share_a_map() {
        let dir = TempDir::new().unwrap();

        let mut allocator = RegisterAllocator::new(dir.path());
        allocator.resolve("Line 1", "%I00001", "%R01001").unwrap();
        allocator.resolve("Line_1", "%I00002", "%R01002").unwrap();
        assert_eq!(
            allocator.resolve("Line/1", "%I00001", "").unwrap(),
            Resolution::OnFile("%R01001".to_string())
        );
        assert_eq!(allocator.projects().collect::<Vec<_>>(), vec!["Line_1"]);

        let written = allocator.save().unwrap();
        assert_eq!(written, vec![dir.path().join("Line_1_global_io_map.csv")]);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec!["%I00001,%R01001", "%I00002,%R01002"]
        );
    }

    #[test]
    fn test_locked_map_is_fatal() {
        let dir = TempDir::new().unwrap();

        let mut first = RegisterAllocator::new(dir.path());
        first.resolve("P", "%I00001", "%R00001").unwrap();

        let mut second = RegisterAllocator::new(dir.path());
        let err = second.resolve("P", "%I00001", "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SheetError>(),
            Some(SheetError::TableLocked(_))
        ));

        // Released once the first run has saved; the lock file stays for reuse
        first.save().unwrap();
        assert!(dir.path().join("P_global_io_map.lock").exists());
        let mut third = RegisterAllocator::new(dir.path());
        assert_eq!(
            third.resolve("P", "%I00001", "").unwrap().register(),
            Some("%R00001")
        );
    }
}
