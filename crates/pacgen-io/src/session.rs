//! Generation session: per-run output buffers fed by the register allocator

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::emit::{emit_init_st, emit_map_st, write_import_csv};
use crate::mapping::{
    esc_comment, project_stem, register_symbol, st_safe, DataType, IoDirection, RegisterAllocator,
    Resolution, WordLiteral,
};
use crate::parser::IoRow;

/// One mirror statement in the mapping routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub direction: IoDirection,
    pub data_type: DataType,
    /// Sanitized symbol of the I/O point
    pub tag_symbol: String,
    /// Register symbol without `%`
    pub register: String,
    /// Comment-safe description
    pub description: String,
}

/// A %R variable declared by the import file and preset by the init block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterVar {
    /// Register symbol without `%` (e.g. "R01019")
    pub symbol: String,
    /// Register address (e.g. "%R01019")
    pub address: String,
    /// Symbol of the I/O point it mirrors
    pub tag_symbol: String,
    pub data_type: DataType,
    pub initial_value: String,
}

/// Generated content for one project
#[derive(Debug, Clone, Default)]
pub struct ProjectOutput {
    /// Project name as first seen in the sheet
    pub name: String,
    pub assignments: Vec<Assignment>,
    /// Register variables keyed by symbol; a later row for the same register wins
    pub registers: BTreeMap<String, RegisterVar>,
}

impl ProjectOutput {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// File stem for this project's artifacts
    pub fn stem(&self) -> String {
        project_stem(&self.name)
    }
}

/// What happened to a single sheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Assignment and register variable generated
    Emitted,
    /// Data type other than BOOL/INT/WORD/STRING
    UnsupportedType,
    /// Tag cell was blank
    BlankTag,
    /// Tag outside the known I/O areas
    UnknownArea,
    /// No register in the sheet or the master map
    Unresolved,
}

/// Per-project counts reported after a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub assignments: usize,
    pub registers: usize,
}

/// Counts and files of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub emitted: usize,
    pub skipped: usize,
    pub unresolved: usize,
    pub conflicts: usize,
    pub learned: usize,
    pub projects: Vec<ProjectSummary>,
    /// Generated artifacts, in write order
    pub outputs: Vec<PathBuf>,
    /// Master maps that were rewritten
    pub maps: Vec<PathBuf>,
}

/// State of one generator run
///
/// Rows are reconciled and rendered into memory; nothing touches the output
/// directory until [`IoSession::finish`].
pub struct IoSession {
    allocator: RegisterAllocator,
    word_literal: WordLiteral,
    /// Keyed by file stem, matching the allocator
    projects: BTreeMap<String, ProjectOutput>,
    summary: RunSummary,
}

impl IoSession {
    pub fn new(map_dir: impl Into<PathBuf>, word_literal: WordLiteral) -> Self {
        Self {
            allocator: RegisterAllocator::new(map_dir),
            word_literal,
            projects: BTreeMap::new(),
            summary: RunSummary::default(),
        }
    }

    /// Reconcile one row and buffer its generated code
    ///
    /// Data-quality problems skip the row; only map I/O errors are returned.
    pub fn process_row(&mut self, row: &IoRow) -> Result<RowOutcome> {
        self.summary.rows += 1;
        let outcome = self.process(row)?;

        match outcome {
            RowOutcome::Emitted => self.summary.emitted += 1,
            RowOutcome::Unresolved => self.summary.unresolved += 1,
            _ => self.summary.skipped += 1,
        }

        Ok(outcome)
    }

    fn process(&mut self, row: &IoRow) -> Result<RowOutcome> {
        let Some(data_type) = DataType::parse(&row.data_type) else {
            debug!("Row {}: skipping unsupported type {:?}", row.record, row.data_type);
            return Ok(RowOutcome::UnsupportedType);
        };

        let output = self
            .projects
            .entry(project_stem(&row.project))
            .or_insert_with(|| ProjectOutput::new(&row.project));

        let tag = row.tag.to_uppercase();
        if tag.is_empty() {
            debug!("Row {}: skipping row without PLC tag", row.record);
            return Ok(RowOutcome::BlankTag);
        }

        let resolution = self.allocator.resolve(&row.project, &tag, &row.register)?;
        match resolution {
            Resolution::Learned(_) => self.summary.learned += 1,
            Resolution::Conflict { .. } => self.summary.conflicts += 1,
            _ => {}
        }

        let Some(direction) = IoDirection::from_tag(&tag) else {
            debug!("Row {}: skipping {} in unknown I/O area", row.record, row.tag);
            return Ok(RowOutcome::UnknownArea);
        };

        let tag_symbol = st_safe(&row.name);
        let address = resolution.register().unwrap_or("");
        let symbol = register_symbol(address);

        if symbol.is_empty() {
            warn!(
                "{}: no R-address for {} ({}); row skipped",
                row.project, row.tag, tag_symbol
            );
            return Ok(RowOutcome::Unresolved);
        }

        output.assignments.push(Assignment {
            direction,
            data_type,
            tag_symbol: tag_symbol.clone(),
            register: symbol.clone(),
            description: esc_comment(&row.description),
        });

        output.registers.insert(
            symbol.clone(),
            RegisterVar {
                symbol,
                address: address.to_string(),
                tag_symbol,
                data_type,
                initial_value: row.initial_value.clone(),
            },
        );

        Ok(RowOutcome::Emitted)
    }

    pub fn project(&self, name: &str) -> Option<&ProjectOutput> {
        self.projects.get(&project_stem(name))
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectOutput> {
        self.projects.values()
    }

    pub fn allocator(&self) -> &RegisterAllocator {
        &self.allocator
    }

    /// Write every project's artifacts into `out_dir`, then the updated master maps
    pub fn finish(self, out_dir: &Path) -> Result<RunSummary> {
        let IoSession {
            allocator,
            word_literal,
            projects,
            mut summary,
        } = self;

        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

        for project in projects.values() {
            let stem = project.stem();

            let map_path = out_dir.join(format!("{stem}_map.st"));
            write_output(&map_path, emit_map_st(project).as_bytes())?;

            let import_path = out_dir.join(format!("{stem}_Rvars.csv"));
            let mut import = Vec::new();
            write_import_csv(&mut import, project.registers.values())?;
            write_output(&import_path, &import)?;

            let init_path = out_dir.join(format!("{stem}_init.st"));
            write_output(&init_path, emit_init_st(project, word_literal).as_bytes())?;

            summary.outputs.extend([map_path, import_path, init_path]);
            summary.projects.push(ProjectSummary {
                name: project.name.clone(),
                assignments: project.assignments.len(),
                registers: project.registers.len(),
            });
        }

        summary.maps = allocator.save()?;
        Ok(summary)
    }
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}
