//! Guarded, idempotent patching of vendored framework sources.
//!
//! Each target file is rewritten at most once: a sentinel marker comment is
//! prepended on the first run, and any file already carrying it is left alone.

pub mod rules;

use crate::build::BuildContext;
use crate::error::PatchError;
use crate::models::{PatchMode, PatchOutcome};
use std::fs;
use std::path::{Path, PathBuf};

pub use rules::PatchSet;

/// Result type for patching operations
pub type PatchResult<T> = std::result::Result<T, PatchError>;

/// Content after applying a patch set, before it is written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedContent {
    pub content: String,
    /// Total number of literal replacements across all rules.
    pub replacements: usize,
    /// Search literals that did not occur in the input.
    pub unmatched_rules: Vec<String>,
}

/// Applies a [`PatchSet`] to files inside a resolved package directory.
#[derive(Debug, Clone)]
pub struct SourcePatcher {
    set: PatchSet,
    mode: PatchMode,
}

impl SourcePatcher {
    pub fn new(set: PatchSet) -> Self {
        SourcePatcher {
            set,
            mode: PatchMode::Apply,
        }
    }

    pub fn with_mode(mut self, mode: PatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn patch_set(&self) -> &PatchSet {
        &self.set
    }

    /// Absolute paths of every file this patch set touches.
    pub fn targets(&self, ctx: &BuildContext) -> PatchResult<Vec<PathBuf>> {
        let package_dir = ctx.package_dir(&self.set.package)?;
        let lib_dir = package_dir.join(&self.set.subdir);
        Ok(self.set.files.iter().map(|f| lib_dir.join(f)).collect())
    }

    /// Apply every rule in order and prepend the marker line.
    ///
    /// Does not check for the marker; callers decide whether patching is due.
    pub fn patch_content(&self, original: &str) -> PatchedContent {
        let mut content = original.to_string();
        let mut replacements = 0usize;
        let mut unmatched_rules = Vec::new();

        for rule in &self.set.rules {
            let hits = content.matches(rule.search.as_str()).count();
            if hits == 0 {
                unmatched_rules.push(rule.search.clone());
                continue;
            }
            content = content.replace(rule.search.as_str(), &rule.replace);
            replacements += hits;
        }

        PatchedContent {
            content: format!("{}{}", self.set.marker_line(), content),
            replacements,
            unmatched_rules,
        }
    }

    /// Patch a single file in place.
    pub fn patch_file(&self, path: &Path) -> PatchResult<PatchOutcome> {
        let mut outcomes = self.run(vec![path.to_path_buf()])?;
        Ok(outcomes
            .pop()
            .map(|(_, outcome)| outcome)
            .unwrap_or(PatchOutcome::Missing))
    }

    /// Patch every target of this set. Missing files are skipped; other
    /// failures stop the run.
    pub fn apply(&self, ctx: &BuildContext) -> PatchResult<Vec<(PathBuf, PatchOutcome)>> {
        let targets = self.targets(ctx)?;
        self.run(targets)
    }

    /// Read and patch every target in memory, check the rules against the
    /// whole set, then write. Nothing is written when the check fails.
    fn run(&self, targets: Vec<PathBuf>) -> PatchResult<Vec<(PathBuf, PatchOutcome)>> {
        let mut planned = Vec::with_capacity(targets.len());
        for path in targets {
            let plan = self.plan_file(&path)?;
            planned.push((path, plan));
        }

        self.check_rules(&planned)?;

        let mut outcomes = Vec::with_capacity(planned.len());
        for (path, plan) in planned {
            let outcome = match plan {
                Planned::Missing => PatchOutcome::Missing,
                Planned::AlreadyPatched(_) => PatchOutcome::AlreadyPatched,
                Planned::Pending { original, patched } => self.commit(&path, &original, patched)?,
            };
            outcomes.push((path, outcome));
        }

        Ok(outcomes)
    }

    fn plan_file(&self, path: &Path) -> PatchResult<Planned> {
        if !path.exists() {
            log::warn!(
                "[Patcher] Warning: Could not find file to patch at {}",
                path.display()
            );
            return Ok(Planned::Missing);
        }

        let original = fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if original.contains(&self.set.marker) {
            log::debug!("[Patcher] {} already patched, skipping", path.display());
            return Ok(Planned::AlreadyPatched(original));
        }

        let patched = self.patch_content(&original);
        Ok(Planned::Pending { original, patched })
    }

    /// A rule is unmatched only if no pending target contains its search
    /// literal and no already-patched target contains its replacement.
    fn check_rules(&self, planned: &[(PathBuf, Planned)]) -> PatchResult<()> {
        let pending: Vec<(&PathBuf, &PatchedContent)> = planned
            .iter()
            .filter_map(|(path, plan)| match plan {
                Planned::Pending { patched, .. } => Some((path, patched)),
                _ => None,
            })
            .collect();

        let Some((first_path, _)) = pending.first() else {
            return Ok(());
        };

        for rule in &self.set.rules {
            let hit_pending = pending
                .iter()
                .any(|(_, patched)| !patched.unmatched_rules.contains(&rule.search));
            let hit_done = planned.iter().any(|(_, plan)| {
                matches!(plan, Planned::AlreadyPatched(content) if content.contains(&rule.replace))
            });
            if hit_pending || hit_done {
                continue;
            }

            let dir = first_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| first_path.to_path_buf());
            if self.set.strict {
                return Err(PatchError::PatternNotFound {
                    path: dir,
                    pattern: rule.search.clone(),
                });
            }
            log::warn!(
                "[Patcher] Pattern {:?} not found in any target under {}; upstream source may have changed",
                rule.search,
                dir.display()
            );
        }

        Ok(())
    }

    fn commit(&self, path: &Path, original: &str, patched: PatchedContent) -> PatchResult<PatchOutcome> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if self.mode == PatchMode::DryRun {
            log::info!(
                "[Patcher] [DRY-RUN] Would patch {} ({} replacements)",
                file_name,
                patched.replacements
            );
            return Ok(PatchOutcome::WouldPatch {
                replacements: patched.replacements,
                unmatched_rules: patched.unmatched_rules,
            });
        }

        if self.set.backup {
            let backup_path = backup_path_for(path);
            fs::write(&backup_path, original).map_err(|source| PatchError::Io {
                path: backup_path.clone(),
                source,
            })?;
            log::debug!("[Patcher] Backup written to {}", backup_path.display());
        }

        fs::write(path, &patched.content).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[Patcher] Patched {}", file_name);

        Ok(PatchOutcome::Patched {
            replacements: patched.replacements,
            unmatched_rules: patched.unmatched_rules,
        })
    }
}

/// Per-target state between reading and writing.
enum Planned {
    Missing,
    /// Holds the current content, already carrying the marker.
    AlreadyPatched(String),
    Pending {
        original: String,
        patched: PatchedContent,
    },
}

/// `<file>.orig` alongside the original.
fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".orig");
    PathBuf::from(name)
}
