use crate::error::ValidationError;
use crate::scanner::pattern::{to_forward_slash, PathPattern};
use glob::Pattern;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of subdirectories the survey must collect before traversal goes parallel.
    pub parallel_threshold: usize,
    /// Pool size for the parallel phase; `None` uses rayon's default.
    pub max_workers: Option<usize>,
    /// Also report the directory whose own name is the pattern.
    pub include_match_root: bool,
    /// Directories matching any of these are skipped along with their subtree.
    pub ignore_patterns: Vec<Pattern>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            parallel_threshold: 10,
            max_workers: None,
            include_match_root: false,
            ignore_patterns: Vec::new(),
        }
    }
}

pub fn compile_ignore_patterns(globs: &[String]) -> Result<Vec<Pattern>, ValidationError> {
    globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|e| ValidationError::InvalidIgnorePattern {
                pattern: glob.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Finds directories lying below a directory named after the pattern.
pub struct TreeScanner {
    matcher: Matcher,
    parallel_threshold: usize,
    max_workers: Option<usize>,
}

impl TreeScanner {
    pub fn new(pattern: PathPattern, options: ScanOptions) -> Self {
        TreeScanner {
            matcher: Matcher {
                pattern,
                include_match_root: options.include_match_root,
                ignore_patterns: options.ignore_patterns,
            },
            parallel_threshold: options.parallel_threshold,
            max_workers: options.max_workers,
        }
    }

    /// Never fails: unreadable roots and directories are logged and skipped.
    /// The result is de-duplicated and sorted by its forward-slash form.
    pub fn find_target_dirs<P: AsRef<Path>>(&self, roots: &[P]) -> Vec<PathBuf> {
        if roots.is_empty() {
            warn!("Empty root directory list provided");
            return Vec::new();
        }

        let valid_roots: Vec<PathBuf> = roots
            .iter()
            .map(|root| root.as_ref())
            .filter(|root| {
                if !root.exists() {
                    warn!("Root directory does not exist: {}", root.display());
                    false
                } else if !root.is_dir() {
                    warn!("Root path is not a directory: {}", root.display());
                    false
                } else {
                    true
                }
            })
            .map(Path::to_path_buf)
            .collect();

        if valid_roots.is_empty() {
            warn!("No valid root directories to process");
            return Vec::new();
        }

        let survey = Survey::run(&valid_roots, &self.matcher, self.parallel_threshold);
        let visitor = survey.into_visitor(valid_roots, self.max_workers);
        let found = visitor.visit(&self.matcher);

        let mut result: Vec<PathBuf> = found.into_iter().collect();
        result.sort_by_cached_key(|path| to_forward_slash(path));

        info!(
            "Found {} target director(ies) matching '{}' across {} root(s)",
            result.len(),
            self.matcher.pattern.as_str(),
            roots.len()
        );
        result
    }
}

/// One traversal strategy over the roots.
pub trait TreeVisitor {
    fn visit(&self, matcher: &Matcher) -> HashSet<PathBuf>;
}

/// Full descent from every root on the calling thread.
pub struct SequentialVisitor {
    roots: Vec<PathBuf>,
}

impl TreeVisitor for SequentialVisitor {
    fn visit(&self, matcher: &Matcher) -> HashSet<PathBuf> {
        debug!("Using sequential traversal over {} root(s)", self.roots.len());
        self.roots
            .iter()
            .flat_map(|root| matcher.descend(root))
            .collect()
    }
}

/// Matches the directories the survey already read, then descends each
/// frontier directory as an independent unit on a bounded pool.
pub struct ParallelVisitor {
    expanded: Vec<PathBuf>,
    frontier: Vec<PathBuf>,
    max_workers: Option<usize>,
}

impl TreeVisitor for ParallelVisitor {
    fn visit(&self, matcher: &Matcher) -> HashSet<PathBuf> {
        let mut found: HashSet<PathBuf> = self
            .expanded
            .iter()
            .filter(|dir| matcher.accepts(dir))
            .cloned()
            .collect();

        debug!(
            "Starting parallel traversal of {} branches with max_workers={:?}",
            self.frontier.len(),
            self.max_workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers.unwrap_or(0))
            .build();

        // Each unit returns its own list; the union happens after all units join.
        let per_branch: Vec<Vec<PathBuf>> = match pool {
            Ok(pool) => pool.install(|| {
                self.frontier
                    .par_iter()
                    .map(|branch| matcher.descend(branch))
                    .collect()
            }),
            Err(e) => {
                warn!("Could not build traversal pool, scanning sequentially: {}", e);
                self.frontier
                    .iter()
                    .map(|branch| matcher.descend(branch))
                    .collect()
            }
        };

        for branch in per_branch {
            found.extend(branch);
        }
        found
    }
}

/// Breadth-first measurement of the top of the tree.
struct Survey {
    expanded: Vec<PathBuf>,
    frontier: Vec<PathBuf>,
    collected: usize,
}

impl Survey {
    fn run(roots: &[PathBuf], matcher: &Matcher, threshold: usize) -> Survey {
        let mut expanded = Vec::new();
        let mut current: Vec<PathBuf> = roots
            .iter()
            .filter(|root| !matcher.is_ignored(root))
            .cloned()
            .collect();
        let mut collected = 0usize;

        debug!("Starting breadth-first survey (target: {} branches)", threshold);

        while !current.is_empty() && collected < threshold {
            let mut next_level = Vec::new();
            for dir in current.drain(..) {
                next_level.extend(matcher.subdirs(&dir));
                expanded.push(dir);
            }
            collected += next_level.len();
            current = next_level;
            debug!("Collected {} branches so far", collected);
        }

        Survey {
            expanded,
            frontier: current,
            collected,
        }
    }

    fn into_visitor(self, roots: Vec<PathBuf>, max_workers: Option<usize>) -> Box<dyn TreeVisitor> {
        if self.frontier.is_empty() {
            debug!(
                "Tree exhausted after {} branches, using sequential traversal",
                self.collected
            );
            Box::new(SequentialVisitor { roots })
        } else {
            Box::new(ParallelVisitor {
                expanded: self.expanded,
                frontier: self.frontier,
                max_workers,
            })
        }
    }
}

pub struct Matcher {
    pattern: PathPattern,
    include_match_root: bool,
    ignore_patterns: Vec<Pattern>,
}

impl Matcher {
    fn accepts(&self, dir: &Path) -> bool {
        self.pattern.accepts(dir, self.include_match_root)
    }

    fn is_ignored(&self, dir: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(dir))
    }

    /// Immediate subdirectories, without following symlinks. Unreadable
    /// directories and entries are logged and yield nothing.
    fn subdirs(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() == io::ErrorKind::PermissionDenied {
                    warn!("Permission denied accessing {}: {}", dir.display(), err);
                } else {
                    warn!("Error reading directory {}: {}", dir.display(), err);
                }
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Error reading entry in directory {}: {}", dir.display(), err);
                    None
                }
            })
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| !self.is_ignored(path))
            .collect()
    }

    /// Every accepted directory at or below `start`.
    fn descend(&self, start: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if self.is_ignored(start) {
            return found;
        }

        let mut stack = vec![start.to_path_buf()];
        while let Some(dir) = stack.pop() {
            stack.extend(self.subdirs(&dir));
            if self.accepts(&dir) {
                found.push(dir);
            }
        }
        found
    }
}
