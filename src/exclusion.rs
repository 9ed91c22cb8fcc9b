/*!
 * Exclusion rules consulted by the tree walker
 */

use std::path::{Path, PathBuf};

use glob_match::glob_match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::Config;
use crate::error::Result;
use crate::error;

/// Directory names that are never descended into
pub const EXCLUDED_DIRS: &[&str] = &[
    // Version Control
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    // Python
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    ".eggs",
    "*.egg-info",
    ".ipynb_checkpoints",
    // Virtual Environments
    "venv",
    ".venv",
    "env",
    "virtualenv",
    // Dependencies
    "node_modules",
    "bower_components",
    ".pnpm-store",
    ".yarn",
    // IDEs & Editors
    ".idea",
    ".vscode",
    ".vs",
    // Build & Dist
    "dist",
    "build",
    "target",
    "out",
    ".next",
    ".nuxt",
    ".output",
    ".gradle",
    // Caches
    ".cache",
    "coverage",
    ".nyc_output",
    ".sass-cache",
    ".terraform",
];

/// File name patterns that are never emitted
pub const EXCLUDED_FILES: &[&str] = &[
    // Compiled artifacts
    "*.pyc",
    "*.pyo",
    "*.pyd",
    "*.so",
    "*.dll",
    "*.dylib",
    "*.o",
    "*.a",
    "*.class",
    "*.exe",
    "*.tsbuildinfo",
    // Lock files
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
    "Cargo.lock",
    "composer.lock",
    // Minified bundles
    "*.min.js",
    "*.min.css",
    // OS Files
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Editor artifacts
    "*.swp",
    "*.swo",
    "*~",
    // Logs
    "*.log",
];

/// Name and path based exclusion rules for one run
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    /// User supplied glob patterns, applied to files and directories
    extra_patterns: Vec<String>,
    /// Matcher for the root .gitignore, when enabled
    gitignore: Option<Gitignore>,
    /// Absolute paths that must never be emitted, such as the destination file
    skip_paths: Vec<PathBuf>,
}

impl ExclusionSet {
    /// Exclusion set with only the built-in tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the exclusion set for a run rooted at the canonical `root`
    pub fn from_config(config: &Config, root: &Path) -> Result<Self> {
        let mut set = Self::new().with_patterns(config.ignore_patterns.clone());

        if config.respect_gitignore {
            set.gitignore = load_gitignore(root)?;
        }

        if let Some(output) = resolve_output_path(&config.output_file) {
            set.skip_paths.push(output);
        }

        Ok(set)
    }

    /// Add user glob patterns
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.extra_patterns
            .extend(patterns.into_iter().filter(|p| !p.trim().is_empty()));
        self
    }

    /// Never emit the given absolute path
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Check whether a directory must be skipped along with its subtree
    pub fn excludes_dir(&self, path: &Path) -> bool {
        let name = file_name(path);
        matches_any(EXCLUDED_DIRS, &name) || self.excludes_common(path, &name, true)
    }

    /// Check whether a file must be skipped
    pub fn excludes_file(&self, path: &Path) -> bool {
        let name = file_name(path);
        matches_any(EXCLUDED_FILES, &name) || self.excludes_common(path, &name, false)
    }

    fn excludes_common(&self, path: &Path, name: &str, is_dir: bool) -> bool {
        if self.extra_patterns.iter().any(|p| glob_match(p, name)) {
            return true;
        }

        if let Some(gitignore) = &self.gitignore {
            if gitignore.matched(path, is_dir).is_ignore() {
                return true;
            }
        }

        self.skip_paths.iter().any(|p| p == path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Match a name against a static pattern table
fn matches_any(table: &[&str], name: &str) -> bool {
    table.iter().any(|&pattern| {
        if pattern.contains('*') {
            glob_match(pattern, name)
        } else {
            pattern == name
        }
    })
}

/// Load the root .gitignore, if there is one
fn load_gitignore(root: &Path) -> Result<Option<Gitignore>> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&path) {
        return Err(error!(Pattern, "{}: {}", path.display(), err));
    }

    let gitignore = builder
        .build()
        .map_err(|e| error!(Pattern, "{}: {}", path.display(), e))?;
    log::debug!(
        "Loaded {} rules from {}",
        gitignore.num_ignores() + gitignore.num_whitelists(),
        path.display()
    );

    Ok(Some(gitignore))
}

/// Absolute form of the destination path, whether or not it exists yet
fn resolve_output_path(output: &Path) -> Option<PathBuf> {
    if let Ok(path) = output.canonicalize() {
        return Some(path);
    }

    let name = output.file_name()?;
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    parent.canonicalize().ok().map(|p| p.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_directories() {
        let set = ExclusionSet::new();
        assert!(set.excludes_dir(Path::new("/repo/.git")));
        assert!(set.excludes_dir(Path::new("/repo/pkg/__pycache__")));
        assert!(set.excludes_dir(Path::new("/repo/my_pkg.egg-info")));
        assert!(!set.excludes_dir(Path::new("/repo/src")));
    }

    #[test]
    fn test_builtin_files() {
        let set = ExclusionSet::new();
        assert!(set.excludes_file(Path::new("/repo/mod.pyc")));
        assert!(set.excludes_file(Path::new("/repo/package-lock.json")));
        assert!(set.excludes_file(Path::new("/repo/app.min.js")));
        assert!(!set.excludes_file(Path::new("/repo/app.js")));
        assert!(!set.excludes_file(Path::new("/repo/.gitignore")));
    }

    #[test]
    fn test_directory_table_does_not_apply_to_files() {
        let set = ExclusionSet::new();
        assert!(!set.excludes_file(Path::new("/repo/build")));
    }

    #[test]
    fn test_extra_patterns() {
        let set = ExclusionSet::new().with_patterns(vec!["*.csv".into(), "docs".into(), "".into()]);
        assert!(set.excludes_file(Path::new("/repo/data.csv")));
        assert!(set.excludes_dir(Path::new("/repo/docs")));
        assert!(!set.excludes_file(Path::new("/repo/data.json")));
    }

    #[test]
    fn test_skip_path() {
        let set = ExclusionSet::new().skip_path("/repo/out.txt");
        assert!(set.excludes_file(Path::new("/repo/out.txt")));
        assert!(!set.excludes_file(Path::new("/repo/sub/out.txt")));
    }

    #[test]
    fn test_gitignore_rules() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join(".gitignore"), "*.secret\nscratch/\n").unwrap();

        let mut config = Config::new(&root).with_output(root.join("out.txt"));
        config.respect_gitignore = true;
        let set = ExclusionSet::from_config(&config, &root).unwrap();

        assert!(set.excludes_file(&root.join("keys.secret")));
        assert!(set.excludes_dir(&root.join("scratch")));
        assert!(!set.excludes_file(&root.join("main.py")));
        assert!(set.excludes_file(&root.join("out.txt")));
    }

    #[test]
    fn test_resolve_output_path_for_missing_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolved = resolve_output_path(&root.join("missing.txt")).unwrap();
        assert_eq!(resolved, root.join("missing.txt"));
    }
}
