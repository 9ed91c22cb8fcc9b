/*!
 * Configuration handling for repo-serializer
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::error::{Result, SerializerError};
use crate::types::{LanguageTag, Mode};
use crate::{bail, ensure};

/// Default destination file name
pub const DEFAULT_OUTPUT_FILE: &str = "repo_serialized.txt";

/// Files longer than this are truncated
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Lines kept from tabular data files
pub const DEFAULT_CSV_PREVIEW_LINES: usize = 5;

/// Command-line arguments for repo-serializer
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "repo-serializer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serialize a repository into a single file",
    long_about = "Walks a repository and writes its directory structure and file contents into one plain-text file, ready to hand to a person or a language model."
)]
pub struct Args {
    /// Path to the repository to serialize
    #[clap(required_unless_present = "generate")]
    pub repo_path: Option<String>,

    /// Output file path
    #[clap(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: String,

    /// Copy the output to clipboard in addition to saving to file
    #[clap(short, long)]
    pub clipboard: bool,

    /// Only include directory structure and filenames (no file contents)
    #[clap(short, long)]
    pub structure_only: bool,

    /// Only include Python files (.py, .ipynb)
    #[clap(long)]
    pub python: bool,

    /// Only include JavaScript/TypeScript files (.js, .jsx, .ts, .tsx, .mjs, .cjs)
    #[clap(long)]
    pub javascript: bool,

    /// Extract prompts (instructional strings and comments) instead of full contents
    #[clap(short, long)]
    pub prompt: bool,

    /// Comma-separated list of additional glob patterns to ignore
    #[clap(long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Also honor the repository's root .gitignore
    #[clap(long)]
    pub respect_gitignore: bool,

    /// Files larger than this many bytes are truncated
    #[clap(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Print a summary table after serializing
    #[clap(long)]
    pub stats: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[clap(short, long)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Repository root to serialize
    pub target_dir: PathBuf,

    /// Destination file path
    pub output_file: PathBuf,

    /// Rendering mode
    pub mode: Mode,

    /// Extra glob patterns to ignore, matched against entry names
    pub ignore_patterns: Vec<String>,

    /// Whether to honor the root .gitignore
    pub respect_gitignore: bool,

    /// Truncation threshold in bytes
    pub max_file_size: u64,

    /// Lines shown for CSV/TSV files
    pub csv_preview_lines: usize,

    /// Copy output to clipboard
    pub clip: bool,
}

impl Config {
    /// Configuration with defaults for the given repository
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            mode: Mode::default(),
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            csv_preview_lines: DEFAULT_CSV_PREVIEW_LINES,
            clip: false,
        }
    }

    /// Set the rendering mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the destination file
    pub fn with_output(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let mode = resolve_mode(&args)?;
        let Some(repo_path) = args.repo_path else {
            bail!(Usage, "A repository path is required");
        };

        Ok(Self {
            target_dir: PathBuf::from(repo_path),
            output_file: PathBuf::from(args.output),
            mode,
            ignore_patterns: args.ignore,
            respect_gitignore: args.respect_gitignore,
            max_file_size: args.max_file_size,
            csv_preview_lines: DEFAULT_CSV_PREVIEW_LINES,
            clip: args.clipboard,
        })
    }

    /// Validate the configuration before any traversal
    pub fn validate(&self) -> Result<()> {
        if !self.target_dir.is_dir() {
            return Err(SerializerError::InvalidRoot(self.target_dir.clone()));
        }

        if let Some(parent) = self.output_file.parent() {
            ensure!(
                parent.as_os_str().is_empty() || parent.is_dir(),
                Usage,
                "Output directory not found: {}",
                parent.display()
            );
        }

        ensure!(
            !self.output_file.is_dir(),
            Usage,
            "Output path is a directory: {}",
            self.output_file.display()
        );

        ensure!(
            self.max_file_size > 0,
            Config,
            "--max-file-size must be greater than zero"
        );

        Ok(())
    }
}

/// Turn the mutually exclusive mode flags into a single mode
fn resolve_mode(args: &Args) -> Result<Mode> {
    ensure!(
        !(args.python && args.javascript),
        Usage,
        "Cannot specify both --python and --javascript"
    );

    let mut selected = Vec::new();
    if args.structure_only {
        selected.push(("--structure-only", Mode::StructureOnly));
    }
    if args.python {
        selected.push(("--python", Mode::LanguageFiltered(LanguageTag::Python)));
    }
    if args.javascript {
        selected.push(("--javascript", Mode::LanguageFiltered(LanguageTag::Javascript)));
    }
    if args.prompt {
        selected.push(("--prompt", Mode::PromptExtraction));
    }

    match selected.as_slice() {
        [] => Ok(Mode::FullContent),
        [(_, mode)] => Ok(*mode),
        [(first, _), (second, _), ..] => {
            bail!(Usage, "Cannot combine {} with {}", first, second)
        }
    }
}
