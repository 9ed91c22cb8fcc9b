/*!
 * Core types and data structures for repo-serializer
 */

use std::path::PathBuf;

use strum::{Display, EnumString};

/// Kind of a visited filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory containing other entries
    Directory,
    /// Anything that is not traversed into
    File,
}

/// One filesystem node visited during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path relative to the repository root
    pub path: PathBuf,
    /// Path used to open the entry
    pub abs_path: PathBuf,
    /// Directory or file
    pub kind: EntryKind,
    /// Nesting level, 1 for direct children of the root
    pub depth: usize,
    /// Why the entry could not be read, if it could not
    pub problem: Option<String>,
}

impl Entry {
    /// Whether this entry is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether the entry was reported as unreadable
    pub fn is_unreadable(&self) -> bool {
        self.problem.is_some()
    }

    /// Final path component
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Language bucket a file is classified into by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LanguageTag {
    Python,
    Javascript,
    None,
}

/// Rendering strategy for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Structure plus every file's content
    #[default]
    FullContent,
    /// Structure only, no content is read
    StructureOnly,
    /// Only files of one language
    LanguageFiltered(LanguageTag),
    /// Only prompt fragments extracted from files
    PromptExtraction,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullContent => write!(f, "full content"),
            Self::StructureOnly => write!(f, "structure only"),
            Self::LanguageFiltered(language) => write!(f, "{} files only", language),
            Self::PromptExtraction => write!(f, "prompt extraction"),
        }
    }
}

/// Kind of source construct a prompt fragment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FragmentKind {
    /// Multi-line or assigned string literal
    StringLiteral,
    /// Line or block comment
    Comment,
    /// Whole dedicated prompt file
    PromptFile,
}

/// A piece of instructional text extracted from a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFragment {
    /// 1-based line where the fragment starts
    pub line: usize,
    /// Where the fragment came from
    pub kind: FragmentKind,
    /// Dedented fragment text
    pub text: String,
}

/// Body of a rendered file block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    /// File text, `truncated` is true when a marker was appended
    Text { content: String, truncated: bool },
    /// Binary file placeholder
    Binary,
    /// File could not be read
    Unreadable(String),
    /// Extracted prompt fragments
    Prompts(Vec<PromptFragment>),
}

/// Output fragment for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Path relative to the repository root
    pub path: PathBuf,
    pub body: BlockBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_language_tag_strings() {
        assert_eq!(LanguageTag::Python.to_string(), "python");
        assert_eq!(LanguageTag::from_str("javascript").unwrap(), LanguageTag::Javascript);
        assert!(LanguageTag::from_str("cobol").is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::default().to_string(), "full content");
        assert_eq!(
            Mode::LanguageFiltered(LanguageTag::Python).to_string(),
            "python files only"
        );
    }
}
