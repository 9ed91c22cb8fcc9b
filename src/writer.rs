/*!
 * Plain text assembly of the serialized repository
 */

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Component, Path};

use tempfile::Builder;

use crate::error::{Result, SerializerError};
use crate::types::{BlockBody, Entry, PromptFragment, RenderedBlock};

/// Heading of the directory structure section
pub const STRUCTURE_HEADING: &str = "Directory Structure:";

/// Heading of the file content section
pub const CONTENT_HEADING: &str = "Files Content:";

/// Prefix of the line that opens every file block
pub const FILE_BANNER: &str = "================ FILE: ";

/// Body written for binary files
pub const BINARY_PLACEHOLDER: &str = "[binary file skipped]";

/// Render a relative path with `/` separators and escaped control characters
pub fn display_path(path: &Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    escape(&joined)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Accumulates the output document in memory
#[derive(Debug, Default)]
pub struct Assembler {
    buffer: String,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the structure section with the root directory line
    pub fn begin_structure(&mut self, root_name: &str) {
        self.buffer.push_str(STRUCTURE_HEADING);
        self.buffer.push('\n');
        let _ = writeln!(self.buffer, "{}/", escape(root_name));
    }

    /// One indented structure line for an entry
    pub fn structure_line(&mut self, entry: &Entry) {
        self.buffer.push_str(&"  ".repeat(entry.depth));
        self.buffer.push_str(&escape(&entry.name()));
        if entry.is_dir() {
            self.buffer.push('/');
        }
        if entry.is_unreadable() {
            self.buffer.push_str(" [unreadable]");
        }
        self.buffer.push('\n');
    }

    /// Open the file content section
    pub fn begin_contents(&mut self) {
        self.buffer.push('\n');
        self.buffer.push_str(CONTENT_HEADING);
        self.buffer.push('\n');
    }

    /// Append one file block
    pub fn append(&mut self, block: &RenderedBlock) {
        let _ = write!(
            self.buffer,
            "\n{}{}\n",
            FILE_BANNER,
            display_path(&block.path)
        );

        match &block.body {
            BlockBody::Text { content, .. } => self.push_text(content),
            BlockBody::Binary => self.push_text(BINARY_PLACEHOLDER),
            BlockBody::Unreadable(reason) => self.push_text(&format!("[unreadable: {}]", reason)),
            BlockBody::Prompts(fragments) => self.push_prompts(fragments),
        }
    }

    fn push_text(&mut self, text: &str) {
        self.buffer.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    fn push_prompts(&mut self, fragments: &[PromptFragment]) {
        for (index, fragment) in fragments.iter().enumerate() {
            if index > 0 {
                self.buffer.push('\n');
            }
            let _ = writeln!(
                self.buffer,
                "--- prompt {} (line {}, {}) ---",
                index + 1,
                fragment.line,
                fragment.kind
            );
            self.push_text(&fragment.text);
        }
    }

    /// Finalize the document
    pub fn finish(self) -> OutputDocument {
        OutputDocument {
            text: self.buffer,
        }
    }
}

/// The complete serialized repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    text: String,
}

impl OutputDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Write the document to `path` in one step
    ///
    /// The text goes to a temporary file next to the destination which then
    /// replaces it, so a failure never leaves a partial destination behind.
    /// A new destination gets the same permissions as `File::create` would
    /// give it, an existing one keeps its own.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let write_error = |source| SerializerError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        #[allow(unused_mut)]
        let mut builder = Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Narrowed by the umask on creation
            builder.permissions(fs::Permissions::from_mode(0o666));
        }

        let mut file = builder.tempfile_in(dir).map_err(write_error)?;
        file.write_all(self.text.as_bytes()).map_err(write_error)?;
        file.flush().map_err(write_error)?;
        if let Ok(existing) = fs::metadata(path) {
            file.as_file()
                .set_permissions(existing.permissions())
                .map_err(write_error)?;
        }
        file.persist(path).map_err(|e| write_error(e.error))?;

        log::debug!("Wrote {} bytes to {}", self.text.len(), path.display());
        Ok(())
    }
}
