/*!
 * Bounded file reading and content presentation
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::classifier::{extension, has_binary_extension, looks_binary, BINARY_SAMPLE_SIZE};
use crate::config::Config;
use crate::types::BlockBody;

/// Raw outcome of reading one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Decoded text and the number of bytes cut off after it
    Text { text: String, omitted_bytes: u64 },
    /// Binary file, never rendered
    Binary,
    /// Open or read failure
    Unreadable(String),
}

/// Reads files with the run's truncation and preview limits
#[derive(Debug, Clone)]
pub struct ContentLoader {
    max_file_size: u64,
    csv_preview_lines: usize,
}

impl ContentLoader {
    pub fn new(max_file_size: u64, csv_preview_lines: usize) -> Self {
        Self {
            max_file_size,
            csv_preview_lines,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_size, config.csv_preview_lines)
    }

    /// Read at most `max_file_size` bytes of a file
    pub fn load(&self, path: &Path) -> FileContent {
        if has_binary_extension(path) {
            return FileContent::Binary;
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return FileContent::Unreadable(e.to_string()),
        };
        let total = file.metadata().map(|m| m.len()).unwrap_or(0);

        // Always read enough for the binary sample, even under a small limit
        let read_limit = self.max_file_size.max(BINARY_SAMPLE_SIZE as u64);
        let mut buffer = Vec::new();
        if let Err(e) = file.take(read_limit).read_to_end(&mut buffer) {
            return FileContent::Unreadable(e.to_string());
        }

        if looks_binary(&buffer) {
            return FileContent::Binary;
        }
        buffer.truncate(self.max_file_size.min(buffer.len() as u64) as usize);

        if (buffer.len() as u64) < total {
            // Do not split a multi-byte character at the cut
            if let Err(e) = std::str::from_utf8(&buffer) {
                if e.error_len().is_none() {
                    buffer.truncate(e.valid_up_to());
                }
            }
        }

        let omitted_bytes = total.saturating_sub(buffer.len() as u64);
        FileContent::Text {
            text: String::from_utf8_lossy(&buffer).into_owned(),
            omitted_bytes,
        }
    }

    /// Load a file and turn it into a block body for content modes
    pub fn render(&self, path: &Path) -> BlockBody {
        match self.load(path) {
            FileContent::Text {
                text,
                omitted_bytes,
            } => self.present(path, text, omitted_bytes),
            FileContent::Binary => BlockBody::Binary,
            FileContent::Unreadable(reason) => BlockBody::Unreadable(reason),
        }
    }

    /// Apply per-format presentation and truncation markers
    pub fn present(&self, path: &Path, text: String, omitted_bytes: u64) -> BlockBody {
        let ext = extension(path);

        let (mut content, mut truncated) = match ext.as_deref() {
            Some("ipynb") if omitted_bytes == 0 => {
                (notebook_code_cells(&text).unwrap_or(text), false)
            }
            Some("csv") | Some("tsv") => self.preview_lines(text),
            _ => (text, false),
        };

        if omitted_bytes > 0 {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&format!("...truncated ({} bytes omitted)...\n", omitted_bytes));
            truncated = true;
        }

        BlockBody::Text { content, truncated }
    }

    fn preview_lines(&self, text: String) -> (String, bool) {
        let total = text.lines().count();
        if total <= self.csv_preview_lines {
            return (text, false);
        }

        let mut preview: String = text
            .lines()
            .take(self.csv_preview_lines)
            .flat_map(|line| [line, "\n"])
            .collect();
        preview.push_str(&format!(
            "...truncated ({} more lines)...\n",
            total - self.csv_preview_lines
        ));
        (preview, true)
    }
}

#[derive(Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<NotebookCell>,
}

#[derive(Deserialize)]
struct NotebookCell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellSource {
    Lines(Vec<String>),
    Text(String),
}

impl Default for CellSource {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl CellSource {
    fn joined(&self) -> String {
        match self {
            Self::Lines(lines) => lines.concat(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Concatenate the code cells of a Jupyter notebook, `None` if it does not parse
pub fn notebook_code_cells(raw: &str) -> Option<String> {
    let notebook: Notebook = serde_json::from_str(raw).ok()?;
    let mut out = String::new();

    let code = notebook.cells.iter().filter(|c| c.cell_type == "code");
    for (index, cell) in code.enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("# %% [cell {}]\n", index + 1));
        let source = cell.source.joined();
        out.push_str(&source);
        if !source.ends_with('\n') {
            out.push('\n');
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn loader() -> ContentLoader {
        ContentLoader::new(64, 3)
    }

    #[test]
    fn test_load_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.py");
        fs::write(&path, "print('hi')\n").unwrap();

        assert_eq!(
            loader().load(&path),
            FileContent::Text {
                text: "print('hi')\n".into(),
                omitted_bytes: 0
            }
        );
    }

    #[test]
    fn test_load_binary_by_nul_byte() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.dat");
        fs::write(&path, b"abc\0\x01\x02").unwrap();
        assert_eq!(loader().load(&path), FileContent::Binary);
    }

    #[test]
    fn test_nul_past_size_limit_is_still_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.dat");
        let mut bytes = vec![b'a'; 200];
        bytes[101] = 0;
        fs::write(&path, bytes).unwrap();
        assert_eq!(loader().load(&path), FileContent::Binary);
    }

    #[test]
    fn test_load_binary_by_extension_without_reading() {
        let path = Path::new("/nonexistent/logo.png");
        assert_eq!(loader().load(path), FileContent::Binary);
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let path = Path::new("/nonexistent/file.txt");
        assert!(matches!(loader().load(path), FileContent::Unreadable(_)));
    }

    #[test]
    fn test_oversized_file_is_truncated_with_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "x".repeat(100)).unwrap();

        match loader().render(&path) {
            BlockBody::Text { content, truncated } => {
                assert!(truncated);
                assert!(content.starts_with(&"x".repeat(64)));
                assert!(content.ends_with("...truncated (36 bytes omitted)...\n"));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.txt");
        // 63 ASCII bytes followed by a 3 byte character straddling the limit
        let text = format!("{}€tail", "a".repeat(63));
        fs::write(&path, &text).unwrap();

        match loader().load(&path) {
            FileContent::Text {
                text,
                omitted_bytes,
            } => {
                assert_eq!(text, "a".repeat(63));
                assert_eq!(omitted_bytes, 7);
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_csv_preview() {
        let body = loader().present(
            Path::new("data.csv"),
            "h\n1\n2\n3\n4\n".to_string(),
            0,
        );
        assert_eq!(
            body,
            BlockBody::Text {
                content: "h\n1\n2\n...truncated (2 more lines)...\n".into(),
                truncated: true
            }
        );
    }

    #[test]
    fn test_short_csv_is_verbatim() {
        let body = loader().present(Path::new("data.csv"), "h\n1\n".to_string(), 0);
        assert_eq!(
            body,
            BlockBody::Text {
                content: "h\n1\n".into(),
                truncated: false
            }
        );
    }

    #[test]
    fn test_notebook_code_cells() {
        let raw = r##"{
            "cells": [
                {"cell_type": "markdown", "source": ["# Title\n"]},
                {"cell_type": "code", "source": ["import os\n", "print(os.name)"]},
                {"cell_type": "code", "source": "x = 1\n"}
            ],
            "metadata": {}
        }"##;

        assert_eq!(
            notebook_code_cells(raw).unwrap(),
            "# %% [cell 1]\nimport os\nprint(os.name)\n\n# %% [cell 2]\nx = 1\n"
        );
    }

    #[test]
    fn test_invalid_notebook_falls_back_to_raw() {
        let body = loader().present(Path::new("broken.ipynb"), "{not json".to_string(), 0);
        assert_eq!(
            body,
            BlockBody::Text {
                content: "{not json".into(),
                truncated: false
            }
        );
    }
}
