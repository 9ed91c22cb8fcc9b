/*!
 * Mode specific rendering of walker entries
 */

use crate::classifier::{classify, extension};
use crate::content::{notebook_code_cells, ContentLoader, FileContent};
use crate::prompts::{extract_prompts, is_prompt_eligible};
use crate::types::{BlockBody, Entry, LanguageTag, Mode, RenderedBlock};

/// Decides what each mode emits for an entry
pub trait Renderer {
    /// Mode implemented by this renderer
    fn mode(&self) -> Mode;

    /// Whether a file is listed in the directory structure
    fn lists_file(&self, _entry: &Entry) -> bool {
        true
    }

    /// Whether directories without a listed descendant are left out of the structure
    fn prunes_empty_directories(&self) -> bool {
        false
    }

    /// Whether a content section follows the structure
    fn renders_contents(&self) -> bool {
        true
    }

    /// Block for one file, `None` when the file contributes nothing
    fn render_file(&self, entry: &Entry) -> Option<RenderedBlock>;
}

/// Build the renderer for a mode
pub fn renderer_for(mode: Mode, loader: ContentLoader) -> Box<dyn Renderer> {
    match mode {
        Mode::FullContent => Box::new(FullContentRenderer { loader }),
        Mode::StructureOnly => Box::new(StructureRenderer),
        Mode::LanguageFiltered(language) => Box::new(LanguageRenderer { language, loader }),
        Mode::PromptExtraction => Box::new(PromptRenderer { loader }),
    }
}

fn block(entry: &Entry, body: BlockBody) -> RenderedBlock {
    RenderedBlock {
        path: entry.path.clone(),
        body,
    }
}

/// Reads a file as a content block, honoring unreadable entries
fn content_block(entry: &Entry, loader: &ContentLoader) -> RenderedBlock {
    match &entry.problem {
        Some(problem) => block(entry, BlockBody::Unreadable(problem.clone())),
        None => block(entry, loader.render(&entry.abs_path)),
    }
}

/// Every file with its content
pub struct FullContentRenderer {
    loader: ContentLoader,
}

impl Renderer for FullContentRenderer {
    fn mode(&self) -> Mode {
        Mode::FullContent
    }

    fn render_file(&self, entry: &Entry) -> Option<RenderedBlock> {
        Some(content_block(entry, &self.loader))
    }
}

/// Names only, file contents are never read
pub struct StructureRenderer;

impl Renderer for StructureRenderer {
    fn mode(&self) -> Mode {
        Mode::StructureOnly
    }

    fn renders_contents(&self) -> bool {
        false
    }

    fn render_file(&self, _entry: &Entry) -> Option<RenderedBlock> {
        None
    }
}

/// Only files classified into one language
pub struct LanguageRenderer {
    language: LanguageTag,
    loader: ContentLoader,
}

impl Renderer for LanguageRenderer {
    fn mode(&self) -> Mode {
        Mode::LanguageFiltered(self.language)
    }

    fn lists_file(&self, entry: &Entry) -> bool {
        classify(&entry.path) == self.language
    }

    fn prunes_empty_directories(&self) -> bool {
        true
    }

    fn render_file(&self, entry: &Entry) -> Option<RenderedBlock> {
        self.lists_file(entry)
            .then(|| content_block(entry, &self.loader))
    }
}

/// Extracted prompt fragments only
pub struct PromptRenderer {
    loader: ContentLoader,
}

impl Renderer for PromptRenderer {
    fn mode(&self) -> Mode {
        Mode::PromptExtraction
    }

    fn render_file(&self, entry: &Entry) -> Option<RenderedBlock> {
        let language = classify(&entry.path);
        if !is_prompt_eligible(&entry.path, language) {
            return None;
        }

        if let Some(problem) = &entry.problem {
            return Some(block(entry, BlockBody::Unreadable(problem.clone())));
        }

        let text = match self.loader.load(&entry.abs_path) {
            FileContent::Text { text, .. } => text,
            FileContent::Binary => return None,
            FileContent::Unreadable(reason) => {
                return Some(block(entry, BlockBody::Unreadable(reason)))
            }
        };

        let source = match extension(&entry.path).as_deref() {
            Some("ipynb") => notebook_code_cells(&text).unwrap_or(text),
            _ => text,
        };

        let fragments = extract_prompts(&entry.path, language, &source);
        (!fragments.is_empty()).then(|| block(entry, BlockBody::Prompts(fragments)))
    }
}
