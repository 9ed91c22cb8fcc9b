/*!
 * Serialization engine tying the walker, renderers and assembler together
 */

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indicatif::ProgressBar;

use crate::config::Config;
use crate::content::ContentLoader;
use crate::error::{Result, SerializerError};
use crate::exclusion::ExclusionSet;
use crate::render::{renderer_for, Renderer};
use crate::report::RunStats;
use crate::scanner::Walker;
use crate::types::{BlockBody, Entry};
use crate::writer::{Assembler, OutputDocument};

/// Serializes one repository per run
pub struct Serializer {
    /// Serializer configuration
    config: Config,
    /// Progress bar
    progress: ProgressBar,
    /// Statistics of the last run
    statistics: RunStats,
}

impl Serializer {
    /// Create a new serializer
    pub fn new(config: Config, progress: ProgressBar) -> Self {
        Self {
            config,
            progress,
            statistics: RunStats::default(),
        }
    }

    /// Statistics gathered by the last run
    pub fn statistics(&self) -> &RunStats {
        &self.statistics
    }

    /// Serialize the repository and write the destination file once
    pub fn run(&mut self) -> Result<OutputDocument> {
        self.config.validate()?;
        let document = self.render()?;
        document.write_to(&self.config.output_file)?;
        self.statistics.bytes_written = document.len();
        Ok(document)
    }

    /// Build the output document in memory without writing it
    pub fn render(&mut self) -> Result<OutputDocument> {
        let root = fs::canonicalize(&self.config.target_dir)
            .map_err(|_| SerializerError::InvalidRoot(self.config.target_dir.clone()))?;
        let exclusions = ExclusionSet::from_config(&self.config, &root)?;
        let walker = Walker::new(&root, exclusions)?;
        let root_name = root_name(walker.root());

        log::info!(
            "Serializing {} ({})",
            root.display(),
            self.config.mode
        );

        let entries: Vec<Entry> = walker.collect();
        let renderer = renderer_for(self.config.mode, ContentLoader::from_config(&self.config));
        let mut stats = RunStats {
            mode: self.config.mode,
            ..RunStats::default()
        };

        let mut assembler = Assembler::new();
        assembler.begin_structure(&root_name);
        for entry in structure_entries(&entries, renderer.as_ref()) {
            if entry.is_dir() {
                stats.directories += 1;
            } else {
                stats.files += 1;
            }
            if entry.is_unreadable() {
                stats.unreadable += 1;
            }
            assembler.structure_line(entry);
        }

        if renderer.renders_contents() {
            assembler.begin_contents();
            let files: Vec<&Entry> = entries.iter().filter(|e| !e.is_dir()).collect();
            self.progress.set_length(files.len() as u64);

            for entry in files {
                self.progress.inc(1);
                self.progress
                    .set_message(format!("Current file: {}", short_name(entry)));

                if let Some(block) = renderer.render_file(entry) {
                    stats.blocks += 1;
                    match &block.body {
                        BlockBody::Text { truncated: true, .. } => stats.truncated += 1,
                        BlockBody::Binary => stats.binary_skipped += 1,
                        BlockBody::Prompts(fragments) => {
                            stats.prompt_fragments += fragments.len()
                        }
                        _ => {}
                    }
                    assembler.append(&block);
                }
            }
        }

        let document = assembler.finish();
        log::debug!(
            "Rendered {} entries into {} bytes",
            entries.len(),
            document.len()
        );
        self.statistics = stats;
        Ok(document)
    }
}

/// Entries shown in the structure section, in walk order
fn structure_entries<'a>(entries: &'a [Entry], renderer: &dyn Renderer) -> Vec<&'a Entry> {
    if !renderer.prunes_empty_directories() {
        return entries
            .iter()
            .filter(|e| e.is_dir() || renderer.lists_file(e))
            .collect();
    }

    let mut populated: HashSet<&Path> = HashSet::new();
    for entry in entries.iter().filter(|e| !e.is_dir() && renderer.lists_file(e)) {
        populated.extend(
            entry
                .path
                .ancestors()
                .skip(1)
                .take_while(|a| !a.as_os_str().is_empty()),
        );
    }

    entries
        .iter()
        .filter(|e| {
            if e.is_dir() {
                populated.contains(e.path.as_path())
            } else {
                renderer.lists_file(e)
            }
        })
        .collect()
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string())
}

/// File name shortened for the progress line
fn short_name(entry: &Entry) -> String {
    let name = entry.name();
    let count = name.chars().count();
    if count > 40 {
        let tail: String = name.chars().skip(count - 37).collect();
        format!("...{}", tail)
    } else {
        name
    }
}
