/*!
 * repo-serializer - Flatten a repository into a single plain-text file
 *
 * This library walks a repository, skips the usual build and tooling noise,
 * and writes the directory structure followed by file contents into one
 * document suitable for pasting into a conversation with a language model.
 */

pub mod classifier;
pub mod clipboard;
pub mod config;
pub mod content;
pub mod error;
pub mod exclusion;
pub mod prompts;
pub mod render;
pub mod report;
pub mod scanner;
pub mod serializer;
pub mod types;
pub mod writer;


use indicatif::ProgressBar;

// Re-export main components for easier access
pub use config::{Args, Config};
pub use error::{Result, SerializerError};
pub use report::{Reporter, RunStats};
pub use serializer::Serializer;
pub use types::{LanguageTag, Mode};
pub use writer::OutputDocument;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialize a repository and write the destination file, returning the text written
pub fn serialize(config: &Config) -> Result<String> {
    let mut serializer = Serializer::new(config.clone(), ProgressBar::hidden());
    Ok(serializer.run()?.into_string())
}
