/*!
 * Extension based language classification and binary detection
 */

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::types::LanguageTag;

/// Number of leading bytes inspected for NUL bytes
pub const BINARY_SAMPLE_SIZE: usize = 8192;

/// Extension to language table
pub const LANGUAGE_EXTENSIONS: &[(&str, LanguageTag)] = &[
    ("py", LanguageTag::Python),
    ("ipynb", LanguageTag::Python),
    ("js", LanguageTag::Javascript),
    ("jsx", LanguageTag::Javascript),
    ("ts", LanguageTag::Javascript),
    ("tsx", LanguageTag::Javascript),
    ("mjs", LanguageTag::Javascript),
    ("cjs", LanguageTag::Javascript),
];

/// Extensions whose content is never rendered
pub const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tif", "tiff", "psd", "icns",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "whl", "jar", "war",
    // Compiled
    "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "pyc", "pyo", "wasm",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // Media
    "mp3", "mp4", "wav", "flac", "ogg", "avi", "mov", "mkv", "webm",
    // Fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // Data
    "sqlite", "sqlite3", "db", "parquet", "pkl", "pickle", "npy", "npz", "h5", "onnx", "pt",
];

static LANGUAGE_MAP: Lazy<HashMap<&'static str, LanguageTag>> =
    Lazy::new(|| LANGUAGE_EXTENSIONS.iter().copied().collect());

/// Lowercased extension of a path
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Classify a file into a language bucket by its extension
pub fn classify(path: &Path) -> LanguageTag {
    extension(path)
        .and_then(|ext| LANGUAGE_MAP.get(ext.as_str()).copied())
        .unwrap_or(LanguageTag::None)
}

/// Whether the extension alone marks the file as binary
pub fn has_binary_extension(path: &Path) -> bool {
    extension(path).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a leading sample of file content looks binary
pub fn looks_binary(sample: &[u8]) -> bool {
    let len = sample.len().min(BINARY_SAMPLE_SIZE);
    sample[..len].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_python() {
        assert_eq!(classify(Path::new("src/main.py")), LanguageTag::Python);
        assert_eq!(classify(Path::new("analysis.ipynb")), LanguageTag::Python);
        assert_eq!(classify(Path::new("LEGACY.PY")), LanguageTag::Python);
    }

    #[test]
    fn test_classify_javascript() {
        for name in ["a.js", "b.jsx", "c.ts", "d.tsx", "e.mjs", "f.cjs"] {
            assert_eq!(classify(Path::new(name)), LanguageTag::Javascript, "{}", name);
        }
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify(Path::new("README.md")), LanguageTag::None);
        assert_eq!(classify(Path::new("Makefile")), LanguageTag::None);
        assert_eq!(classify(Path::new(".py")), LanguageTag::None);
    }

    #[test]
    fn test_binary_extension() {
        assert!(has_binary_extension(Path::new("logo.PNG")));
        assert!(has_binary_extension(Path::new("dist.tar.gz")));
        assert!(!has_binary_extension(Path::new("main.rs")));
    }

    #[test]
    fn test_nul_byte_sampling() {
        assert!(looks_binary(b"abc\0def"));
        assert!(!looks_binary(b"plain text\n"));

        let mut late = vec![b'a'; BINARY_SAMPLE_SIZE];
        late.push(0);
        assert!(!looks_binary(&late));
    }
}
