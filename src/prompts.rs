/*!
 * Lexical prompt extraction
 *
 * A prompt fragment is instructional natural-language text embedded in
 * source code. Candidates are found line by line:
 *
 * - long-form string literals (`"""`/`'''` in Python, template literals in JavaScript)
 * - comment blocks (runs of `#` or `//` lines, and `/* */` blocks)
 * - single-line quoted strings assigned to a name
 *
 * A candidate bound to a prompt-like name (`prompt`, `instruction`, `system`,
 * `persona`, `template`) needs at least [`MIN_ASSIGNED_WORDS`] words. Other
 * long-form strings need [`MIN_FREEFORM_WORDS`] words and one instructional
 * cue; comment blocks need two distinct cues. Changes to these rules bump
 * [`PROMPT_RULES_VERSION`].
 */

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::extension;
use crate::types::{FragmentKind, LanguageTag, PromptFragment};

/// Version of the extraction rules described in the module docs
pub const PROMPT_RULES_VERSION: u32 = 1;

/// Words required for a string bound to a prompt-like name
pub const MIN_ASSIGNED_WORDS: usize = 3;

/// Words required for an unnamed string or comment block
pub const MIN_FREEFORM_WORDS: usize = 6;

/// Extensions of dedicated prompt files
pub const PROMPT_FILE_EXTENSIONS: &[&str] = &["txt", "md", "prompt", "j2", "jinja", "tmpl"];

static PROMPT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)prompt|instruction|system|persona|template").expect("valid regex")
});

static CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(you are|you will|you must|your task|act as|please|respond|answer|instructions?|step by step|do not|return only|output format|assistant)\b",
    )
    .expect("valid regex")
});

/// Name bound by the code preceding a long-form string opener
static LEAD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?([A-Za-z_$][\w$]*)["']?\s*[:=]\s*(?:[A-Za-z_$][\w$.]*\s*)?(?:\(\s*)?$"#)
        .expect("valid regex")
});

/// A complete quoted string bound to a name on one line
static ASSIGNED_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"["']?([A-Za-z_$][\w$]*)["']?\s*[:=]\s*(?:[rRfFbBuU]{1,2})?("(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#,
    )
    .expect("valid regex")
});

/// Comment-line prefixes that carry tooling directives rather than prose
const PRAGMAS: &[&str] = &[
    "-*-", "coding:", "coding=", "noqa", "pylint:", "type:", "eslint", "@ts-", "prettier-ignore",
];

/// Lexical syntax needed to find candidates
struct Syntax {
    line_comment: &'static str,
    block_comment: Option<(&'static str, &'static str)>,
    long_strings: &'static [&'static str],
}

const PYTHON: Syntax = Syntax {
    line_comment: "#",
    block_comment: None,
    long_strings: &["\"\"\"", "'''"],
};

const JAVASCRIPT: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    long_strings: &["`"],
};

/// A piece of text that may turn out to be a prompt
#[derive(Debug)]
struct Candidate {
    line: usize,
    kind: FragmentKind,
    text: String,
    name: Option<String>,
    long_form: bool,
}

impl Candidate {
    fn qualifies(&self) -> bool {
        let words = self.text.split_whitespace().count();

        let named = self
            .name
            .as_deref()
            .is_some_and(|name| PROMPT_NAME.is_match(name));
        if named && words >= MIN_ASSIGNED_WORDS {
            return true;
        }

        if !self.long_form || words < MIN_FREEFORM_WORDS {
            return false;
        }

        let required = match self.kind {
            FragmentKind::Comment => 2,
            _ => 1,
        };
        distinct_cues(&self.text) >= required
    }
}

fn distinct_cues(text: &str) -> usize {
    CUE.find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Whether a file can contain prompt fragments at all
pub fn is_prompt_eligible(path: &Path, language: LanguageTag) -> bool {
    match language {
        LanguageTag::Python | LanguageTag::Javascript => true,
        LanguageTag::None => is_prompt_file(path),
    }
}

fn is_prompt_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_ascii_lowercase();
    name.contains("prompt")
        && extension(path).is_some_and(|ext| PROMPT_FILE_EXTENSIONS.contains(&ext.as_str()))
}

/// Extract prompt fragments from a file's text
pub fn extract_prompts(path: &Path, language: LanguageTag, source: &str) -> Vec<PromptFragment> {
    let syntax = match language {
        LanguageTag::Python => &PYTHON,
        LanguageTag::Javascript => &JAVASCRIPT,
        LanguageTag::None => {
            if !is_prompt_file(path) {
                return Vec::new();
            }
            let text = dedent(source);
            if text.is_empty() {
                return Vec::new();
            }
            return vec![PromptFragment {
                line: 1,
                kind: FragmentKind::PromptFile,
                text,
            }];
        }
    };

    scan(source, syntax)
        .into_iter()
        .filter(Candidate::qualifies)
        .map(|c| PromptFragment {
            line: c.line,
            kind: c.kind,
            text: c.text,
        })
        .collect()
}

fn scan(source: &str, syntax: &Syntax) -> Vec<Candidate> {
    let lines: Vec<&str> = source.lines().collect();
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        if let Some(body) = comment_body(trimmed, syntax.line_comment, i) {
            let start = i;
            let mut body_lines = vec![body];
            i += 1;
            while i < lines.len() {
                match comment_body(lines[i].trim_start(), syntax.line_comment, i) {
                    Some(body) => body_lines.push(body),
                    None => break,
                }
                i += 1;
            }
            candidates.push(Candidate {
                line: start + 1,
                kind: FragmentKind::Comment,
                text: dedent(&body_lines.join("\n")),
                name: None,
                long_form: true,
            });
            continue;
        }

        if let Some((open, close)) = syntax.block_comment {
            if let Some(rest) = trimmed.strip_prefix(open) {
                let start = i;
                let (raw, end) = collect_until(&lines, i, rest, close);
                let body: Vec<&str> = raw.lines().map(strip_block_decoration).collect();
                candidates.push(Candidate {
                    line: start + 1,
                    kind: FragmentKind::Comment,
                    text: dedent(&body.join("\n")),
                    name: None,
                    long_form: true,
                });
                i = end + 1;
                continue;
            }
        }

        if let Some((index, quote)) = find_long_string(line, syntax) {
            let start = i;
            let lead = &line[..index];
            let rest = &line[index + quote.len()..];
            let (raw, end) = collect_until(&lines, i, rest, quote);
            candidates.push(Candidate {
                line: start + 1,
                kind: FragmentKind::StringLiteral,
                text: dedent(&raw),
                name: LEAD_NAME.captures(lead).map(|c| c[1].to_string()),
                long_form: true,
            });
            i = end + 1;
            continue;
        }

        for caps in ASSIGNED_STRING.captures_iter(line) {
            let literal = &caps[2];
            candidates.push(Candidate {
                line: i + 1,
                kind: FragmentKind::StringLiteral,
                text: literal[1..literal.len() - 1].to_string(),
                name: Some(caps[1].to_string()),
                long_form: false,
            });
        }
        i += 1;
    }

    candidates
}

/// Body of a line comment, `None` for code lines and tooling directives
fn comment_body<'a>(trimmed: &'a str, marker: &str, index: usize) -> Option<&'a str> {
    let body = trimmed.strip_prefix(marker)?;
    if index == 0 && body.starts_with('!') {
        return None;
    }
    let body = body.strip_prefix(' ').unwrap_or(body);
    if body.contains("-*-") || PRAGMAS.iter().any(|p| body.trim_start().starts_with(p)) {
        return None;
    }
    Some(body)
}

fn strip_block_decoration(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) if !rest.starts_with('/') => rest.strip_prefix(' ').unwrap_or(rest),
        _ => line,
    }
}

/// Earliest long-form string opener on a line
fn find_long_string(line: &str, syntax: &Syntax) -> Option<(usize, &'static str)> {
    syntax
        .long_strings
        .iter()
        .filter_map(|&quote| find_unescaped(line, quote).map(|index| (index, quote)))
        .min_by_key(|(index, _)| *index)
}

/// Position of `needle` not preceded by an odd number of backslashes
fn find_unescaped(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let slashes = haystack[..i]
            .bytes()
            .rev()
            .take_while(|&b| b == b'\\')
            .count();
        slashes % 2 == 0
    })
}

/// Gather text from `first` (the remainder of line `start`) up to `close`
///
/// Returns the enclosed text and the index of the line holding the closer,
/// or the last line when the construct is never closed.
fn collect_until(lines: &[&str], start: usize, first: &str, close: &str) -> (String, usize) {
    if let Some(end) = find_unescaped(first, close) {
        return (first[..end].to_string(), start);
    }

    let mut parts = vec![first];
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if let Some(end) = find_unescaped(line, close) {
            parts.push(&line[..end]);
            return (parts.join("\n"), start + 1 + offset);
        }
        parts.push(line);
    }

    (parts.join("\n"), lines.len().saturating_sub(1))
}

fn leading_indent(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Trim surrounding blank lines and common indentation
///
/// The first line is left-trimmed on its own since it usually follows the
/// opening delimiter directly.
pub fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);

    let indent = lines[first + 1..=last]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_indent(l))
        .min()
        .unwrap_or(0);

    let mut out = Vec::with_capacity(last - first + 1);
    out.push(lines[first].trim());
    for line in &lines[first + 1..=last] {
        let cut = indent.min(leading_indent(line));
        out.push(line[cut..].trim_end());
    }
    out.join("\n")
}
