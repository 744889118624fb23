//! Pure file safety checks used by upload screening.
//!
//! Two independent layers:
//! 1. Filename patterns (executable/script extensions, traversal, reserved names)
//! 2. Magic byte detection for native executables
//!
//! Neither layer touches I/O; the guard crate turns matches into violations.

use once_cell::sync::Lazy;
use regex::Regex;

/// Magic byte signatures for executable files.
pub const MAGIC_SIGNATURES: &[(&str, &[u8])] = &[
    ("Windows PE/MZ", &[0x4D, 0x5A]),
    ("ELF", &[0x7F, 0x45, 0x4C, 0x46]),
    ("Mach-O 32", &[0xFE, 0xED, 0xFA, 0xCE]),
    ("Mach-O 64", &[0xFE, 0xED, 0xFA, 0xCF]),
    ("Mach-O 32 LE", &[0xCE, 0xFA, 0xED, 0xFE]),
    ("Mach-O 64 LE", &[0xCF, 0xFA, 0xED, 0xFE]),
    ("Mach-O Fat", &[0xCA, 0xFE, 0xBA, 0xBE]),
];

const EXECUTABLE_EXTENSIONS: &str =
    "exe|dll|bat|cmd|com|scr|pif|msi|msp|cpl|jar|app|hta|gadget|lnk|reg|so|dylib|deb|rpm|apk";

const SCRIPT_EXTENSIONS: &str = "js|jse|vbs|vbe|wsf|wsh|ps1|psm1|sh|bash|zsh|py|pl|php|rb";

const DOCUMENT_EXTENSIONS: &str =
    "pdf|docx?|xlsx?|pptx?|txt|csv|md|rtf|jpe?g|png|gif|webp|tiff?|zip";

static EXECUTABLE_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\.(?:{EXECUTABLE_EXTENSIONS})$")).expect("valid regex")
});

static SCRIPT_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\.(?:{SCRIPT_EXTENSIONS})$")).expect("valid regex"));

static DOUBLE_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\.(?:{DOCUMENT_EXTENSIONS})\.(?:{EXECUTABLE_EXTENSIONS}|{SCRIPT_EXTENSIONS})$"
    ))
    .expect("valid regex")
});

static PATH_TRAVERSAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[/\\])\.\.(?:[/\\]|$)|^[/\\]").expect("valid regex"));

static RESERVED_DEVICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:con|prn|aux|nul|com[1-9]|lpt[1-9])(?:\..*)?$").expect("valid regex")
});

/// A suspicious filename pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilenamePattern {
    ExecutableExtension,
    ScriptExtension,
    DoubleExtension,
    PathTraversal,
    DisallowedCharacter,
    ReservedDeviceName,
}

impl FilenamePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutableExtension => "executable_extension",
            Self::ScriptExtension => "script_extension",
            Self::DoubleExtension => "double_extension",
            Self::PathTraversal => "path_traversal",
            Self::DisallowedCharacter => "disallowed_character",
            Self::ReservedDeviceName => "reserved_device_name",
        }
    }
}

/// Every suspicious pattern the filename matches, in a stable order.
///
/// Matching is case-insensitive; an empty result means the name is clean.
pub fn suspicious_filename_patterns(filename: &str) -> Vec<FilenamePattern> {
    let mut matched = Vec::new();
    if EXECUTABLE_EXT.is_match(filename) {
        matched.push(FilenamePattern::ExecutableExtension);
    }
    if SCRIPT_EXT.is_match(filename) {
        matched.push(FilenamePattern::ScriptExtension);
    }
    if DOUBLE_EXT.is_match(filename) {
        matched.push(FilenamePattern::DoubleExtension);
    }
    if PATH_TRAVERSAL.is_match(filename) {
        matched.push(FilenamePattern::PathTraversal);
    }
    if filename
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*') || c.is_control())
    {
        matched.push(FilenamePattern::DisallowedCharacter);
    }
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    if RESERVED_DEVICE.is_match(base.trim()) {
        matched.push(FilenamePattern::ReservedDeviceName);
    }
    matched
}

/// Name of the executable format whose magic number prefixes `data`, if any.
pub fn detect_executable_signature(data: &[u8]) -> Option<&'static str> {
    MAGIC_SIGNATURES
        .iter()
        .find(|(_, magic)| data.starts_with(magic))
        .map(|(name, _)| *name)
}

/// Make a filename safe for headers and filesystem use.
///
/// Strips path components, replaces dangerous characters and truncates to
/// 255 bytes while keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return "unnamed_file".to_string();
    }

    if sanitized.len() <= 255 {
        return sanitized.to_string();
    }
    let ext = sanitized
        .rfind('.')
        .map(|pos| &sanitized[pos..])
        .filter(|ext| ext.len() < 32)
        .unwrap_or("");
    let stem = truncate_at_char_boundary(&sanitized[..sanitized.len() - ext.len()], 255 - ext.len());
    format!("{}{}", stem, ext)
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
