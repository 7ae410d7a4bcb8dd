use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Workbook error: {0}")]
    Workbook(String),
    #[error("Sheet not found: {0}")]
    MissingSheet(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid identifier: {0}")]
    Identifier(#[from] InvalidIdentifier),
    #[error("Invalid cell reference: {0}")]
    CellRef(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No identifiers found in {0}")]
    NoIdentifiers(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Characters a page title may not contain.
pub const RESERVED_TITLE_CHARS: [char; 8] = ['[', ']', '*', '?', '/', '\\', ':', ';'];

/// Page-title length ceiling of the container format.
pub const MAX_TITLE_LEN: usize = 31;

/// Returns true when `title` could name a page as-is.
pub fn is_valid_title(title: &str) -> bool {
    !title.is_empty()
        && title.chars().count() <= MAX_TITLE_LEN
        && !title.contains(RESERVED_TITLE_CHARS)
        && title.trim() == title
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidIdentifier {
    #[error("value {raw:?} is empty after cleaning")]
    Empty { raw: String },
    #[error("{cleaned:?} is {len} characters long (limit {MAX_TITLE_LEN})")]
    TooLong { cleaned: String, len: usize },
}

/// A cleaned item code, usable verbatim as a page title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Strip surrounding whitespace and reserved characters, then check the
    /// result is non-empty and fits in a page title.
    pub fn clean(raw: &str) -> std::result::Result<Self, InvalidIdentifier> {
        let stripped: String = raw
            .trim()
            .chars()
            .filter(|c| !RESERVED_TITLE_CHARS.contains(c))
            .collect();
        let cleaned = stripped.trim();

        if cleaned.is_empty() {
            return Err(InvalidIdentifier::Empty {
                raw: raw.to_string(),
            });
        }

        let len = cleaned.chars().count();
        if len > MAX_TITLE_LEN {
            return Err(InvalidIdentifier::TooLong {
                cleaned: cleaned.to_string(),
                len,
            });
        }

        Ok(Self(cleaned.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for Identifier {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Identifier::clean(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// 1-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

/// Highest column index of the container format (`XFD`)
pub const MAX_COLUMN: u32 = 16_384;
/// Highest row index of the container format
pub const MAX_ROW: u32 = 1_048_576;

impl CellPos {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1-style reference, e.g. `D15`
    pub fn to_a1(self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

/// Convert a 1-based column index into letters (`1` → `A`, `27` → `AA`).
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl FromStr for CellPos {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let reference: String = s.trim().chars().filter(|c| *c != '$').collect();
        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| CatalogError::CellRef(s.to_string()))?;
        let (letters, digits) = reference.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CatalogError::CellRef(s.to_string()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(|| CatalogError::CellRef(s.to_string()))?;
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| CatalogError::CellRef(s.to_string()))?;

        if row == 0 || row > MAX_ROW || col > MAX_COLUMN {
            return Err(CatalogError::CellRef(s.to_string()));
        }

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl TryFrom<String> for CellPos {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CellPos> for String {
    fn from(value: CellPos) -> Self {
        value.to_a1()
    }
}

/// Inclusive rectangular window of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRegion {
    pub start: CellPos,
    pub end: CellPos,
}

impl CellRegion {
    pub fn new(start: CellPos, end: CellPos) -> Self {
        Self { start, end }
    }

    pub fn is_inverted(&self) -> bool {
        self.start.row > self.end.row || self.start.col > self.end.col
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        (self.start.row..=self.end.row).contains(&pos.row)
            && (self.start.col..=self.end.col).contains(&pos.col)
    }

    /// Cells in row-major order
    pub fn cells(self) -> impl Iterator<Item = CellPos> {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellPos { row, col }))
    }
}

impl FromStr for CellRegion {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self {
                start: start.parse()?,
                end: end.parse()?,
            }),
            None => {
                let pos: CellPos = s.parse()?;
                Ok(Self { start: pos, end: pos })
            }
        }
    }
}

impl fmt::Display for CellRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl TryFrom<String> for CellRegion {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CellRegion> for String {
    fn from(value: CellRegion) -> Self {
        value.to_string()
    }
}

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An image placed on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBinding {
    pub anchor: CellPos,
    pub path: std::path::PathBuf,
    pub size: ImageSize,
}

/// A defined name resolved to a sheet and cell window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub sheet: String,
    pub region: CellRegion,
}

impl NamedRange {
    /// Parse a defined-name address such as `'Schedule'!$A$11:$A$47`.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim().trim_start_matches('=');
        let (sheet, range) = address
            .rsplit_once('!')
            .ok_or_else(|| CatalogError::CellRef(address.to_string()))?;
        let sheet = sheet.trim_matches('\'').replace("''", "'");
        Ok(Self {
            sheet,
            region: range.parse()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A per-item problem that did not stop the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.subject, self.message)
    }
}
