//! Note search
//!
//! Free-text lookup over the full note list, using case-insensitive
//! substring matching. There is no index and no ranking: matches come back
//! in storage order.
//!
//! # Query forms
//!
//! - **Field query** - `/city hanoi`, `/type cafe`, ... filters one field and
//!   returns the detailed view.
//! - **Free text** - cascades until something matches:
//!   1. name or type, detailed view
//!   2. category, condensed count-prefixed list
//!   3. city, address or note, detailed view
//!   4. not-found message
//!
//! Replies are Telegram HTML; note content is escaped.

use std::str::FromStr;

use crate::types::{AppError, LocationNote, Result};

/// Reply when a free-text query matches nothing
pub const NOT_FOUND_MESSAGE: &str =
    "❌ No matching places. Try a name or a type, or filter with /city, /type, /category...";

/// Reply when a field query matches nothing
pub const FIELD_NOT_FOUND_MESSAGE: &str = "📭 No results for this filter.";

const DETAIL_SEPARATOR: &str = "\n---------------------------\n";

// ============================================================================
// Query Types
// ============================================================================

/// A note column that can be searched on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Name,
    Type,
    Category,
    Address,
    City,
    Note,
}

impl SearchField {
    pub fn value<'a>(&self, note: &'a LocationNote) -> &'a str {
        match self {
            Self::Name => &note.name,
            Self::Type => &note.kind,
            Self::Category => &note.category,
            Self::Address => &note.address,
            Self::City => &note.city,
            Self::Note => &note.note,
        }
    }

    /// Primary command for this field, as shown in help text
    pub fn command(&self) -> &'static str {
        match self {
            Self::Name => "/name",
            Self::Type => "/type",
            Self::Category => "/category",
            Self::Address => "/address",
            Self::City => "/city",
            Self::Note => "/note",
        }
    }
}

impl FromStr for SearchField {
    type Err = AppError;

    /// Parse a command prefix such as `/city` or `/tp@PlacesBot`
    fn from_str(s: &str) -> Result<Self> {
        let command = s.split('@').next().unwrap_or(s).to_lowercase();
        match command.as_str() {
            "/name" | "/ten" => Ok(Self::Name),
            "/type" | "/loai" => Ok(Self::Type),
            "/cate" | "/category" | "/danhmuc" => Ok(Self::Category),
            "/addr" | "/address" | "/diachi" => Ok(Self::Address),
            "/city" | "/tp" => Ok(Self::City),
            "/note" | "/ghichu" => Ok(Self::Note),
            _ => Err(AppError::InvalidInput(format!("Unknown search field: {}", s))),
        }
    }
}

/// A parsed search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Restrict matching to one field; `None` runs the free-text cascade
    pub field: Option<SearchField>,
    /// Lower-cased needle
    pub keyword: String,
}

impl SearchQuery {
    /// Parse raw message text.
    ///
    /// Fails with `InvalidInput` when a field prefix has no keyword after it.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let first = text.split_whitespace().next().unwrap_or("");

        match first.parse::<SearchField>() {
            Ok(field) => {
                let keyword = text[first.len()..].trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(AppError::InvalidInput(format!(
                        "{} needs a keyword, e.g. {} hanoi",
                        field.command(),
                        field.command()
                    )));
                }
                Ok(Self {
                    field: Some(field),
                    keyword,
                })
            }
            Err(_) => Ok(Self {
                field: None,
                keyword: text.to_lowercase(),
            }),
        }
    }
}

// ============================================================================
// Matching
// ============================================================================

/// What a search found, borrowing from the searched list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<'a> {
    /// Full detail for each match
    Detailed(Vec<&'a LocationNote>),
    /// Free-text hit on category only: one line per match
    CategorySummary {
        keyword: String,
        notes: Vec<&'a LocationNote>,
    },
    /// Field query with no match
    FieldNotFound(SearchField),
    /// Free-text query with no match at any tier
    NotFound,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn filter<'a>(
    notes: &'a [LocationNote],
    keyword: &str,
    fields: &[SearchField],
) -> Vec<&'a LocationNote> {
    notes
        .iter()
        .filter(|note| fields.iter().any(|f| contains(f.value(note), keyword)))
        .collect()
}

/// Run a query against the full note list
pub fn search<'a>(query: &SearchQuery, notes: &'a [LocationNote]) -> SearchOutcome<'a> {
    let keyword = query.keyword.as_str();

    if let Some(field) = query.field {
        let matches = filter(notes, keyword, &[field]);
        return if matches.is_empty() {
            SearchOutcome::FieldNotFound(field)
        } else {
            SearchOutcome::Detailed(matches)
        };
    }

    let by_name_or_type = filter(notes, keyword, &[SearchField::Name, SearchField::Type]);
    if !by_name_or_type.is_empty() {
        return SearchOutcome::Detailed(by_name_or_type);
    }

    let by_category = filter(notes, keyword, &[SearchField::Category]);
    if !by_category.is_empty() {
        return SearchOutcome::CategorySummary {
            keyword: query.keyword.clone(),
            notes: by_category,
        };
    }

    let by_location_or_note = filter(
        notes,
        keyword,
        &[SearchField::City, SearchField::Address, SearchField::Note],
    );
    if !by_location_or_note.is_empty() {
        return SearchOutcome::Detailed(by_location_or_note);
    }

    SearchOutcome::NotFound
}

// ============================================================================
// Formatting
// ============================================================================

/// Escape text for Telegram HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        escape_html(value)
    }
}

/// Full view of one note
pub fn format_detail(note: &LocationNote) -> String {
    let location = [note.address.as_str(), note.city.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "🏠 Name: <b>{}</b>\n🏷 Type: {}\n📂 Category: {}\n📍 Address: {}\n📝 Note: {}",
        or_dash(&note.name),
        or_dash(&note.kind),
        or_dash(&note.category),
        or_dash(&location),
        or_dash(&note.note)
    )
}

/// One line of the condensed category list
pub fn format_summary_line(note: &LocationNote) -> String {
    format!(
        "- {} ({}) - {}",
        escape_html(&note.name),
        escape_html(&note.kind),
        escape_html(&note.city)
    )
}

impl SearchOutcome<'_> {
    /// Reply text for this outcome
    pub fn render(&self) -> String {
        match self {
            SearchOutcome::Detailed(notes) => notes
                .iter()
                .map(|note| format_detail(note))
                .collect::<Vec<_>>()
                .join(DETAIL_SEPARATOR),
            SearchOutcome::CategorySummary { keyword, notes } => {
                let mut text = format!(
                    "📂 <b>Found {} places in category '{}':</b>\n\n",
                    notes.len(),
                    escape_html(keyword)
                );
                for note in notes {
                    text.push_str(&format_summary_line(note));
                    text.push('\n');
                }
                text
            }
            SearchOutcome::FieldNotFound(_) => FIELD_NOT_FOUND_MESSAGE.to_string(),
            SearchOutcome::NotFound => NOT_FOUND_MESSAGE.to_string(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(
            self,
            SearchOutcome::Detailed(_) | SearchOutcome::CategorySummary { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
