use crate::dialog::optional_field;
use crate::types::{AppError, LocationNote, Result};

/// Usage line for `/import`
pub const IMPORT_USAGE: &str = "/import name | type | category | address | city | note";

/// A message classified by its leading command word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/cancel`
    Cancel,
    /// `/add`
    Add,
    /// `/import ...` with everything after the command word
    Import(String),
    /// `/start` or `/help`
    Help,
    /// Anything else, trimmed
    Text(String),
}

impl Command {
    /// Classify message text. Commands are case-insensitive and may carry a
    /// `@botname` suffix.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let first = text.split_whitespace().next().unwrap_or("");
        let rest = text[first.len()..].trim();

        match command_word(first).as_str() {
            "/cancel" => Command::Cancel,
            "/add" => Command::Add,
            "/import" => Command::Import(rest.to_string()),
            "/start" | "/help" => Command::Help,
            _ => Command::Text(text.to_string()),
        }
    }
}

/// Lower-cased command word without the `@botname` suffix
fn command_word(word: &str) -> String {
    if !word.starts_with('/') {
        return String::new();
    }
    word.split('@').next().unwrap_or(word).to_lowercase()
}

/// Parse `/import` arguments into a note.
///
/// Requires exactly six `|`-separated fields. Fields are trimmed and `k`
/// clears address and note.
pub fn parse_import(args: &str) -> Result<LocationNote> {
    let fields: Vec<&str> = args.split('|').map(str::trim).collect();
    if fields.len() != LocationNote::COLUMNS {
        return Err(AppError::InvalidInput(format!(
            "expected {} fields separated by '|', got {}",
            LocationNote::COLUMNS,
            fields.len()
        )));
    }

    let note = LocationNote {
        name: fields[0].to_string(),
        kind: fields[1].to_string(),
        category: fields[2].to_string(),
        address: optional_field(fields[3]),
        city: fields[4].to_string(),
        note: optional_field(fields[5]),
    };

    if note.name.is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }

    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/cancel", Command::Cancel)]
    #[case("/CANCEL", Command::Cancel)]
    #[case("/cancel@PlacesBot", Command::Cancel)]
    #[case("  /add ", Command::Add)]
    #[case("/start", Command::Help)]
    #[case("/help", Command::Help)]
    #[case("Pho24", Command::Text("Pho24".to_string()))]
    #[case("/city hanoi", Command::Text("/city hanoi".to_string()))]
    #[case("add", Command::Text("add".to_string()))]
    fn test_parse_command(#[case] text: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(text), expected);
    }

    #[test]
    fn test_parse_import_keeps_arguments() {
        assert_eq!(
            Command::parse("/import@PlacesBot a | b"),
            Command::Import("a | b".to_string())
        );
        assert_eq!(Command::parse("/import"), Command::Import(String::new()));
    }

    #[test]
    fn test_parse_import_fields() {
        let note = parse_import("Pho24 | Pho | food | k | Hanoi | k").unwrap();

        assert_eq!(note.name, "Pho24");
        assert_eq!(note.kind, "Pho");
        assert_eq!(note.category, "food");
        assert_eq!(note.address, "");
        assert_eq!(note.city, "Hanoi");
        assert_eq!(note.note, "");
    }

    #[test]
    fn test_parse_import_only_clears_optional_fields() {
        let note = parse_import("k | k | k | 1 Main St | k | cozy").unwrap();
        assert_eq!(note.name, "k");
        assert_eq!(note.city, "k");
        assert_eq!(note.address, "1 Main St");
        assert_eq!(note.note, "cozy");
    }

    #[rstest]
    #[case("")]
    #[case("Pho24 | Pho | food")]
    #[case("a | b | c | d | e | f | g")]
    #[case(" | Pho | food | k | Hanoi | k")]
    fn test_parse_import_rejects_bad_input(#[case] args: &str) {
        assert!(matches!(parse_import(args), Err(AppError::InvalidInput(_))));
    }
}
