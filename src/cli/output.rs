//! Terminal output for the CLI commands
//!
//! Every line goes through [`Console::paint`], so `--no-color` only has to
//! drop the styles and keep the plain markers.

use owo_colors::{OwoColorize, Style};

/// What happened to a file the init command wanted to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus<'a> {
    Created,
    Kept(&'a str),
}

/// Styled or plain terminal printer
#[derive(Debug, Clone, Copy)]
pub struct Console {
    colored: bool,
}

impl Console {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn banner(&self) {
        let title = format!("📍 placenote-bot v{}", env!("CARGO_PKG_VERSION"));
        println!(
            "\n   {}\n   {}\n",
            self.paint(&title, Style::new().bright_cyan().bold()),
            self.paint(
                "Place notes on Telegram, kept in a spreadsheet",
                Style::new().dimmed()
            )
        );
    }

    pub fn section(&self, title: &str) {
        println!("\n  {}", self.paint(title, Style::new().bold().underline()));
    }

    /// `key: value` line, used by `config`
    pub fn field(&self, key: &str, value: &str) {
        println!("    {:<15} {}", self.paint(key, Style::new().dimmed()), value);
    }

    pub fn ok(&self, message: &str) {
        println!("  {} {}", self.paint("ok", Style::new().green().bold()), message);
    }

    pub fn warn(&self, message: &str) {
        println!("  {} {}", self.paint("warn", Style::new().yellow().bold()), message);
    }

    /// Printed to stderr
    pub fn fail(&self, message: &str) {
        eprintln!("  {} {}", self.paint("error", Style::new().red().bold()), message);
    }

    pub fn file(&self, path: &str, status: FileStatus<'_>) {
        let line = match status {
            FileStatus::Created => format!("+ {}", path),
            FileStatus::Kept(reason) => format!("= {} ({})", path, reason),
        };
        let style = match status {
            FileStatus::Created => Style::new().green(),
            FileStatus::Kept(_) => Style::new().yellow(),
        };
        println!("  {}", self.paint(&line, style));
    }

    /// Numbered instruction followed by shell lines
    pub fn step(&self, number: usize, title: &str, commands: &[&str]) {
        println!("\n  {}. {}", number, title);
        for command in commands {
            println!("     {}", self.paint(&format!("$ {}", command), Style::new().cyan()));
        }
    }

    pub fn tip(&self, message: &str) {
        println!("  {}", self.paint(&format!("tip: {}", message), Style::new().dimmed()));
    }
}
