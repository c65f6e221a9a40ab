use clap::ValueEnum;
use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format != OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", "✓".green().to_string(), msg.as_ref());
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("info", String::new(), msg.as_ref());
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("warning", "⚠".yellow().to_string(), msg.as_ref());
        }
    }

    fn message(&self, kind: &str, marker: String, msg: &str) {
        match self.format {
            OutputFormat::Human if marker.is_empty() => println!("{}", msg),
            OutputFormat::Human => println!("{} {}", marker, msg),
            _ => self.print_json(&json!({ "type": kind, "message": msg })),
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.is_json() {
            return;
        }
        self.print_json(data);
    }

    /// Prints `data` in JSON modes, otherwise runs `human`.
    pub fn render(&self, data: serde_json::Value, human: impl FnOnce()) {
        if self.is_json() {
            self.json(&data);
        } else if !self.quiet {
            human();
        }
    }

    pub fn table(&self, table: &Table) {
        if !self.quiet && !self.is_json() {
            println!("{}", table);
        }
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            OutputFormat::Human => println!("{}", data),
        }
    }
}

/// Rounded UTF-8 table with a bold cyan header row.
pub fn styled_table<I, S>(headers: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .into_iter()
            .map(|h| Cell::new(h.into()).fg(Color::Cyan).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

pub fn check_mark(on: bool) -> String {
    if on {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
