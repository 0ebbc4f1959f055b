use clap::ValueEnum;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use streamverse_models::{ContentItem, ContentType};

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

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn message(&self, kind: &str, marker: String, msg: &str) {
        match self.format {
            OutputFormat::Human if marker.is_empty() => println!("{}", msg),
            OutputFormat::Human => println!("{} {}", marker, msg),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind, "message": msg }));
            }
        }
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if !self.quiet {
            self.message("success", "✓".green().to_string(), msg.as_ref());
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Errors should always be shown, even in quiet mode
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": "error", "message": msg.as_ref() }));
            }
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

    /// Print a serializable result in JSON modes. Returns false in human
    /// mode so the caller renders it instead.
    pub fn data<T: Serialize>(&self, value: &T) -> bool {
        if self.is_human() {
            return false;
        }
        if !self.quiet {
            match serde_json::to_value(value) {
                Ok(v) => self.print_json(&v),
                Err(e) => self.error(format!("Failed to serialize output: {}", e)),
            }
        }
        true
    }

    /// Catalog cards as a table, or a JSON array.
    pub fn items(&self, title: &str, items: &[ContentItem]) {
        if self.data(&items) || self.quiet {
            return;
        }
        if items.is_empty() {
            println!("{}", format!("{}: nothing found", title).bright_black());
            return;
        }
        println!("{}", title.bright_cyan().bold());
        println!("{}", item_table(items));
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            _ => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }
}

pub fn styled_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header(label: &str) -> Cell {
    Cell::new(label).fg(Color::Cyan).add_attribute(Attribute::Bold)
}

/// Type-specific subtitle for a card: artist, fixture or genre.
fn subtitle(item: &ContentItem) -> String {
    match item.content_type {
        ContentType::Music => item.artist.clone().unwrap_or_default(),
        ContentType::Sports => match (&item.home_team, &item.away_team, &item.home_score, &item.away_score) {
            (Some(home), Some(away), Some(hs), Some(aw)) => format!("{} {} - {} {}", home, hs, aw, away),
            (Some(home), Some(away), _, _) => format!("{} vs {}", home, away),
            _ => item.status.clone().unwrap_or_default(),
        },
        _ => item.genre.clone(),
    }
}

fn progress_cell(item: &ContentItem) -> String {
    item.progress.map(|p| format!("{}%", p)).unwrap_or_default()
}

pub fn item_table(items: &[ContentItem]) -> Table {
    let mut table = styled_table();
    let with_progress = items.iter().any(|i| i.progress.is_some());
    let mut headers = vec![header("ID"), header("Type"), header("Title"), header("Year"), header("Rating"), header("Info")];
    if with_progress {
        headers.push(header("Progress"));
    }
    table.set_header(headers);

    for item in items {
        let mut row = vec![
            Cell::new(&item.id),
            Cell::new(item.content_type.as_str()),
            Cell::new(&item.title),
            Cell::new(&item.year),
            Cell::new(&item.rating),
            Cell::new(subtitle(item)),
        ];
        if with_progress {
            row.push(Cell::new(progress_cell(item)));
        }
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sports_subtitle_prefers_score() {
        let mut item = ContentItem::new("e1", "Arsenal vs Chelsea", ContentType::Sports);
        item.home_team = Some("Arsenal".into());
        item.away_team = Some("Chelsea".into());
        assert_eq!(subtitle(&item), "Arsenal vs Chelsea");

        item.home_score = Some("2".into());
        item.away_score = Some("1".into());
        assert_eq!(subtitle(&item), "Arsenal 2 - 1 Chelsea");
    }

    #[test]
    fn test_progress_column_only_when_present() {
        let plain = vec![ContentItem::new("1", "A", ContentType::Movie)];
        assert!(!item_table(&plain).to_string().contains("Progress"));

        let watched = vec![ContentItem::new("1", "A", ContentType::Movie).with_progress(40)];
        let rendered = item_table(&watched).to_string();
        assert!(rendered.contains("Progress"));
        assert!(rendered.contains("40%"));
    }
}
