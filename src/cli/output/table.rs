//! Table output formatting for CLI commands using comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use super::truncate;
use crate::cli::commands::inspect::TaskRow;
use crate::domain::models::{TaskStatus, ToolDefinition};

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_tasks(&self, rows: &[TaskRow]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            header("Key"),
            header("ID"),
            header("Task"),
            header("Status"),
            header("Ready"),
            header("Parent"),
            header("Depends On"),
        ]);

        for row in rows {
            let status_cell = if self.use_colors {
                Cell::new(row.status).fg(status_color(row.status))
            } else {
                Cell::new(format!("{} {}", status_icon(row.status), row.status))
            };
            let ready = if row.ready { "yes" } else { "-" };
            let depends_on = if row.depends_on.is_empty() {
                "-".to_string()
            } else {
                row.depends_on.join(", ")
            };

            table.add_row(vec![
                Cell::new(&row.key),
                Cell::new(&row.id),
                Cell::new(truncate(row.name.as_deref().unwrap_or(&row.objective), 40)),
                status_cell,
                Cell::new(ready),
                Cell::new(row.parent.as_deref().unwrap_or("-")),
                Cell::new(truncate(&depends_on, 30)),
            ]);
        }

        table.to_string()
    }

    pub fn format_tools(&self, tools: &[ToolDefinition]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![header("Tool"), header("Description")]);
        for tool in tools {
            table.add_row(vec![Cell::new(&tool.name), Cell::new(&tool.description)]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold)
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::White,
        TaskStatus::Running => Color::Cyan,
        TaskStatus::Successful => Color::Green,
        TaskStatus::Failed => Color::Red,
        TaskStatus::Skipped => Color::DarkGrey,
    }
}

const fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::Running => "⟳",
        TaskStatus::Successful => "✓",
        TaskStatus::Failed => "✗",
        TaskStatus::Skipped => "⊘",
    }
}
