//! Builder for multi-line report blocks.

use owo_colors::OwoColorize;

#[derive(Debug)]
enum Line {
    Title(String),
    Item(String, String),
    Warning(String, String),
    Text(String),
    Empty,
}

/// Titled block of `label: value` lines.
#[derive(Debug)]
pub struct Section {
    color: bool,
    lines: Vec<Line>,
}

impl Section {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            lines: Vec::new(),
        }
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.lines.push(Line::Title(text.into()));
        self
    }

    /// Indented `label: value` line.
    pub fn item(mut self, label: &str, value: impl ToString) -> Self {
        self.lines
            .push(Line::Item(label.to_string(), value.to_string()));
        self
    }

    /// Like [`Section::item`], highlighted.
    pub fn warning(mut self, label: &str, value: impl ToString) -> Self {
        self.lines
            .push(Line::Warning(label.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.lines.push(Line::Text(text.into()));
        self
    }

    pub fn empty_line(mut self) -> Self {
        self.lines.push(Line::Empty);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut last_was_empty = true;

        for line in &self.lines {
            match line {
                // Collapse repeated blank lines.
                Line::Empty => {
                    if !last_was_empty {
                        out.push('\n');
                    }
                    last_was_empty = true;
                    continue;
                }
                Line::Title(text) => {
                    if !last_was_empty {
                        out.push('\n');
                    }
                    if self.color {
                        out.push_str(&text.bold().cyan().to_string());
                    } else {
                        out.push_str(text);
                    }
                }
                Line::Item(label, value) => {
                    if self.color {
                        out.push_str(&format!("  {}: {}", label, value.bold()));
                    } else {
                        out.push_str(&format!("  {}: {}", label, value));
                    }
                }
                Line::Warning(label, value) => {
                    if self.color {
                        out.push_str(&format!("  {}: {}", label.yellow(), value.yellow().bold()));
                    } else {
                        out.push_str(&format!("  {}: {}", label, value));
                    }
                }
                Line::Text(text) => out.push_str(text),
            }
            out.push('\n');
            last_was_empty = false;
        }
        out
    }
}
