use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use taskboard_shared::{BoardView, FilterMode, Priority};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, writer, view), fields(rows = view.tasks.len()))]
    pub fn write_board<W: Write>(&self, mut writer: W, view: &BoardView) -> anyhow::Result<()> {
        if view.tasks.is_empty() {
            match view.filter {
                FilterMode::All => writeln!(writer, "No tasks.")?,
                other => writeln!(writer, "No {other} tasks.")?,
            }
            return Ok(());
        }

        let mut headers = vec![
            "ID".to_string(),
            "Pri".to_string(),
            "Done".to_string(),
            "Text".to_string(),
        ];
        if view.multi_select {
            headers.insert(0, "Sel".to_string());
        }

        let mut rows = Vec::with_capacity(view.tasks.len());
        for task in &view.tasks {
            let id = self.paint(&task.id.to_string(), "33");
            let priority = self.paint(task.priority.as_str(), priority_color(task.priority));
            let done = if task.completed { "x" } else { "" }.to_string();
            let text = if task.completed {
                self.paint(&task.text, "9")
            } else {
                task.text.clone()
            };

            let mut row = vec![id, priority, done, text];
            if view.multi_select {
                let mark = if view.selected.contains(&task.id) { "*" } else { "" };
                row.insert(0, mark.to_string());
            }
            rows.push(row);
        }

        write_table(&mut writer, headers, rows)?;
        writeln!(writer)?;
        writeln!(writer, "{} task(s), filter: {}", view.tasks.len(), view.filter)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "31",
        Priority::Medium => "33",
        Priority::Low => "32",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let mut line = String::new();
    for idx in 0..column_count {
        line.push_str(&format!("{:width$} ", headers[idx], width = widths[idx]));
    }
    writeln!(writer, "{}", line.trim_end())?;

    line.clear();
    for width in &widths {
        line.push_str(&format!("{:-<width$} ", "", width = width));
    }
    writeln!(writer, "{}", line.trim_end())?;

    for row in rows {
        line.clear();
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            line.push_str(&format!("{}{} ", cell, " ".repeat(padding)));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
