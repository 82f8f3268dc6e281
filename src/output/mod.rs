use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use thiserror::Error;

use crate::model::ListItem;
use crate::render::{document, DisplayTree};
use crate::state::ListState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to write {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to terminal: {0}")]
    Terminal(#[source] std::io::Error),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Receives every freshly rendered tree.
pub trait DisplaySurface {
    fn present(&mut self, tree: &DisplayTree) -> Result<(), SurfaceError>;
}

/// Rewrites a file with the latest tree on every present.
#[derive(Clone, Debug)]
pub struct FileSurface {
    path: PathBuf,
    format: OutputFormat,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct TreeRecord<'a> {
    title: &'a str,
    text: String,
    html: String,
}

impl DisplaySurface for FileSurface {
    fn present(&mut self, tree: &DisplayTree) -> Result<(), SurfaceError> {
        let bytes = match self.format {
            OutputFormat::Html => document::render_document(tree, None).into_bytes(),
            OutputFormat::Text => tree.to_text().into_bytes(),
            OutputFormat::Json => serde_json::to_vec_pretty(&TreeRecord {
                title: &tree.title,
                text: tree.to_text(),
                html: tree.to_html(),
            })?,
        };
        std::fs::write(&self.path, bytes).map_err(|e| SurfaceError::File {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

/// Colored text frames on a terminal-like writer.
pub struct TerminalSurface<W: Write = std::io::Stdout> {
    out: W,
    clear: bool,
}

impl TerminalSurface {
    pub fn stdout(clear: bool) -> Self {
        Self::new(std::io::stdout(), clear)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn paint_line(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with('[') {
        line.cyan().to_string()
    } else if trimmed.starts_with("Gagal") {
        line.red().to_string()
    } else {
        line.to_string()
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn present(&mut self, tree: &DisplayTree) -> Result<(), SurfaceError> {
        let mut frame = String::new();
        if self.clear {
            frame.push_str("\x1b[2J\x1b[H");
        }
        frame.push_str(&format!(":: {}\n", tree.title.bold().green()));
        for line in tree.to_text().lines() {
            frame.push_str(&paint_line(line));
            frame.push('\n');
        }
        self.out
            .write_all(frame.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(SurfaceError::Terminal)
    }
}

/// Machine-readable view of one list page.
#[derive(Clone, Debug, Serialize)]
pub struct PageRecord<'a> {
    pub source: &'a str,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
    pub matched: usize,
    pub search: &'a str,
    pub window: &'static str,
    pub items: Vec<&'a ListItem>,
}

pub fn build_page_record<'a>(source: &'a str, state: &'a ListState) -> PageRecord<'a> {
    PageRecord {
        source,
        page: state.page(),
        page_count: state.page_count(),
        page_size: state.page_size(),
        total: state.total_len(),
        matched: state.filtered_len(),
        search: state.search_term(),
        window: state.time_window().as_str(),
        items: state.current_page(),
    }
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SurfaceError> {
    let mut out = serde_json::to_vec_pretty(value)?;
    out.push(b'\n');
    Ok(out)
}
