use crate::{
    error::{Error, Result},
    sink::{DocumentSink, Part},
    template::TemplateEngine,
};
use serde::Serialize;
use std::{fs, io::Write, path::Path};
use tracing::debug;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = include_str!("../templates/docx/content_types.xml");
const PACKAGE_RELS: &str = include_str!("../templates/docx/rels.xml");
const DOCUMENT_RELS: &str = include_str!("../templates/docx/document.xml.rels");
const STYLES: &str = include_str!("../templates/docx/styles.xml");

/// Body element of a document under construction.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Block {
    Heading { text: String },
    Table { rows: Vec<Row> },
    Separator,
}

/// One line of a code table.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Row {
    number: usize,
    text: String,
    preserve: bool,
}

/// A `.docx` document held in memory until saved.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    pub(crate) appendix_label: String,
    pub(crate) blocks: Vec<Block>,
}

impl DocxDocument {
    /// Returns the appendix label in the header.
    #[must_use]
    pub fn appendix_label(&self) -> &str {
        &self.appendix_label
    }

    /// Returns the number of code table rows across all listings.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Table { rows } => rows.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Formats a listing title.
#[must_use]
pub fn listing_title(number: usize, relative_name: &str, part: Option<Part>) -> String {
    match part {
        Some(part) => format!("Листинг {number} — {relative_name} ({part})"),
        None => format!("Листинг {number} — {relative_name}"),
    }
}

/// Writes listings as WordprocessingML packages.
///
/// Layout: Courier New 12 pt, a centred appendix header, and per listing a
/// title kept with the next paragraph followed by a two-column table
/// (16 mm numbers, 170 mm code) with only the outer border drawn.
pub struct DocxWriter {
    engine: TemplateEngine,
}

impl DocxWriter {
    /// Creates a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if template initialization fails.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
        })
    }

    /// Writes the package to a temporary file, then renames it into place.
    fn write_file_atomic(&self, path: &Path, parts: &[(&str, &[u8])]) -> Result<()> {
        let temp_path = path.with_extension("tmp");
        let temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        let written = write_package(temp_file, parts, path).and_then(|file| {
            file.sync_all().map_err(|e| Error::io(&temp_path, e))
        });

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}

impl DocumentSink for DocxWriter {
    type Handle = DocxDocument;

    fn new_document(&mut self, appendix_label: &str) -> Self::Handle {
        DocxDocument {
            appendix_label: appendix_label.to_string(),
            blocks: Vec::new(),
        }
    }

    fn add_listing_heading(
        &mut self,
        doc: &mut Self::Handle,
        number: usize,
        relative_name: &str,
        part: Option<Part>,
    ) {
        doc.blocks.push(Block::Heading {
            text: listing_title(number, relative_name, part),
        });
    }

    fn add_code_table(&mut self, doc: &mut Self::Handle, lines: &[&str], first_line: usize) {
        let rows = lines
            .iter()
            .enumerate()
            .map(|(i, line)| Row {
                number: first_line + i,
                text: (*line).to_string(),
                // Word collapses leading and repeated spaces otherwise.
                preserve: line.starts_with(' ') || line.contains("  "),
            })
            .collect();

        doc.blocks.push(Block::Table { rows });
    }

    fn add_separator(&mut self, doc: &mut Self::Handle) {
        doc.blocks.push(Block::Separator);
    }

    fn save(&mut self, doc: Self::Handle, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let document = self.engine.render_document(&doc)?;
        let core = self
            .engine
            .render_core(&format!("Приложение {}", doc.appendix_label))?;

        self.write_file_atomic(
            path,
            &[
                ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
                ("_rels/.rels", PACKAGE_RELS.as_bytes()),
                ("docProps/core.xml", core.as_bytes()),
                ("word/document.xml", document.as_bytes()),
                ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
                ("word/styles.xml", STYLES.as_bytes()),
            ],
        )?;

        debug!("Wrote {} ({} rows)", path.display(), doc.row_count());
        Ok(())
    }
}

fn write_package(file: fs::File, parts: &[(&str, &[u8])], path: &Path) -> Result<fs::File> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for &(name, data) in parts {
        zip.start_file(name, options)
            .map_err(|e| Error::archive(path, e))?;
        zip.write_all(data).map_err(|e| Error::io(path, e))?;
    }

    zip.finish().map_err(|e| Error::archive(path, e))
}
