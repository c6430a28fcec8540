use crate::{
    error::{Error, Result},
    writer::DocxDocument,
};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

const DOCUMENT_TEMPLATE: &str = "document";
const CORE_TEMPLATE: &str = "core";

/// Width of the line number column, mm.
pub(crate) const NUMBER_COLUMN_MM: u32 = 16;

/// Width of the code column, mm.
pub(crate) const CODE_COLUMN_MM: u32 = 170;

/// Converts millimetres to twentieths of a point.
#[must_use]
pub(crate) const fn dxa_from_mm(mm: u32) -> u32 {
    mm * 567 / 10
}

#[derive(Serialize)]
struct DocumentContext<'a> {
    appendix_label: &'a str,
    blocks: &'a [crate::writer::Block],
    number_width: u32,
    code_width: u32,
}

#[derive(Serialize)]
struct CoreContext<'a> {
    title: &'a str,
    creator: &'a str,
    created: String,
}

/// Renders the XML parts of a document package.
pub(crate) struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Creates the engine with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to parse.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_template(
            DOCUMENT_TEMPLATE,
            include_str!("../templates/docx/document.xml.tera"),
        )
        .map_err(|e| Error::template(DOCUMENT_TEMPLATE, e))?;

        tera.add_raw_template(CORE_TEMPLATE, include_str!("../templates/docx/core.xml.tera"))
            .map_err(|e| Error::template(CORE_TEMPLATE, e))?;

        tera.register_filter("xml_escape", Self::xml_escape_filter);

        Ok(Self { tera })
    }

    /// XML escape filter implementation.
    fn xml_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        match value.as_str() {
            Some(s) => Ok(Value::String(xml_escape(s))),
            None => Ok(value.clone()),
        }
    }

    /// Renders `word/document.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub(crate) fn render_document(&self, doc: &DocxDocument) -> Result<String> {
        let context = DocumentContext {
            appendix_label: &doc.appendix_label,
            blocks: &doc.blocks,
            number_width: dxa_from_mm(NUMBER_COLUMN_MM),
            code_width: dxa_from_mm(CODE_COLUMN_MM),
        };

        self.render(DOCUMENT_TEMPLATE, &context)
    }

    /// Renders `docProps/core.xml`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub(crate) fn render_core(&self, title: &str) -> Result<String> {
        let context = CoreContext {
            title,
            creator: env!("CARGO_PKG_NAME"),
            created: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        };

        self.render(CORE_TEMPLATE, &context)
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let context = Context::from_serialize(context).map_err(|e| Error::template(name, e))?;

        self.tera
            .render(name, &context)
            .map_err(|e| Error::template(name, e))
    }
}

/// Escapes the five XML special characters.
#[must_use]
pub(crate) fn xml_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
