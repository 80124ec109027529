//! CSV export rendering

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{QuoteStyle, RenderContext, Terminator, WriterOpts};
use crate::model::tablize;

use super::{extract_records, Rendered, Renderer, DEFAULT_STATUS};

/// Error producing bytes in the requested text encoding
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    #[error("unknown encoding label: {0}")]
    UnknownLabel(String),
    #[error("output contains characters not representable in {0}")]
    Unmappable(&'static str),
}

/// Renderer for CSV exports
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn media_type(&self) -> &'static str {
        "text/csv"
    }

    fn render(&self, data: Option<&Value>, ctx: &RenderContext) -> Result<Rendered> {
        let status = ctx.status_code.unwrap_or(DEFAULT_STATUS);
        let Some(data) = data else {
            return Ok(Rendered::new(Vec::new(), self.media_type(), status));
        };

        let dataset = extract_records(data, &ctx.data_key)?;
        let mut writer = writer_builder(&ctx.writer_opts).from_writer(Vec::new());

        let mut row_count = 0usize;
        for row in tablize(dataset, ctx.header.clone()) {
            let row = row?;
            writer
                .write_record(row.iter().map(|cell| cell.display().into_owned()))
                .with_context(|| format!("Failed to write CSV row {}", row_count + 1))?;
            row_count += 1;
        }

        let buffer = writer.into_inner().context("Failed to flush CSV writer")?;
        let text = String::from_utf8(buffer).context("CSV buffer contained invalid UTF-8")?;
        let body = encode_text(&text, &ctx.encoding)?;

        debug!(
            rows = row_count,
            encoding = %ctx.encoding,
            bytes = body.len(),
            "rendered csv export"
        );

        Ok(Rendered::new(body, self.media_type(), status))
    }
}

fn writer_builder(opts: &WriterOpts) -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(opts.delimiter)
        .quote(opts.quote)
        .quote_style(match opts.quote_style {
            QuoteStyle::Necessary => csv::QuoteStyle::Necessary,
            QuoteStyle::Always => csv::QuoteStyle::Always,
            QuoteStyle::NonNumeric => csv::QuoteStyle::NonNumeric,
            QuoteStyle::Never => csv::QuoteStyle::Never,
        })
        .terminator(match opts.terminator {
            Terminator::Crlf => csv::Terminator::CRLF,
            Terminator::Lf => csv::Terminator::Any(b'\n'),
        });
    builder
}

/// Encode text for output, erroring on characters the target cannot carry
fn encode_text(text: &str, label: &str) -> Result<Vec<u8>, EncodeError> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodeError::UnknownLabel(label.to_string()))?;

    if encoding == encoding_rs::UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }

    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(EncodeError::Unmappable(encoding.name()));
    }
    Ok(bytes.into_owned())
}
