//! XLSX export rendering

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use serde_json::Value;
use tracing::debug;

use crate::config::{ExportStyle, HeaderAlign, RenderContext};
use crate::model::{tablize, CellValue};

use super::{extract_records, Rendered, Renderer, DEFAULT_STATUS};

/// Renderer for single-sheet XLSX workbooks
pub struct XlsxRenderer;

impl Renderer for XlsxRenderer {
    fn media_type(&self) -> &'static str {
        "application/xlsx"
    }

    fn render(&self, data: Option<&Value>, ctx: &RenderContext) -> Result<Rendered> {
        let status = ctx.status_code.unwrap_or(DEFAULT_STATUS);
        let Some(data) = data else {
            return Ok(Rendered::new(Vec::new(), self.media_type(), status));
        };

        let dataset = extract_records(data, &ctx.data_key)?;
        let style = ctx.export_style.merged(&ExportStyle::default());

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let header_format = header_format(&style);

        let mut row_count: u32 = 0;
        for row in tablize(dataset, ctx.header.clone()) {
            let row = row?;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                if row_count == 0 {
                    worksheet
                        .write_string_with_format(0, col, cell.display().into_owned(), &header_format)
                        .with_context(|| format!("Failed to write header at column {col}"))?;
                } else {
                    write_cell(worksheet, row_count, col, cell).with_context(|| {
                        format!("Failed to write cell at ({row_count}, {col})")
                    })?;
                }
            }
            row_count += 1;
        }

        if row_count > 0 {
            worksheet
                .set_row_height(0, style.header_height)
                .context("Failed to set header row height")?;
            if style.freeze_header {
                worksheet
                    .set_freeze_panes(1, 0)
                    .context("Failed to freeze header row")?;
            }
            // Header repeats at the top of every printed page
            worksheet
                .set_repeat_rows(0, 0)
                .context("Failed to set print title row")?;
        }

        let body = workbook
            .save_to_buffer()
            .context("Failed to save workbook to buffer")?;

        debug!(rows = row_count, bytes = body.len(), "rendered xlsx export");

        Ok(Rendered::new(body, self.media_type(), status))
    }
}

fn header_format(style: &ExportStyle) -> Format {
    let mut format = Format::new()
        .set_background_color(Color::RGB(style.header_fill))
        .set_align(match style.header_align {
            HeaderAlign::Top => FormatAlign::Top,
            HeaderAlign::Center => FormatAlign::VerticalCenter,
            HeaderAlign::Bottom => FormatAlign::Bottom,
        });
    if style.header_bold {
        format = format.set_bold();
    }
    format
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Number(n) => match n.as_f64() {
            Some(v) => {
                worksheet.write_number(row, col, v)?;
            }
            None => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
    }
    Ok(())
}
