//! Per-call render configuration

/// Output format for a render call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xlsx,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Field quoting behavior for CSV output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Quote only fields that require it
    #[default]
    Necessary,
    /// Quote every field
    Always,
    /// Quote non-numeric fields
    NonNumeric,
    /// Never quote; fields that would need quoting become errors
    Never,
}

/// Record terminator for CSV rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Terminator {
    /// `\r\n`, what spreadsheet applications expect
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

/// CSV writer settings, forwarded to the writer
#[derive(Debug, Clone)]
pub struct WriterOpts {
    /// Field delimiter
    pub delimiter: u8,
    /// Quote character
    pub quote: u8,
    /// When fields are quoted
    pub quote_style: QuoteStyle,
    /// Row terminator
    pub terminator: Terminator,
}

impl Default for WriterOpts {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            quote_style: QuoteStyle::default(),
            terminator: Terminator::default(),
        }
    }
}

impl WriterOpts {
    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quoting behavior
    pub fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }
}

/// Vertical alignment of header cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Styling applied to the header row of a spreadsheet export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStyle {
    /// Bold header text
    pub header_bold: bool,
    /// Header cell fill color (RGB)
    pub header_fill: u32,
    /// Vertical alignment of header cells
    pub header_align: HeaderAlign,
    /// Header row height in points
    pub header_height: f64,
    /// Keep the header row visible while scrolling
    pub freeze_header: bool,
}

impl Default for ExportStyle {
    fn default() -> Self {
        Self {
            header_bold: true,
            header_fill: 0x87CEFA,
            header_align: HeaderAlign::Center,
            header_height: 18.0,
            freeze_header: true,
        }
    }
}

/// Partial [`ExportStyle`]; unset fields fall back to the defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverride {
    pub header_bold: Option<bool>,
    pub header_fill: Option<u32>,
    pub header_align: Option<HeaderAlign>,
    pub header_height: Option<f64>,
    pub freeze_header: Option<bool>,
}

impl StyleOverride {
    /// Merge this override onto a base style, field by field
    pub fn merged(&self, base: &ExportStyle) -> ExportStyle {
        ExportStyle {
            header_bold: self.header_bold.unwrap_or(base.header_bold),
            header_fill: self.header_fill.unwrap_or(base.header_fill),
            header_align: self.header_align.unwrap_or(base.header_align),
            header_height: self.header_height.unwrap_or(base.header_height),
            freeze_header: self.freeze_header.unwrap_or(base.freeze_header),
        }
    }
}

/// Options for coercing non-JSON payload values
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// strftime-style format applied to datetime payloads
    pub datetime_format: String,
    /// Encode decimals as strings instead of floats
    pub decimal_as_string: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            decimal_as_string: true,
        }
    }
}

/// Per-invocation context for a render call
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Upstream response status. `None` renders JSON without an envelope.
    pub status_code: Option<u16>,
    /// Request identifier echoed into the JSON envelope
    pub request_id: Option<String>,
    /// Explicit column order; inferred from the first record when absent
    pub header: Option<Vec<String>>,
    /// Key under which a mapping payload carries its rows
    pub data_key: String,
    /// CSV writer settings
    pub writer_opts: WriterOpts,
    /// Text encoding for CSV output. Defaults to gbk so the file opens
    /// cleanly in Excel, which mis-decodes plain UTF-8 CSV. Override per
    /// call when UTF-8 is wanted.
    pub encoding: String,
    /// Header styling override for spreadsheet exports
    pub export_style: StyleOverride,
    /// Pretty-print JSON, for browsable clients
    pub pretty: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            status_code: None,
            request_id: None,
            header: None,
            data_key: "results".to_string(),
            writer_opts: WriterOpts::default(),
            encoding: "gbk".to_string(),
            export_style: StyleOverride::default(),
            pretty: false,
        }
    }
}

impl RenderContext {
    /// Create a context carrying the upstream response status
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Default::default()
        }
    }

    /// Set the upstream response status
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Set the request identifier
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set an explicit column order
    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = Some(header);
        self
    }

    /// Set the key rows are pulled from in a mapping payload
    pub fn with_data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = key.into();
        self
    }

    /// Set CSV writer settings
    pub fn with_writer_opts(mut self, opts: WriterOpts) -> Self {
        self.writer_opts = opts;
        self
    }

    /// Set the CSV output encoding
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set the spreadsheet header style override
    pub fn with_export_style(mut self, style: StyleOverride) -> Self {
        self.export_style = style;
        self
    }

    /// Enable pretty-printed JSON output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("csv".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("XLSX".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_style_override_merge_keeps_defaults() {
        let over = StyleOverride {
            header_fill: Some(0xFFFFFF),
            ..Default::default()
        };
        let merged = over.merged(&ExportStyle::default());

        assert_eq!(merged.header_fill, 0xFFFFFF);
        // Unset fields keep the component defaults
        assert!(merged.header_bold);
        assert_eq!(merged.header_height, 18.0);
        assert!(merged.freeze_header);
    }

    #[test]
    fn test_context_defaults() {
        let ctx = RenderContext::default();
        assert_eq!(ctx.data_key, "results");
        assert_eq!(ctx.encoding, "gbk");
        assert_eq!(ctx.status_code, None);
    }
}
