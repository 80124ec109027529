//! Output renderers for response payloads

mod csv;
mod json;
mod xlsx;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::config::{ExportFormat, RenderContext};
use crate::model::Dataset;

pub use self::csv::{CsvRenderer, EncodeError};
pub use self::json::{IntoPayload, JsonRenderer};
pub use self::xlsx::XlsxRenderer;

/// Transport status reported when the context carries none
const DEFAULT_STATUS: u16 = 200;

/// A rendered response body
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Raw body bytes
    pub body: Vec<u8>,
    /// Media type the bytes represent
    pub media_type: &'static str,
    /// Transport status to emit alongside the body
    pub status: u16,
}

impl Rendered {
    fn new(body: Vec<u8>, media_type: &'static str, status: u16) -> Self {
        Self {
            body,
            media_type,
            status,
        }
    }
}

/// Trait for response renderers
pub trait Renderer {
    /// Media type of the rendered bytes
    fn media_type(&self) -> &'static str;

    /// Render a payload to bytes
    fn render(&self, data: Option<&Value>, ctx: &RenderContext) -> Result<Rendered>;
}

/// Factory for creating renderers based on export format
pub struct RendererFactory;

impl RendererFactory {
    /// Create a renderer for the given format
    pub fn create(format: ExportFormat) -> Box<dyn Renderer> {
        match format {
            ExportFormat::Json => Box::new(JsonRenderer),
            ExportFormat::Csv => Box::new(CsvRenderer),
            ExportFormat::Xlsx => Box::new(XlsxRenderer),
        }
    }
}

/// Render a payload with the renderer for the given format
pub fn render(format: ExportFormat, data: Option<&Value>, ctx: &RenderContext) -> Result<Rendered> {
    RendererFactory::create(format).render(data, ctx)
}

/// Pull the exportable rows out of a payload.
///
/// A mapping payload carries its rows under `data_key`; a missing key means
/// an empty dataset. An array payload is the rows itself.
fn extract_records<'a>(data: &'a Value, data_key: &str) -> Result<Dataset<'a>> {
    match data {
        Value::Array(items) => Ok(Dataset::new(items)),
        Value::Object(map) => match map.get(data_key) {
            None => Ok(Dataset::new(&[])),
            Some(Value::Array(items)) => Ok(Dataset::new(items)),
            Some(_) => bail!("value under key {:?} is not a record list", data_key),
        },
        _ => bail!("payload is neither a mapping nor a record list"),
    }
}
