//! tabrender - Response renderers for web APIs
//!
//! Turns view payloads into response bytes: JSON wrapped in a normalized
//! `{ret, msg, data}` envelope, and CSV or XLSX downloads built from
//! list-shaped data through a lazy flatten/tablize pipeline.

pub mod config;
pub mod model;
pub mod render;

pub use config::{ExportFormat, ExportStyle, RenderContext, StyleOverride, WriterOpts};
pub use model::{tablize, CellValue, Dataset};
pub use render::{CsvRenderer, JsonRenderer, Rendered, Renderer, RendererFactory, XlsxRenderer};
