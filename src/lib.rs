
pub mod error;
pub mod workbook;

pub use error::XlsxStreamError;
pub use workbook::{
    StreamWriter,
    archive::ArchiveOptions,
    builder::StreamWriterBuilder,
    cell::{CellValue, Row},
    policy::{AlternatingRows, StylePolicy},
    source::{RowSender, RowSource},
    style::{CompiledStyles, Font, StyleRequest, StyleSet},
};
pub use zip::CompressionMethod;

pub type Result<T> = std::result::Result<T, error::XlsxStreamError>;
