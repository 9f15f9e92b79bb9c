use futures::{
    SinkExt, Stream, StreamExt, TryStreamExt,
    channel::mpsc,
    stream::{self, BoxStream},
};
use serde_json::Value;

use crate::{
    Result,
    error::{BoxError, XlsxStreamError},
    workbook::cell::{CellValue, Row},
};

pub(crate) type RowStream = BoxStream<'static, std::result::Result<Row, BoxError>>;

/// Rows handed to [`StreamWriter::add_rows`](crate::StreamWriter::add_rows).
///
/// A finite collection and a live producer go through the same pipeline;
/// collections are simply wrapped into a stream first.
pub enum RowSource {
    Rows(Vec<Row>),
    Stream(RowStream),
}

impl RowSource {
    /// Live producer whose items may fail; the first error aborts the write.
    pub fn try_stream<S, E>(rows: S) -> Self
    where
        S: Stream<Item = std::result::Result<Row, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        RowSource::Stream(rows.map_err(Into::into).boxed())
    }

    pub fn stream<S>(rows: S) -> Self
    where
        S: Stream<Item = Row> + Send + 'static,
    {
        RowSource::Stream(rows.map(Ok).boxed())
    }

    /// Lazily pulled rows.
    pub fn iter<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'static,
    {
        RowSource::Stream(stream::iter(rows.into_iter().map(Ok)).boxed())
    }

    /// Push-based producer: rows sent on the returned [`RowSender`] are written
    /// until every sender is dropped.
    pub fn channel(buffer: usize) -> (RowSender, RowSource) {
        let (tx, rx) = mpsc::channel(buffer);
        (RowSender { tx }, RowSource::Stream(rx.boxed()))
    }

    /// Accepts a JSON array of arrays. Anything else is rejected up front.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Array(rows) = value else {
            return Err(XlsxStreamError::InvalidInput(format!(
                "expected an array of rows, got {}",
                json_kind(value)
            )));
        };

        rows.iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Array(cells) => Ok(cells.iter().map(CellValue::from_json).collect()),
                other => Err(XlsxStreamError::InvalidInput(format!(
                    "row {i} must be an array, got {}",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<Row>>>()
            .map(RowSource::Rows)
    }

    pub(crate) fn into_stream(self) -> RowStream {
        match self {
            RowSource::Rows(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            RowSource::Stream(s) => s,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<T: Into<CellValue>> From<Vec<Vec<T>>> for RowSource {
    fn from(rows: Vec<Vec<T>>) -> Self {
        RowSource::Rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

impl<T: Into<CellValue>, const M: usize, const N: usize> From<[[T; M]; N]> for RowSource {
    fn from(rows: [[T; M]; N]) -> Self {
        RowSource::Rows(
            rows.into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

impl FromIterator<Row> for RowSource {
    fn from_iter<I: IntoIterator<Item = Row>>(rows: I) -> Self {
        RowSource::Rows(rows.into_iter().collect())
    }
}

/// Sending half of [`RowSource::channel`].
#[derive(Clone)]
pub struct RowSender {
    tx: mpsc::Sender<std::result::Result<Row, BoxError>>,
}

impl RowSender {
    pub async fn send<I, V>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let row: Row = row.into_iter().map(Into::into).collect();
        self.tx
            .send(Ok(row))
            .await
            .map_err(|e| XlsxStreamError::Source(Box::new(e)))
    }

    /// Aborts the consuming `add_rows` call with `err`.
    pub async fn fail(mut self, err: impl Into<BoxError>) -> Result<()> {
        self.tx
            .send(Err(err.into()))
            .await
            .map_err(|e| XlsxStreamError::Source(Box::new(e)))
    }
}
