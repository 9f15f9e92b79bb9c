use std::path::{Path, PathBuf};

use futures::StreamExt;
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    Result,
    error::XlsxStreamError,
    workbook::{
        archive::{ArchiveOptions, Part},
        builder::StreamWriterBuilder,
        policy::StylePolicy,
        sheet::{RowEncoder, SheetSpool, StringMode},
        source::{RowSource, RowStream},
        strings::SharedStringTable,
        style::CompiledStyles,
    },
};
pub mod archive;
pub mod builder;
pub mod cell;
pub mod policy;
pub(crate) mod sheet;
pub mod source;
pub mod strings;
pub mod style;

/// Worksheet maximum row count.
pub const MAX_ROWS: u32 = 1_048_576;
/// Worksheet maximum column count.
pub const MAX_COLUMNS: u32 = 16_384;

const CONTENT_TYPES: &str = r#"
    <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
    <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
        <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
        <Default Extension="xml" ContentType="application/xml"/>
        <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
        <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
        <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
        <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
    </Types>
"#;

const RELS_DOT_RELS: &str = r#"
    <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
    <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
        <Relationship Id="rId1"
                      Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"
                      Target="xl/workbook.xml"/>
    </Relationships>
"#;

const WORKBOOK: &str = r#"
    <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
    <workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
              xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
        <bookViews>
            <workbookView activeTab="0"/>
        </bookViews>
        <sheets>
            <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
        </sheets>
    </workbook>
"#;

const WORKBOOK_RELS: &str = r#"
    <?xml version="1.0" encoding="UTF-8" standalone="yes"?>
    <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
        <Relationship Id="rId1"
                      Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"
                      Target="worksheets/sheet1.xml"/>
        <Relationship Id="rId2"
                      Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"
                      Target="styles.xml"/>
        <Relationship Id="rId3"
                      Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings"
                      Target="sharedStrings.xml"/>
    </Relationships>
"#;

/// Spools that only exist until the writer is finalized.
struct Spools {
    sheet: SheetSpool,
    strings: SharedStringTable,
}

struct WriterState {
    row_index: u32,
    unique_strings: u32,
    spools: Option<Spools>,
}

/// Streaming single-sheet XLSX writer.
///
/// Rows are encoded and appended to a spool file as they arrive; shared
/// strings are spooled separately and only wrapped into their final document
/// by [`StreamWriter::get_file`]. All methods take `&self`, so a writer can be
/// shared through an `Arc` by concurrent producers. Overlapping calls are
/// served one at a time, in arrival order.
pub struct StreamWriter {
    state: Mutex<WriterState>,
    styles: CompiledStyles,
    policy: Box<dyn StylePolicy>,
    inline_strings: bool,
    spool_dir: Option<PathBuf>,
    archive: ArchiveOptions,
}

impl StreamWriter {
    /// Writer with the default style set, shared strings and system temp spools.
    pub fn new() -> Result<Self> {
        StreamWriterBuilder::new().build()
    }

    pub fn builder() -> StreamWriterBuilder {
        StreamWriterBuilder::new()
    }

    pub(crate) fn from_parts(
        styles: CompiledStyles,
        policy: Box<dyn StylePolicy>,
        inline_strings: bool,
        spool_dir: Option<PathBuf>,
        archive: ArchiveOptions,
    ) -> Result<Self> {
        let dir = spool_dir.as_deref();
        let spools = Spools {
            sheet: SheetSpool::new(dir)?,
            strings: SharedStringTable::new(dir)?,
        };
        Ok(StreamWriter {
            state: Mutex::new(WriterState {
                row_index: 0,
                unique_strings: 0,
                spools: Some(spools),
            }),
            styles,
            policy,
            inline_strings,
            spool_dir,
            archive,
        })
    }

    /// Appends every row of `source` to the sheet and returns how many were written.
    ///
    /// Waits for any in-flight `add_rows`/`get_file` call first. Row numbering
    /// continues from previous calls. On error the rows spooled so far stay in
    /// the sheet; treat the writer as unusable afterwards.
    pub async fn add_rows(&self, source: impl Into<RowSource>) -> Result<u32> {
        let mut rows = source.into().into_stream();

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let spools = state.spools.as_mut().ok_or(XlsxStreamError::Finalized)?;

        let start = state.row_index;
        let result = self.write_rows(&mut rows, &mut state.row_index, spools).await;
        match &result {
            Ok(n) => debug!(start, rows = n, "rows spooled"),
            Err(e) => warn!(start, at = state.row_index, error = %e, "add_rows aborted"),
        }
        result
    }

    /// Validates a JSON array of arrays and appends it.
    pub async fn add_json_rows(&self, rows: &Value) -> Result<u32> {
        let source = RowSource::from_json(rows)?;
        self.add_rows(source).await
    }

    async fn write_rows(
        &self,
        rows: &mut RowStream,
        row_index: &mut u32,
        spools: &mut Spools,
    ) -> Result<u32> {
        let mut written = 0;
        while let Some(row) = rows.next().await {
            let row = row.map_err(XlsxStreamError::Source)?;

            let strings = if self.inline_strings {
                StringMode::Inline
            } else {
                StringMode::Shared(&mut spools.strings)
            };
            let mut encoder = RowEncoder {
                policy: self.policy.as_ref(),
                strings,
            };
            let fragment = encoder.encode_row(&row, *row_index)?;
            spools.sheet.append(&fragment)?;

            *row_index += 1;
            written += 1;
        }
        spools.sheet.flush()?;
        Ok(written)
    }

    /// Finalizes shared strings and the sheet, then packages the workbook.
    ///
    /// Waits for in-flight `add_rows` calls. Succeeds once; later calls to
    /// either method fail with [`XlsxStreamError::Finalized`].
    pub async fn get_file(&self) -> Result<Vec<u8>> {
        let (spools, rows, unique_strings) = {
            let mut state = self.state.lock().await;
            let spools = state.spools.take().ok_or(XlsxStreamError::Finalized)?;
            state.unique_strings = spools.strings.unique_count();
            (spools, state.row_index, state.unique_strings)
        };

        let spool_dir = self.spool_dir.clone();
        let styles_xml = self.styles.xml.clone();
        let options = self.archive;

        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let Spools { sheet, strings } = spools;
            let shared_strings = strings.finalize(spool_dir.as_deref())?;
            let sheet = sheet.finish()?;

            let parts = vec![
                Part::text("[Content_Types].xml", compact_xml(CONTENT_TYPES)),
                Part::text("_rels/.rels", compact_xml(RELS_DOT_RELS)),
                Part::text("xl/workbook.xml", compact_xml(WORKBOOK)),
                Part::text("xl/styles.xml", styles_xml),
                Part::text("xl/_rels/workbook.xml.rels", compact_xml(WORKBOOK_RELS)),
                Part::spool("xl/worksheets/sheet1.xml", sheet),
                Part::spool("xl/sharedStrings.xml", shared_strings),
            ];
            archive::pack(parts, options)
        })
        .await??;

        info!(rows, unique_strings, bytes = bytes.len(), "workbook packaged");
        Ok(bytes)
    }

    /// [`StreamWriter::get_file`], written to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.get_file().await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Rows written so far across all `add_rows` calls.
    pub async fn row_count(&self) -> u32 {
        self.state.lock().await.row_index
    }

    pub async fn unique_string_count(&self) -> u32 {
        let state = self.state.lock().await;
        match &state.spools {
            Some(spools) => spools.strings.unique_count(),
            None => state.unique_strings,
        }
    }

    /// Cell-format index of each registered style request, in registration order.
    pub fn style_indices(&self) -> &[u32] {
        &self.styles.indices
    }

    pub fn styles_xml(&self) -> &str {
        &self.styles.xml
    }
}

/// Creates a spool file in `dir`, or the system temp dir.
pub(crate) fn new_spool(dir: Option<&Path>, prefix: &str) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(".xml");
    match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
}

/// `row` is 1-based, `col` is 0-based.
pub(crate) fn make_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letters(col), row)
}

/// Column letters for a 0-based column index: 0 is `A`, 26 is `AA`.
pub fn col_to_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    loop {
        result.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result.reverse();
    result.into_iter().map(char::from).collect()
}

/// Escapes markup characters.
///
/// Lossy: C0 controls other than tab, newline and carriage return, and the
/// noncharacters U+FFFE / U+FFFF, are not legal XML 1.0 and are dropped.
pub(crate) fn xml_escape(s: &str) -> String {
    let is_plain = |ch: char| {
        !matches!(ch, '&' | '<' | '>' | '"' | '\'') && !is_forbidden_control(ch)
    };
    if s.chars().all(is_plain) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_forbidden_control(c) => {}
            _ => out.push(ch),
        }
    }
    out
}

fn is_forbidden_control(ch: char) -> bool {
    ((ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r'))
        || matches!(ch, '\u{FFFE}' | '\u{FFFF}')
}

/// Collapses whitespace runs to one space and drops whitespace between tags.
pub(crate) fn compact_xml(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut pending_space = false;
    for ch in xml.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !(out.ends_with('>') && ch == '<') {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::CellValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
        assert_eq!(col_to_letters(MAX_COLUMNS - 1), "XFD");
    }

    #[test]
    fn cell_refs() {
        assert_eq!(make_cell_ref(1, 0), "A1");
        assert_eq!(make_cell_ref(10, 27), "AB10");
    }

    #[test]
    fn escape_markup_and_controls() {
        assert_eq!(xml_escape("plain"), "plain");
        assert_eq!(xml_escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
        assert_eq!(xml_escape("tab\there\u{1}"), "tab\there");
        assert_eq!(xml_escape("a\u{FFFE}b\u{FFFF}"), "ab");
        assert_eq!(xml_escape("line\r\nnext"), "line\r\nnext");
    }

    #[test]
    fn compaction_keeps_attribute_spacing() {
        let xml = "\n  <a x=\"1\"\n     y=\"2\">\n   <b/>\n  </a>\n";
        assert_eq!(compact_xml(xml), r#"<a x="1" y="2"><b/></a>"#);
    }

    #[test]
    fn fixed_parts_start_with_declaration() {
        for part in [CONTENT_TYPES, RELS_DOT_RELS, WORKBOOK, WORKBOOK_RELS] {
            let xml = compact_xml(part);
            assert!(xml.starts_with("<?xml version=\"1.0\""));
            assert!(!xml.contains("> <"));
        }
    }

    #[tokio::test]
    async fn counters_persist_across_calls() {
        let writer = StreamWriter::new().unwrap();
        assert_eq!(writer.add_rows([["Name", "Loc"]]).await.unwrap(), 1);
        assert_eq!(
            writer
                .add_rows(vec![vec!["A", "X"], vec!["B", "Loc"]])
                .await
                .unwrap(),
            2
        );
        assert_eq!(writer.add_rows(Vec::<Vec<f64>>::new()).await.unwrap(), 0);
        assert_eq!(writer.row_count().await, 3);
        assert_eq!(writer.unique_string_count().await, 5);
    }

    #[tokio::test]
    async fn finalized_writer_rejects_further_calls() {
        let writer = StreamWriter::new().unwrap();
        writer.add_rows([[1, 2]]).await.unwrap();
        writer.get_file().await.unwrap();

        assert!(matches!(
            writer.add_rows([[3]]).await,
            Err(XlsxStreamError::Finalized)
        ));
        assert!(matches!(
            writer.get_file().await,
            Err(XlsxStreamError::Finalized)
        ));
        assert_eq!(writer.row_count().await, 1);
    }

    #[tokio::test]
    async fn bad_json_never_claims_the_gate() {
        let writer = StreamWriter::new().unwrap();
        let err = writer
            .add_json_rows(&serde_json::json!("not rows"))
            .await
            .unwrap_err();
        assert!(matches!(err, XlsxStreamError::InvalidInput(_)));
        assert_eq!(writer.add_json_rows(&serde_json::json!([["a", 1]])).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn source_error_releases_the_gate() {
        let writer = StreamWriter::new().unwrap();
        let failing = futures::stream::iter(vec![
            Ok(vec![CellValue::text("ok")]),
            Err("producer broke"),
        ]);
        let err = writer
            .add_rows(RowSource::try_stream(failing))
            .await
            .unwrap_err();
        assert!(matches!(err, XlsxStreamError::Source(_)));

        // Row from before the failure stays; the gate is free again.
        assert_eq!(writer.row_count().await, 1);
        assert_eq!(writer.add_rows([["next"]]).await.unwrap(), 1);
        assert_eq!(writer.row_count().await, 2);
    }
}
