use std::{
    fmt::Write as _,
    io::{self, BufWriter, Seek, SeekFrom, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::{
    Result,
    error::XlsxStreamError,
    workbook::{
        MAX_COLUMNS, MAX_ROWS, cell::CellValue, make_cell_ref, new_spool, policy::StylePolicy,
        strings::SharedStringTable, xml_escape,
    },
};

const SHEET_HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#,
    r#"<sheetFormatPr defaultRowHeight="15"/>"#,
    r#"<sheetData>"#,
);

const SHEET_FOOTER: &str = concat!(
    r#"</sheetData>"#,
    r#"<pageMargins left="0.75" right="0.75" top="1" bottom="1" header="0.5" footer="0.5"/>"#,
    r#"</worksheet>"#,
);

/// Where string cells go.
pub(crate) enum StringMode<'a> {
    Inline,
    Shared(&'a mut SharedStringTable),
}

/// Turns rows into `<row>` fragments.
pub(crate) struct RowEncoder<'a> {
    pub(crate) policy: &'a dyn StylePolicy,
    pub(crate) strings: StringMode<'a>,
}

impl RowEncoder<'_> {
    pub(crate) fn encode_row(&mut self, cells: &[CellValue], row_index: u32) -> Result<String> {
        if row_index >= MAX_ROWS {
            return Err(XlsxStreamError::RowLimit(row_index + 1));
        }
        if cells.len() > MAX_COLUMNS as usize {
            return Err(XlsxStreamError::ColumnLimit(cells.len()));
        }

        let row = row_index + 1;
        let mut xml = String::with_capacity(32 + cells.len() * 32);
        write!(xml, "<row r=\"{row}\">")?;

        for (col_idx, cell) in cells.iter().enumerate() {
            let col = col_idx as u32;
            let cell_ref = make_cell_ref(row, col);
            let style_id = self.policy.style_id(cell, col, row_index);
            self.write_cell(&mut xml, &cell_ref, cell, style_id)?;
        }

        xml.push_str("</row>");
        Ok(xml)
    }

    fn write_cell(
        &mut self,
        xml: &mut String,
        cell_ref: &str,
        value: &CellValue,
        style_id: u32,
    ) -> Result<()> {
        let s = match style_id {
            0 => String::new(),
            n => format!(" s=\"{n}\""),
        };

        match value {
            CellValue::Empty => write!(
                xml,
                "<c r=\"{cell_ref}\"{s} t=\"inlineStr\"><is><t></t></is></c>"
            ),
            CellValue::Number(n) => write!(xml, "<c r=\"{cell_ref}\"{s}><v>{n}</v></c>"),
            CellValue::Text(text) => match &mut self.strings {
                StringMode::Inline => write!(
                    xml,
                    "<c r=\"{cell_ref}\"{s} t=\"inlineStr\"><is><t>{}</t></is></c>",
                    xml_escape(text)
                ),
                StringMode::Shared(table) => {
                    let idx = table.intern(text)?;
                    write!(xml, "<c r=\"{cell_ref}\"{s} t=\"s\"><v>{idx}</v></c>")
                }
            },
        }?;
        Ok(())
    }
}

/// Append-only spool holding the worksheet body.
pub(crate) struct SheetSpool {
    temp: BufWriter<NamedTempFile>,
}

impl SheetSpool {
    pub(crate) fn new(dir: Option<&Path>) -> Result<Self> {
        let mut temp = BufWriter::new(new_spool(dir, "sheet1")?);
        temp.write_all(SHEET_HEADER.as_bytes())?;
        Ok(SheetSpool { temp })
    }

    pub(crate) fn append(&mut self, fragment: &str) -> Result<()> {
        self.temp.write_all(fragment.as_bytes())?;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.temp.flush()?;
        Ok(())
    }

    /// Writes the footer and hands back the file rewound for reading.
    pub(crate) fn finish(mut self) -> Result<NamedTempFile> {
        self.temp.write_all(SHEET_FOOTER.as_bytes())?;
        let mut file = self
            .temp
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?;
        file.as_file_mut().seek(SeekFrom::Start(0))?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::policy::AlternatingRows;
    use pretty_assertions::assert_eq;
    use std::io::Read;

    #[test]
    fn inline_row_fragment() {
        let policy = AlternatingRows::default();
        let mut enc = RowEncoder {
            policy: &policy,
            strings: StringMode::Inline,
        };
        let xml = enc
            .encode_row(
                &[CellValue::text("a&b"), CellValue::num(42.0), CellValue::Empty],
                0,
            )
            .unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<row r="1">"#,
                r#"<c r="A1" s="4" t="inlineStr"><is><t>a&amp;b</t></is></c>"#,
                r#"<c r="B1" s="4"><v>42</v></c>"#,
                r#"<c r="C1" s="4" t="inlineStr"><is><t></t></is></c>"#,
                r#"</row>"#,
            )
        );
    }

    #[test]
    fn shared_strings_only_for_text() {
        let mut table = SharedStringTable::new(None).unwrap();
        let policy = |_: &CellValue, _: u32, _: u32| 0u32;
        let mut enc = RowEncoder {
            policy: &policy,
            strings: StringMode::Shared(&mut table),
        };
        let xml = enc
            .encode_row(
                &[
                    CellValue::text("x"),
                    CellValue::num(1.5),
                    CellValue::Empty,
                    CellValue::text("x"),
                ],
                4,
            )
            .unwrap();
        assert_eq!(
            xml,
            concat!(
                r#"<row r="5">"#,
                r#"<c r="A5" t="s"><v>0</v></c>"#,
                r#"<c r="B5"><v>1.5</v></c>"#,
                r#"<c r="C5" t="inlineStr"><is><t></t></is></c>"#,
                r#"<c r="D5" t="s"><v>0</v></c>"#,
                r#"</row>"#,
            )
        );
        assert_eq!(table.unique_count(), 1);
    }

    #[test]
    fn policy_sees_zero_based_position() {
        let policy = |_: &CellValue, col: u32, row: u32| col * 100 + row;
        let mut enc = RowEncoder {
            policy: &policy,
            strings: StringMode::Inline,
        };
        let xml = enc
            .encode_row(&[CellValue::num(0.0), CellValue::num(0.0)], 7)
            .unwrap();
        assert!(xml.contains(r#"<c r="A8" s="7">"#));
        assert!(xml.contains(r#"<c r="B8" s="107">"#));
    }

    #[test]
    fn row_and_column_limits() {
        let policy = AlternatingRows::default();
        let mut enc = RowEncoder {
            policy: &policy,
            strings: StringMode::Inline,
        };
        assert!(matches!(
            enc.encode_row(&[], MAX_ROWS),
            Err(XlsxStreamError::RowLimit(_))
        ));
        let wide = vec![CellValue::Empty; MAX_COLUMNS as usize + 1];
        assert!(matches!(
            enc.encode_row(&wide, 0),
            Err(XlsxStreamError::ColumnLimit(_))
        ));
    }

    #[test]
    fn spool_is_wrapped_in_header_and_footer() {
        let mut spool = SheetSpool::new(None).unwrap();
        spool.append("<row r=\"1\"></row>").unwrap();
        let mut file = spool.finish().unwrap();
        let mut xml = String::new();
        file.read_to_string(&mut xml).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<sheetData><row r=\"1\"></row></sheetData>"));
        assert!(xml.ends_with("</worksheet>"));
    }
}
