use std::{
    collections::HashMap,
    io::{self, BufWriter, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    Result,
    workbook::{new_spool, xml_escape},
};

const SST_FOOTER: &str = "</sst>";

/// Deduplicating shared-string table that spools new entries as they appear.
///
/// Only `<si>` entries go to the spool; the `<sst>` header needs the final
/// counts and is written by [`SharedStringTable::finalize`].
pub struct SharedStringTable {
    strings: Vec<Arc<str>>,
    index: HashMap<Arc<str>, u32>,
    references: u64,
    spool: BufWriter<NamedTempFile>,
}

impl SharedStringTable {
    pub fn new(dir: Option<&Path>) -> Result<Self> {
        Ok(SharedStringTable {
            strings: Vec::new(),
            index: HashMap::new(),
            references: 0,
            spool: BufWriter::new(new_spool(dir, "sharedStrings")?),
        })
    }

    /// Returns the index of `value`, appending it to the table on first sight.
    pub fn intern(&mut self, value: &str) -> Result<u32> {
        self.references += 1;
        if let Some(&i) = self.index.get(value) {
            return Ok(i);
        }

        write_entry(&mut self.spool, value)?;

        let i = self.strings.len() as u32;
        let key: Arc<str> = Arc::from(value);
        self.index.insert(Arc::clone(&key), i);
        self.strings.push(key);
        Ok(i)
    }

    #[cfg(test)]
    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(|s| &**s)
    }

    pub fn unique_count(&self) -> u32 {
        self.strings.len() as u32
    }

    /// Total string cells that referenced the table.
    pub fn reference_count(&self) -> u64 {
        self.references
    }

    /// Wraps the spooled entries into a complete `sharedStrings.xml`, rewound for reading.
    pub fn finalize(self, dir: Option<&Path>) -> Result<NamedTempFile> {
        let mut entries = self.spool.into_inner().map_err(io::IntoInnerError::into_error)?;
        entries.as_file_mut().seek(SeekFrom::Start(0))?;

        let mut out = BufWriter::new(new_spool(dir, "sharedStrings.final")?);
        write!(
            out,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            ),
            self.references,
            self.strings.len()
        )?;
        io::copy(entries.as_file_mut(), &mut out)?;
        out.write_all(SST_FOOTER.as_bytes())?;

        let mut file = out.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.as_file_mut().seek(SeekFrom::Start(0))?;

        debug!(
            unique = self.strings.len(),
            references = self.references,
            "shared strings finalized"
        );
        Ok(file)
    }
}

fn write_entry<W: Write>(w: &mut W, value: &str) -> io::Result<()> {
    let escaped = xml_escape(value);
    if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
        write!(w, "<si><t xml:space=\"preserve\">{escaped}</t></si>")
    } else {
        write!(w, "<si><t>{escaped}</t></si>")
    }
}
