use std::io::{Cursor, Read, Write};

use tempfile::NamedTempFile;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::Result;

/// Compression applied to every archive entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveOptions {
    pub method: CompressionMethod,
    /// Ignored for `Stored`.
    pub level: Option<i64>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        ArchiveOptions {
            method: CompressionMethod::Deflated,
            level: Some(4),
        }
    }
}

impl ArchiveOptions {
    fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().compression_method(self.method);
        match self.method {
            CompressionMethod::Stored => options,
            _ => options.compression_level(self.level),
        }
    }
}

pub(crate) enum PartBody {
    Text(String),
    /// Rewound spool file, streamed into the entry.
    Spool(NamedTempFile),
}

pub(crate) struct Part {
    pub(crate) name: &'static str,
    pub(crate) body: PartBody,
}

impl Part {
    pub(crate) fn text(name: &'static str, xml: impl Into<String>) -> Self {
        Part {
            name,
            body: PartBody::Text(xml.into()),
        }
    }

    pub(crate) fn spool(name: &'static str, file: NamedTempFile) -> Self {
        Part {
            name,
            body: PartBody::Spool(file),
        }
    }
}

/// Compresses `parts`, in order, into an in-memory zip archive.
pub(crate) fn pack(parts: Vec<Part>, archive: ArchiveOptions) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = archive.file_options();

    for part in parts {
        zip.start_file(part.name, options)?;
        match part.body {
            PartBody::Text(xml) => zip.write_all(xml.as_bytes())?,
            PartBody::Spool(mut temp_file) => {
                let file = temp_file.as_file_mut();
                let mut buf = vec![0u8; 64 * 1024];
                loop {
                    let n = file.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    zip.write_all(&buf[..n])?;
                }
            }
        }
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom};
    use zip::ZipArchive;

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = String::new();
        entry.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn packs_text_and_spooled_parts() {
        let mut spool = NamedTempFile::new().unwrap();
        spool.write_all(b"<spooled/>").unwrap();
        spool.as_file_mut().seek(SeekFrom::Start(0)).unwrap();

        let bytes = pack(
            vec![Part::text("a.xml", "<a/>"), Part::spool("dir/b.xml", spool)],
            ArchiveOptions::default(),
        )
        .unwrap();

        assert_eq!(read_entry(&bytes, "a.xml"), "<a/>");
        assert_eq!(read_entry(&bytes, "dir/b.xml"), "<spooled/>");
    }

    #[test]
    fn stored_ignores_level() {
        let bytes = pack(
            vec![Part::text("a.xml", "<a/>")],
            ArchiveOptions {
                method: CompressionMethod::Stored,
                level: Some(9),
            },
        )
        .unwrap();
        let mut archive = ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        assert_eq!(
            archive.by_index(0).unwrap().compression(),
            CompressionMethod::Stored
        );
    }
}
