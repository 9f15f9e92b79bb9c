use std::path::PathBuf;

use tracing::debug;
use zip::CompressionMethod;

use crate::{
    Result,
    workbook::{
        StreamWriter,
        archive::ArchiveOptions,
        policy::{AlternatingRows, StylePolicy},
        style::{CompiledStyles, StyleRequest, StyleSet},
    },
};

pub struct StreamWriterBuilder {
    spool_dir: Option<PathBuf>,
    styles: StyleSet,
    extra_styles: Vec<StyleRequest>,
    inline_strings: bool,
    policy: Option<Box<dyn StylePolicy>>,
    archive: ArchiveOptions,
}

impl Default for StreamWriterBuilder {
    fn default() -> Self {
        StreamWriterBuilder::new()
    }
}

impl StreamWriterBuilder {
    pub fn new() -> Self {
        Self {
            spool_dir: None,
            styles: StyleSet::default(),
            extra_styles: vec![],
            inline_strings: false,
            policy: None,
            archive: ArchiveOptions::default(),
        }
    }

    /// Directory for the spooled sheet and shared strings; created if missing.
    pub fn spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    pub fn styles(mut self, styles: StyleSet) -> Self {
        self.styles = styles;
        self
    }

    /// Styles registered after the style set, for use by a custom policy.
    pub fn extra_styles(mut self, styles: Vec<StyleRequest>) -> Self {
        self.extra_styles = styles;
        self
    }

    /// Write strings inline instead of through the shared-string table.
    pub fn inline_strings(mut self, inline: bool) -> Self {
        self.inline_strings = inline;
        self
    }

    pub fn style_policy(mut self, policy: impl StylePolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    pub fn compression(mut self, method: CompressionMethod, level: Option<i64>) -> Self {
        self.archive = ArchiveOptions { method, level };
        self
    }

    pub fn build(self) -> Result<StreamWriter> {
        if let Some(dir) = &self.spool_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut requests = self.styles.requests().to_vec();
        requests.extend(self.extra_styles);
        let compiled = CompiledStyles::compile(&requests);

        let policy = self
            .policy
            .unwrap_or_else(|| Box::new(AlternatingRows::from_indices(&compiled.indices)));

        debug!(
            styles = compiled.indices.len(),
            inline_strings = self.inline_strings,
            spool_dir = ?self.spool_dir,
            "stream writer created"
        );

        StreamWriter::from_parts(
            compiled,
            policy,
            self.inline_strings,
            self.spool_dir,
            self.archive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::CellValue;

    #[test]
    fn default_set_gets_indices_two_to_four() {
        let writer = StreamWriterBuilder::new().build().unwrap();
        assert_eq!(writer.style_indices(), &[2, 3, 4]);
    }

    #[test]
    fn extra_styles_follow_the_set() {
        let writer = StreamWriterBuilder::new()
            .extra_styles(vec![StyleRequest::new().fill("FF0000")])
            .style_policy(|v: &CellValue, _: u32, _: u32| if v.is_empty() { 5u32 } else { 0 })
            .build()
            .unwrap();
        assert_eq!(writer.style_indices(), &[2, 3, 4, 5]);
        assert!(writer.styles_xml().contains("FFFF0000"));
    }

    #[test]
    fn spool_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("spool");
        let _writer = StreamWriterBuilder::new().spool_dir(&dir).build().unwrap();
        // sheet body and shared-string entries
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 2);
    }
}
