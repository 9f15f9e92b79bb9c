use std::collections::HashMap;

use crate::workbook::xml_escape;

/// First id available to custom format codes; lower ids are Excel built-ins.
pub const CUSTOM_FORMAT_START: u32 = 166;

/// General.
pub const GENERAL_FORMAT_ID: u32 = 0;

#[derive(Debug, Default)]
pub(crate) struct NumberFormats {
    codes: Vec<(u32, String)>,
    index: HashMap<String, u32>,
}

impl NumberFormats {
    pub(crate) fn intern(&mut self, code: &str) -> u32 {
        if let Some(&id) = self.index.get(code) {
            return id;
        }
        let id = CUSTOM_FORMAT_START + self.codes.len() as u32;
        self.index.insert(code.to_string(), id);
        self.codes.push((id, code.to_string()));
        id
    }

    pub(crate) fn to_xml(&self) -> String {
        if self.codes.is_empty() {
            return String::new();
        }
        let mut xml = format!("<numFmts count=\"{}\">", self.codes.len());
        for (id, code) in &self.codes {
            xml.push_str(&format!(
                "<numFmt numFmtId=\"{id}\" formatCode=\"{}\"/>",
                xml_escape(code)
            ));
        }
        xml.push_str("</numFmts>");
        xml
    }
}
