use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    Result,
    workbook::style::{
        border::Border,
        color::Color,
        fill::Fill,
        number::{GENERAL_FORMAT_ID, NumberFormats},
    },
};
pub mod border;
pub mod color;
pub mod fill;
pub mod font;
pub mod number;

pub use font::Font;

/// A requested cell style, drawn from the fixed vocabulary the compiler knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRequest {
    /// Solid fill color, `RRGGBB` or `AARRGGBB`.
    #[serde(default)]
    pub fill: Option<String>,
    /// Custom number format code, e.g. `0.00`.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub border: bool,
    #[serde(default)]
    pub font: Font,
}

impl StyleRequest {
    pub fn new() -> Self {
        StyleRequest::default()
    }

    pub fn fill(mut self, hex: &str) -> Self {
        self.fill = Some(hex.into());
        self
    }

    pub fn format(mut self, code: &str) -> Self {
        self.format = Some(code.into());
        self
    }

    pub fn border(mut self, on: bool) -> Self {
        self.border = on;
        self
    }

    pub fn font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }
}

// Config files written for the JS-era writer use `border: 1`.
fn bool_or_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(d)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// Header plus alternating body row styles.
///
/// Registered as `even_row`, `odd_row`, `header`; a missing entry reuses `even_row`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSet {
    #[serde(default)]
    pub header: Option<StyleRequest>,
    pub even_row: StyleRequest,
    #[serde(default)]
    pub odd_row: Option<StyleRequest>,
}

impl Default for StyleSet {
    fn default() -> Self {
        StyleSet {
            header: Some(
                StyleRequest::new()
                    .fill("005CB7")
                    .format("0.00")
                    .border(true)
                    .font(Font::Heading),
            ),
            even_row: StyleRequest::new().fill("FFFFFF").format("0.00").border(true),
            odd_row: Some(StyleRequest::new().fill("E4E4E6").format("0.00").border(true)),
        }
    }
}

impl StyleSet {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn requests(&self) -> [StyleRequest; 3] {
        let even = self.even_row.clone();
        let odd = self.odd_row.clone().unwrap_or_else(|| even.clone());
        let header = self.header.clone().unwrap_or_else(|| even.clone());
        [even, odd, header]
    }
}

/// Cell-format record: (numFmtId, fontId, fillId, borderId).
type Xf = (u32, u32, u32, u32);

pub struct StyleRegistry {
    fills: Vec<Fill>,
    fill_index: HashMap<Color, u32>,
    num_fmts: NumberFormats,
    xfs: Vec<Xf>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        StyleRegistry::new()
    }
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry {
            fills: vec![Fill::None, Fill::Gray125],
            fill_index: HashMap::new(),
            num_fmts: NumberFormats::default(),
            xfs: vec![
                (GENERAL_FORMAT_ID, Font::Body.id(), 0, Border::Thin.id()),
                (GENERAL_FORMAT_ID, Font::Body.id(), 1, Border::Thin.id()),
            ],
        }
    }

    /// Registers a request and returns its cell-format index. Never dedups the xf itself.
    pub fn register(&mut self, style: &StyleRequest) -> u32 {
        // Malformed colors and blank codes fall back to no fill / General.
        let fill_id = style
            .fill
            .as_deref()
            .and_then(Color::new)
            .map_or(0, |color| self.intern_fill(color));
        let fmt_id = style
            .format
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .map_or(GENERAL_FORMAT_ID, |code| self.num_fmts.intern(code));
        let border_id = Border::from(style.border).id();

        let i = self.xfs.len() as u32;
        self.xfs.push((fmt_id, style.font.id(), fill_id, border_id));
        i
    }

    fn intern_fill(&mut self, color: Color) -> u32 {
        if let Some(&i) = self.fill_index.get(&color) {
            return i;
        }
        let i = self.fills.len() as u32;
        self.fill_index.insert(color.clone(), i);
        self.fills.push(Fill::Solid(color));
        i
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        out.push_str(&self.num_fmts.to_xml());

        out.push_str(&format!("<fonts count=\"{}\">", Font::ALL.len()));
        for font in Font::ALL {
            out.push_str(font.to_xml());
        }
        out.push_str("</fonts>");

        out.push_str(&format!("<fills count=\"{}\">", self.fills.len()));
        for fill in &self.fills {
            out.push_str(&fill.to_xml());
        }
        out.push_str("</fills>");

        out.push_str(&format!("<borders count=\"{}\">", Border::ALL.len()));
        for border in Border::ALL {
            out.push_str(&border.to_xml());
        }
        out.push_str("</borders>");

        out.push_str("<cellStyleXfs count=\"1\">");
        out.push_str("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/>");
        out.push_str("</cellStyleXfs>");

        out.push_str(&format!("<cellXfs count=\"{}\">", self.xfs.len()));
        for (num_fmt_id, font_id, fill_id, border_id) in &self.xfs {
            out.push_str(&format!(
                "<xf numFmtId=\"{num_fmt_id}\" fontId=\"{font_id}\" fillId=\"{fill_id}\" borderId=\"{border_id}\" xfId=\"0\"><alignment horizontal=\"center\" vertical=\"center\"/></xf>"
            ));
        }
        out.push_str("</cellXfs>");

        out.push_str("<cellStyles count=\"1\">");
        out.push_str("<cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>");
        out.push_str("</cellStyles>");
        out.push_str("<dxfs count=\"0\"/>");
        out.push_str(
            "<tableStyles count=\"0\" defaultTableStyle=\"TableStyleMedium2\" defaultPivotStyle=\"PivotStyleLight16\"/>",
        );

        out.push_str("</styleSheet>");
        out
    }
}

/// A finished `styles.xml` and the cell-format index of each request, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyles {
    pub xml: String,
    pub indices: Vec<u32>,
}

impl CompiledStyles {
    pub fn compile(requests: &[StyleRequest]) -> Self {
        let mut reg = StyleRegistry::new();
        let indices = requests.iter().map(|s| reg.register(s)).collect();
        CompiledStyles {
            xml: reg.to_xml(),
            indices,
        }
    }
}
