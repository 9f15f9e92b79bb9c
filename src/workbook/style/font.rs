use serde::{Deserialize, Serialize};

/// One of the two fonts every compiled style sheet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Font {
    /// 10pt Calibri, theme text color.
    #[default]
    Body,
    /// Bold 13pt Calibri, theme color 2.
    Heading,
}

impl Font {
    pub const ALL: [Font; 2] = [Font::Body, Font::Heading];

    pub fn id(self) -> u32 {
        match self {
            Font::Body => 0,
            Font::Heading => 1,
        }
    }

    pub fn to_xml(self) -> &'static str {
        match self {
            Font::Body => concat!(
                r#"<font><sz val="10"/><color theme="1"/><name val="Calibri"/>"#,
                r#"<family val="2"/><scheme val="minor"/></font>"#,
            ),
            Font::Heading => concat!(
                r#"<font><b/><sz val="13"/><color theme="2"/><name val="Calibri"/>"#,
                r#"<family val="2"/><scheme val="minor"/></font>"#,
            ),
        }
    }
}

impl TryFrom<u8> for Font {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Font::Body),
            1 => Ok(Font::Heading),
            n => Err(format!("unknown font index {n}, expected 0 or 1")),
        }
    }
}

impl From<Font> for u8 {
    fn from(f: Font) -> u8 {
        f.id() as u8
    }
}
