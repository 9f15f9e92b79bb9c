#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Border {
    None,
    Thin,
}

impl Border {
    pub const ALL: [Border; 2] = [Border::None, Border::Thin];

    pub fn id(self) -> u32 {
        match self {
            Border::None => 0,
            Border::Thin => 1,
        }
    }

    fn side_xml(tag: &str) -> String {
        format!("<{tag} style=\"thin\"><color auto=\"1\"/></{tag}>")
    }

    pub fn to_xml(self) -> String {
        match self {
            Border::None => "<border><left/><right/><top/><bottom/><diagonal/></border>".into(),
            Border::Thin => {
                let mut xml = String::from("<border>");
                for tag in ["left", "right", "top", "bottom"] {
                    xml.push_str(&Self::side_xml(tag));
                }
                xml.push_str("<diagonal/>");
                for tag in ["vertical", "horizontal"] {
                    xml.push_str(&Self::side_xml(tag));
                }
                xml.push_str("</border>");
                xml
            }
        }
    }
}

impl From<bool> for Border {
    fn from(on: bool) -> Self {
        if on { Border::Thin } else { Border::None }
    }
}
