use crate::workbook::cell::CellValue;

/// Decides the cell-format index of a cell from its value and position.
///
/// `column` and `row` are zero-based.
pub trait StylePolicy: Send + Sync {
    fn style_id(&self, value: &CellValue, column: u32, row: u32) -> u32;
}

impl<F> StylePolicy for F
where
    F: Fn(&CellValue, u32, u32) -> u32 + Send + Sync,
{
    fn style_id(&self, value: &CellValue, column: u32, row: u32) -> u32 {
        self(value, column, row)
    }
}

/// Row 0 gets the header style; body rows alternate starting with `even`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlternatingRows {
    pub header: u32,
    pub even: u32,
    pub odd: u32,
}

impl AlternatingRows {
    /// Takes indices in style-set registration order (even, odd, header).
    pub fn from_indices(indices: &[u32]) -> Self {
        match indices {
            [even, odd, header, ..] => AlternatingRows {
                header: *header,
                even: *even,
                odd: *odd,
            },
            _ => AlternatingRows::default(),
        }
    }
}

impl Default for AlternatingRows {
    fn default() -> Self {
        AlternatingRows {
            header: 4,
            even: 2,
            odd: 3,
        }
    }
}

impl StylePolicy for AlternatingRows {
    fn style_id(&self, _value: &CellValue, _column: u32, row: u32) -> u32 {
        match row {
            0 => self.header,
            r if r % 2 == 1 => self.even,
            _ => self.odd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_then_alternating() {
        let p = AlternatingRows::default();
        let v = CellValue::Empty;
        assert_eq!(p.style_id(&v, 0, 0), 4);
        assert_eq!(p.style_id(&v, 3, 1), 2);
        assert_eq!(p.style_id(&v, 0, 2), 3);
        assert_eq!(p.style_id(&v, 0, 3), 2);
    }

    #[test]
    fn closures_are_policies() {
        let p = |v: &CellValue, col: u32, _row: u32| if v.is_empty() { 0 } else { col + 10 };
        assert_eq!(p.style_id(&CellValue::num(1.0), 2, 7), 12);
        assert_eq!(p.style_id(&CellValue::Empty, 2, 7), 0);
    }
}
