//! Line/column lookup for byte offsets.

/// Maps byte offsets in a source text to 0-based line/column pairs.
///
/// Built once per input; lookups binary-search the line start table.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. Always contains at least `[0]`.
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i as u32 + 1),
                b'\r' => {
                    // \r\n counts as one terminator
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i as u32 + 1);
                }
                _ => {}
            }
            i += 1;
        }
        Self { line_starts }
    }

    /// 0-based (line, column) of a byte offset. Columns are byte columns.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line as u32, offset - self.line_starts[line])
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let map = LineMap::new("var x = 1;");
        assert_eq!(map.position(0), (0, 0));
        assert_eq!(map.position(4), (0, 4));
        assert_eq!(map.line_count(), 1);
    }

    #[test]
    fn multiple_lines() {
        let map = LineMap::new("a();\nb();\n  c();");
        assert_eq!(map.position(0), (0, 0));
        assert_eq!(map.position(5), (1, 0));
        assert_eq!(map.position(12), (2, 2));
    }

    #[test]
    fn crlf_terminators() {
        let map = LineMap::new("a();\r\nb();");
        assert_eq!(map.position(6), (1, 0));
        assert_eq!(map.line_count(), 2);
    }
}
