use miette::SourceSpan;

/// Position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub usize);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: usize,
}

impl Span {
    pub fn new(start: Idx, len: usize) -> Self {
        Span { start, len }
    }

    /// Span covering the whole of 1-based line `line` in `src`, excluding its newline.
    pub fn of_line(src: &str, line: usize) -> Option<Self> {
        let mut start = 0;
        for (i, text) in src.split('\n').enumerate() {
            if i + 1 == line {
                return Some(Span::new(Idx(start), text.trim_end_matches('\r').len()));
            }
            start += text.len() + 1;
        }
        None
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        let start = self.start.0;
        let end = start + self.len;
        start..end
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.start.0.into(), value.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spans() {
        let src = "CLS\n  RET\n\nJP $200\n";
        assert_eq!(Span::of_line(src, 1).unwrap().as_range(), 0..3);
        assert_eq!(Span::of_line(src, 2).unwrap().as_range(), 4..9);
        assert_eq!(Span::of_line(src, 3).unwrap().as_range(), 10..10);
        assert_eq!(Span::of_line(src, 4).unwrap().as_range(), 11..18);
        assert_eq!(Span::of_line(src, 9), None);
    }
}
