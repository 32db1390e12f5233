/// Line-oriented text buffer with indentation.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
    unit: &'static str,
}

impl CodeWriter {
    pub fn new(unit: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            unit,
        }
    }

    /// Tab indentation.
    pub fn go() -> Self {
        Self::new("\t")
    }

    /// Two-space indentation.
    pub fn typescript() -> Self {
        Self::new("  ")
    }

    /// Write one line at the current depth. Embedded newlines are split and
    /// each line indented.
    pub fn line(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().split('\n') {
            if !self.buf.is_empty() {
                self.buf.push('\n');
            }
            if !line.is_empty() {
                for _ in 0..self.depth {
                    self.buf.push_str(self.unit);
                }
                self.buf.push_str(line);
            }
        }
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_nested_lines() {
        let mut w = CodeWriter::go();
        w.line("if ok {");
        w.indent();
        w.line("a()\nb()");
        w.dedent();
        w.line("}");
        assert_eq!(w.finish(), "if ok {\n\ta()\n\tb()\n}");
    }

    #[test]
    fn empty_lines_carry_no_indentation() {
        let mut w = CodeWriter::typescript();
        w.indent();
        w.line("a;\n\nb;");
        assert_eq!(w.finish(), "  a;\n\n  b;");
    }
}
