//! Indentation tracking shared by both lexers.
//!
//! Each code line reports its leading whitespace width. The tracker keeps a
//! stack of open block widths and answers whether the line opens a block,
//! stays at the same level or closes one or more blocks.

/// Width of a tab character in columns.
pub const TAB_WIDTH: usize = 4;

/// Outcome of feeding one line's indentation into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentChange {
    Same,
    Indent,
    /// Number of blocks closed.
    Dedent(usize),
}

#[derive(Debug, Clone)]
pub struct IndentTracker {
    stack: Vec<usize>,
}

impl IndentTracker {
    pub fn new() -> Self {
        Self { stack: vec![0] }
    }

    /// Current block depth (0 at top level).
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Feed the indentation width of a code line.
    ///
    /// Fails when the line dedents to a width that matches no open block.
    pub fn update(&mut self, width: usize) -> Result<IndentChange, String> {
        let top = self.top();
        if width > top {
            self.stack.push(width);
            return Ok(IndentChange::Indent);
        }
        if width == top {
            return Ok(IndentChange::Same);
        }

        let mut closed = 0;
        while self.stack.len() > 1 && width < self.top() {
            self.stack.pop();
            closed += 1;
        }
        if width != self.top() {
            return Err(format!(
                "inconsistent indentation: width {} matches no enclosing block (expected {})",
                width,
                self.top()
            ));
        }
        Ok(IndentChange::Dedent(closed))
    }

    /// Close every open block, returning how many dedents that takes.
    pub fn close_all(&mut self) -> usize {
        let open = self.depth();
        self.stack.truncate(1);
        open
    }

    fn top(&self) -> usize {
        // The base level 0 is never popped.
        self.stack[self.stack.len() - 1]
    }
}

impl Default for IndentTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Measure leading whitespace starting at `pos`.
///
/// Returns `(width, chars_consumed)`.
pub fn measure(input: &[char], pos: usize) -> (usize, usize) {
    let mut width = 0;
    let mut p = pos;
    while p < input.len() {
        match input[p] {
            ' ' => width += 1,
            '\t' => width += TAB_WIDTH,
            _ => break,
        }
        p += 1;
    }
    (width, p - pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_and_dedent() {
        let mut t = IndentTracker::new();
        assert_eq!(t.update(0), Ok(IndentChange::Same));
        assert_eq!(t.update(4), Ok(IndentChange::Indent));
        assert_eq!(t.update(8), Ok(IndentChange::Indent));
        assert_eq!(t.depth(), 2);
        assert_eq!(t.update(0), Ok(IndentChange::Dedent(2)));
        assert_eq!(t.depth(), 0);
    }

    #[test]
    fn test_inconsistent_dedent() {
        let mut t = IndentTracker::new();
        t.update(4).unwrap();
        t.update(8).unwrap();
        let err = t.update(6).unwrap_err();
        assert!(err.contains("inconsistent indentation"));
    }

    #[test]
    fn test_close_all() {
        let mut t = IndentTracker::new();
        t.update(2).unwrap();
        t.update(6).unwrap();
        assert_eq!(t.close_all(), 2);
        assert_eq!(t.close_all(), 0);
    }

    #[test]
    fn test_measure_tabs() {
        let chars: Vec<char> = "\t  x".chars().collect();
        assert_eq!(measure(&chars, 0), (6, 3));
    }
}
