//! Rendering groups as output lines.

use crate::accumulator::{Accumulator, GroupEntry};
use anyhow::{Context, Result};
use std::io::Write;

/// One resolved output column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectionToken {
    /// Literal text copied into every row.
    Register(String),
    /// Key field at the given key dense position.
    Key(usize),
    /// Sum field at the given sum dense position.
    Sum(usize),
}

/// Renders [`GroupEntry`] values according to a projection.
pub struct ProjectionEmitter<'a> {
    tokens: &'a [ProjectionToken],
    separator: &'a [u8],
    no_value: i64,
}

impl<'a> ProjectionEmitter<'a> {
    pub fn new(tokens: &'a [ProjectionToken], separator: &'a str, no_value: i64) -> Self {
        Self {
            tokens,
            separator: separator.as_bytes(),
            no_value,
        }
    }

    /// Append one rendered line (with its trailing newline) to `out`.
    pub fn render_into(&self, group: &GroupEntry, out: &mut Vec<u8>) {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(self.separator);
            }
            match token {
                ProjectionToken::Register(text) => out.extend_from_slice(text.as_bytes()),
                ProjectionToken::Key(pos) => out.extend_from_slice(group.key(*pos)),
                ProjectionToken::Sum(pos) => {
                    let value = group.sum(*pos).get().unwrap_or(self.no_value);
                    out.extend_from_slice(value.to_string().as_bytes());
                }
            }
        }
        out.push(b'\n');
    }

    pub fn render(&self, group: &GroupEntry) -> Vec<u8> {
        let mut out = Vec::new();
        self.render_into(group, &mut out);
        out
    }

    /// Write an optional header followed by one line per group.
    ///
    /// Groups come out in the accumulator's iteration order unless `sort`
    /// is set, in which case rendered lines are sorted bytewise first.
    ///
    /// # Returns
    /// The number of group lines written (the header is not counted).
    ///
    /// # Errors
    /// Returns an error if writing to `w` fails.
    pub fn emit<W: Write>(
        &self,
        acc: &Accumulator,
        header: Option<&str>,
        sort: bool,
        mut w: W,
    ) -> Result<usize> {
        if let Some(header) = header {
            w.write_all(header.as_bytes())
                .and_then(|()| w.write_all(b"\n"))
                .context("write output header")?;
        }

        let mut written = 0usize;
        if sort {
            let mut lines: Vec<Vec<u8>> = acc.iter().map(|g| self.render(g)).collect();
            lines.sort_unstable();
            for line in &lines {
                w.write_all(line).context("write output row")?;
            }
            written = lines.len();
        } else {
            let mut line = Vec::with_capacity(64);
            for group in acc.iter() {
                line.clear();
                self.render_into(group, &mut line);
                w.write_all(&line).context("write output row")?;
                written += 1;
            }
        }
        w.flush().context("flush output")?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyIdentity, ParsePolicy};

    fn scenario() -> Accumulator {
        let mut acc = Accumulator::new(&[0], &[2], -1, ParsePolicy::Strict, KeyIdentity::Verified);
        let mut warnings = Vec::new();
        for (fp, line) in [(1, "A,1,10"), (1, "A,1,20"), (2, "B,2,-1")] {
            let fields: Vec<&[u8]> = line.split(',').map(str::as_bytes).collect();
            acc.merge(fp, &fields, &mut warnings);
        }
        acc
    }

    #[test]
    fn register_and_key_tokens() {
        let acc = scenario();
        let tokens = vec![ProjectionToken::Register("2024".into()), ProjectionToken::Key(0)];
        let emitter = ProjectionEmitter::new(&tokens, ",", -1);
        let a = acc.find(&[b"A".as_slice()]).unwrap();
        assert_eq!(emitter.render(a), b"2024,A\n");
    }

    #[test]
    fn invalid_sum_renders_sentinel() {
        let acc = scenario();
        let tokens = vec![ProjectionToken::Key(0), ProjectionToken::Sum(0)];
        let emitter = ProjectionEmitter::new(&tokens, "|", -1);
        let b = acc.find(&[b"B".as_slice()]).unwrap();
        assert_eq!(emitter.render(b), b"B|-1\n");
    }

    #[test]
    fn emit_writes_header_then_sorted_rows() -> Result<()> {
        let acc = scenario();
        let tokens = vec![ProjectionToken::Key(0), ProjectionToken::Sum(0)];
        let emitter = ProjectionEmitter::new(&tokens, ",", -1);
        let mut out = Vec::new();
        let n = emitter.emit(&acc, Some("H1,H2"), true, &mut out)?;
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out)?, "H1,H2\nA,30\nB,-1\n");
        Ok(())
    }
}
