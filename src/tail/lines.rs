/// Splits `chunk` into lines in source order. Lines end at `\n`, with a
/// preceding `\r` dropped. A trailing fragment without a terminator is
/// returned as the last line.
pub fn split(chunk: &str) -> impl Iterator<Item = &str> {
    chunk.lines()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Non-blank lines of `chunk`, unterminated fragment included.
pub fn non_blank_lines(chunk: &str) -> impl Iterator<Item = &str> {
    split(chunk).filter(|line| !is_blank(line))
}

/// Longest unterminated fragment held between ticks.
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Turns a stream of chunks into complete lines.
///
/// Only terminated lines are released. An unterminated fragment at the end of
/// a chunk is held back and prefixed to the next chunk, so a line written in
/// two pieces across ticks comes out whole. A fragment that reaches the limit
/// without a terminator is released as a line of its own.
#[derive(Debug)]
pub struct LineBuffer {
    pending: String,
    limit: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: String::new(),
            limit,
        }
    }

    /// Appends `chunk` and returns every non-blank line it completed.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let mut lines = match self.pending.rfind('\n') {
            Some(end) => {
                let rest = self.pending.split_off(end + 1);
                let complete = std::mem::replace(&mut self.pending, rest);
                non_blank_lines(&complete).map(str::to_owned).collect()
            }
            None => Vec::new(),
        };

        if self.pending.len() >= self.limit {
            lines.extend(self.flush());
        }
        lines
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Drops the held fragment, e.g. after the file was truncated.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Releases the held fragment as a line if it is not blank.
    pub fn flush(&mut self) -> Option<String> {
        let fragment = std::mem::take(&mut self.pending);
        let line = fragment.strip_suffix('\r').unwrap_or(&fragment);
        (!is_blank(line)).then(|| line.to_owned())
    }
}
