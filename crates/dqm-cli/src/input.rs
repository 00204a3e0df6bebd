//! JSON-lines event streams.
//!
//! One record per line; blank lines and lines starting with `#` are
//! skipped.
//!
//! ```text
//! {"kind":"run","run":362000,"hltMenus":{"TriggerResults::HLT":["HLT_IsoMu24_v4"]}}
//! {"kind":"event","run":362000,"lumi":12,"event":1,"muons":{"muons":[...]}}
//! ```

use std::io::BufRead;

use anyhow::{Context, Result};
use dqm_core::{Event, RunContext};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// Starts a run; closes the previous one.
    Run(RunContext),
    Event(Box<Event>),
}

/// Iterator over the records of a stream, with 1-based line numbers.
pub struct Records<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> Records<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0, buf: String::new() }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<(usize, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line += 1;
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e).context(format!("reading line {}", self.line))),
            }
            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let line = self.line;
            return Some(
                serde_json::from_str(text)
                    .map(|r| (line, r))
                    .with_context(|| format!("line {line}: invalid record")),
            );
        }
    }
}
