// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Item streams feeding the heavy hitter engines.
//!
//! A trace is an optional block of `#` prefixed header lines followed by little-endian 4-byte
//! item ids. Header lines are either `#key: value` parameters or, after a `#===` marker line,
//! `#<item>: <frequency>` ground truth annotations.
//!
//! # Usage
//!
//! ```rust
//! # use std::io::Cursor;
//! # use heavyhitters::stream::ItemSource;
//! # use heavyhitters::stream::TraceReader;
//! let mut bytes = b"#Universe: 1024\n".to_vec();
//! bytes.extend_from_slice(&7u32.to_le_bytes());
//! let mut reader = TraceReader::new(Cursor::new(bytes)).unwrap();
//! assert_eq!(reader.parameter("Universe"), Some("1024"));
//! assert_eq!(reader.next_item().unwrap(), Some(7));
//! assert_eq!(reader.next_item().unwrap(), None);
//! ```

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::Error;

const ITEM_SIZE: usize = size_of::<u32>();

/// A pull based stream of item ids.
pub trait ItemSource {
    /// Returns the next item, or `None` at the end of the stream.
    fn next_item(&mut self) -> Result<Option<u32>, Error>;
}

/// Reads a binary trace.
///
/// A `#` only opens a header line when the bytes up to the next newline are text, so a first
/// item whose low byte is `0x23` is still read as an item. An item that happens to spell out a
/// whole text line, such as `#ab:` followed by `\n\0\0\0`, remains ambiguous.
#[derive(Debug)]
pub struct TraceReader<R> {
    reader: R,
    parameters: Vec<(String, String)>,
    ground_truth: Vec<(u32, f64)>,
    items_read: u64,
}

impl TraceReader<BufReader<File>> {
    /// Opens the trace stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref()).map_err(|err| Error::io("opening trace", err))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Parses the header of `reader` and positions it on the first item.
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let mut parameters = vec![];
        let mut ground_truth = vec![];
        let mut in_weights = false;
        let mut line = vec![];

        loop {
            let buf = reader
                .fill_buf()
                .map_err(|err| Error::io("reading trace header", err))?;
            if !is_header_line(buf) {
                break;
            }
            line.clear();
            reader
                .read_until(b'\n', &mut line)
                .map_err(|err| Error::io("reading trace header", err))?;
            let text = std::str::from_utf8(&line[1..])
                .map_err(|_| Error::invalid_data("trace header is not valid UTF-8"))?
                .trim_end_matches(['\n', '\r']);

            if text.starts_with('=') {
                in_weights = true;
                continue;
            }
            let Some((key, value)) = text.split_once(':') else {
                return Err(Error::invalid_data("malformed trace header line")
                    .with_context("line", text));
            };
            let (key, value) = (key.trim(), value.trim());
            match key.parse::<u32>() {
                Ok(item) if in_weights => {
                    let frequency = value.parse::<f64>().map_err(|_| {
                        Error::invalid_data("malformed ground truth frequency")
                            .with_context("item", item)
                            .with_context("frequency", value)
                    })?;
                    ground_truth.push((item, frequency));
                }
                _ => parameters.push((key.to_string(), value.to_string())),
            }
        }

        // The annotation block is closed by an empty line.
        if in_weights {
            let buf = reader
                .fill_buf()
                .map_err(|err| Error::io("reading trace header", err))?;
            if buf.first() == Some(&b'\n') {
                reader.consume(1);
            }
        }

        debug!(
            parameters = parameters.len(),
            ground_truth = ground_truth.len(),
            "opened trace"
        );
        Ok(TraceReader {
            reader,
            parameters,
            ground_truth,
            items_read: 0,
        })
    }

    /// Header parameters in file order.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Value of the header parameter `key`.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Annotated `(item, frequency)` pairs, frequencies as fractions of the stream.
    pub fn ground_truth(&self) -> &[(u32, f64)] {
        &self.ground_truth
    }

    /// Number of items returned so far.
    pub fn items_read(&self) -> u64 {
        self.items_read
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

// `#` followed by printable text up to `\n` or the end of the buffered bytes.
fn is_header_line(buf: &[u8]) -> bool {
    let Some((&b'#', rest)) = buf.split_first() else {
        return false;
    };
    let line = match rest.iter().position(|&b| b == b'\n') {
        Some(end) => &rest[..end],
        None => rest,
    };
    line.iter()
        .all(|&b| b == b'\t' || b == b'\r' || !b.is_ascii_control())
}

impl<R: BufRead> ItemSource for TraceReader<R> {
    fn next_item(&mut self) -> Result<Option<u32>, Error> {
        let mut buf = [0u8; ITEM_SIZE];
        let mut filled = 0;
        while filled < ITEM_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::io("reading trace item", err)),
            }
        }
        match filled {
            0 => Ok(None),
            ITEM_SIZE => {
                self.items_read += 1;
                Ok(Some(u32::from_le_bytes(buf)))
            }
            n => Err(Error::invalid_data("trailing partial item")
                .with_context("bytes", n)
                .with_context("offset", self.items_read)),
        }
    }
}

impl<S: ItemSource + ?Sized> ItemSource for &mut S {
    fn next_item(&mut self) -> Result<Option<u32>, Error> {
        (**self).next_item()
    }
}
