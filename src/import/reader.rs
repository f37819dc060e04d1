//! Streaming CSV record reader.
//!
//! Unlike `csv::Reader`, a blank line is returned as a record with no cells
//! instead of being skipped, so every input line produces a row.

use std::io::BufRead;

use csv_core::{ReadRecordResult, Reader, ReaderBuilder};

use super::dialect::Dialect;
use crate::error::ImportError;

/// Cells of one record, in file order. Empty for a blank line.
pub type Record = Vec<String>;

/// Reads records one at a time from a buffered source.
pub struct RecordReader<R> {
    input: R,
    parser: Reader,
    skip_initial_space: bool,
    /// Last byte consumed, to recognise the `\n` of a split CRLF.
    last: Option<u8>,
    fields: Vec<u8>,
    ends: Vec<usize>,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R, dialect: Dialect) -> Self {
        let parser = ReaderBuilder::new()
            .delimiter(dialect.delimiter)
            .quote(dialect.quote)
            .build();

        Self {
            input,
            parser,
            skip_initial_space: dialect.skip_initial_space,
            last: None,
            fields: vec![0; 1024],
            ends: vec![0; 32],
            done: false,
        }
    }

    /// Read the next record, or `None` at end of input.
    pub fn read_record(&mut self) -> Result<Option<Record>, ImportError> {
        if self.done {
            return Ok(None);
        }
        if self.take_blank_line()? {
            return Ok(Some(Record::new()));
        }

        let (mut nout, mut nend) = (0, 0);
        loop {
            let input = self.input.fill_buf()?;
            let (result, nin, out, end) =
                self.parser
                    .read_record(input, &mut self.fields[nout..], &mut self.ends[nend..]);
            if let Some(&byte) = input[..nin].last() {
                self.last = Some(byte);
            }
            self.input.consume(nin);
            nout += out;
            nend += end;

            match result {
                ReadRecordResult::InputEmpty => {}
                ReadRecordResult::OutputFull => {
                    let len = self.fields.len();
                    self.fields.resize(len * 2, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = self.ends.len();
                    self.ends.resize(len * 2, 0);
                }
                ReadRecordResult::Record => return self.cells(nend).map(Some),
                ReadRecordResult::End => {
                    self.done = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Consume one blank line at a record boundary, if the input starts
    /// with one.
    fn take_blank_line(&mut self) -> Result<bool, ImportError> {
        loop {
            let next = self.input.fill_buf()?.first().copied();
            match next {
                // Tail of the CRLF that ended the previous line.
                Some(b'\n') if self.last == Some(b'\r') => self.consume(b'\n'),
                Some(byte @ (b'\n' | b'\r')) => {
                    self.consume(byte);
                    return Ok(true);
                }
                _ => return Ok(false),
            }
        }
    }

    fn consume(&mut self, byte: u8) {
        self.input.consume(1);
        self.last = Some(byte);
    }

    fn cells(&self, nend: usize) -> Result<Record, ImportError> {
        let mut start = 0;
        let mut cells = Record::with_capacity(nend);
        for &end in &self.ends[..nend] {
            let cell = std::str::from_utf8(&self.fields[start..end]).map_err(|_| {
                ImportError::NotUtf8 {
                    line: self.parser.line(),
                }
            })?;
            let cell = if self.skip_initial_space {
                cell.trim_start_matches(' ')
            } else {
                cell
            };
            cells.push(cell.to_string());
            start = end;
        }
        Ok(cells)
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}
