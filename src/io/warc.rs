//! Minimal WARC reader: plain or gzip-per-record files into [`WarcRecord`]s.
//!
//! Offsets and lengths refer to the bytes as stored on disk. For `.warc.gz`
//! they are the gzip member boundaries, which is what a CDXJ reader needs to
//! seek to a record without inflating the whole file.

use std::io::Read;

use flate2::bufread::GzDecoder;

use crate::error::{Result, WaczError};
use crate::types::{HeaderMap, HttpHead, RecordType, WarcRecord};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Iterator over the records of one in-memory WARC file.
///
/// Yields `Err` for a record it cannot parse and then resumes at the next
/// record boundary it can find, so one damaged record does not hide the rest.
pub struct WarcReader<'a> {
    data: &'a [u8],
    pos: usize,
    gzipped: bool,
    pending: std::vec::IntoIter<WarcRecord>,
    finished: bool,
}

impl<'a> WarcReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            gzipped: data.starts_with(&GZIP_MAGIC),
            pending: Vec::new().into_iter(),
            finished: false,
        }
    }

    #[must_use]
    pub fn is_gzipped(&self) -> bool {
        self.gzipped
    }

    fn next_gzip_member(&mut self) -> Option<Result<Vec<WarcRecord>>> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        let remaining = &self.data[start..];
        let mut decoder = GzDecoder::new(remaining);
        let mut inflated = Vec::new();
        if let Err(err) = decoder.read_to_end(&mut inflated) {
            // Member boundaries are lost once inflation fails.
            self.finished = true;
            return Some(Err(WaczError::MalformedRecord {
                offset: start as u64,
                reason: format!("gzip member: {err}").into(),
            }));
        }
        let rest = decoder.into_inner();
        let consumed = remaining.len() - rest.len();
        self.pos = start + consumed;

        let mut records = Vec::new();
        let mut inner = 0;
        while inner < inflated.len() {
            if inflated[inner..].iter().all(u8::is_ascii_whitespace) {
                break;
            }
            match parse_record(&inflated, inner) {
                Ok((mut record, next)) => {
                    record.offset = start as u64;
                    record.length = consumed as u64;
                    records.push(record);
                    inner = next;
                }
                Err(err) => {
                    let offset = start as u64;
                    return Some(Err(relocate(err, offset)));
                }
            }
        }
        Some(Ok(records))
    }

    fn next_plain_record(&mut self) -> Option<Result<WarcRecord>> {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        match parse_record(self.data, start) {
            Ok((mut record, next)) => {
                record.offset = start as u64;
                record.length = (next - start) as u64;
                self.pos = next;
                Some(Ok(record))
            }
            Err(err) => {
                match find_next_record(self.data, start + 1) {
                    Some(next) => self.pos = next,
                    None => self.finished = true,
                }
                Some(Err(err))
            }
        }
    }
}

impl Iterator for WarcReader<'_> {
    type Item = Result<WarcRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.next() {
            return Some(Ok(record));
        }
        if self.finished {
            return None;
        }
        if !self.gzipped {
            return self.next_plain_record();
        }
        loop {
            match self.next_gzip_member()? {
                Ok(records) => {
                    self.pending = records.into_iter();
                    if let Some(record) = self.pending.next() {
                        return Some(Ok(record));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn relocate(err: WaczError, offset: u64) -> WaczError {
    match err {
        WaczError::MalformedRecord { reason, .. } => WaczError::MalformedRecord { offset, reason },
        other => other,
    }
}

fn malformed(offset: usize, reason: impl Into<std::borrow::Cow<'static, str>>) -> WaczError {
    WaczError::MalformedRecord {
        offset: offset as u64,
        reason: reason.into(),
    }
}

/// Read one line ending in `\n` (a preceding `\r` is stripped).
fn read_line(data: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let rel = data.get(pos..)?.iter().position(|&b| b == b'\n')?;
    let mut line = &data[pos..pos + rel];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    Some((line, pos + rel + 1))
}

/// Parse `Name: value` lines until a blank line; returns the map and the position after it.
fn parse_header_block(data: &[u8], mut pos: usize, origin: usize) -> Result<(HeaderMap, usize)> {
    let mut headers = HeaderMap::new();
    loop {
        let (line, next) =
            read_line(data, pos).ok_or_else(|| malformed(origin, "unterminated header block"))?;
        pos = next;
        if line.is_empty() {
            return Ok((headers, pos));
        }
        let text = String::from_utf8_lossy(line);
        match text.split_once(':') {
            Some((name, value)) => headers.push(name.trim(), value.trim()),
            None if text.starts_with([' ', '\t']) => {
                // Folded continuation lines are rare; keep them out of the map.
            }
            None => return Err(malformed(origin, format!("invalid header line '{text}'"))),
        }
    }
}

/// Parse the record starting at `start`; returns it with the offset just past its trailer.
pub(crate) fn parse_record(data: &[u8], start: usize) -> Result<(WarcRecord, usize)> {
    let (version, pos) = read_line(data, start).ok_or_else(|| malformed(start, "empty record"))?;
    if !version.starts_with(b"WARC/") {
        return Err(malformed(start, "missing WARC version line"));
    }
    let (headers, body_start) = parse_header_block(data, pos, start)?;

    let content_length: usize = headers
        .get("Content-Length")
        .ok_or_else(|| malformed(start, "missing Content-Length"))?
        .parse()
        .map_err(|_| malformed(start, "invalid Content-Length"))?;
    let body_end = body_start
        .checked_add(content_length)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| malformed(start, "truncated content block"))?;
    let block = data[body_start..body_end].to_vec();

    let mut next = body_end;
    let mut newlines = 0;
    while newlines < 2 && next < data.len() {
        match data[next] {
            b'\r' => next += 1,
            b'\n' => {
                next += 1;
                newlines += 1;
            }
            _ => break,
        }
    }

    let record_type = RecordType::parse(headers.get("WARC-Type").unwrap_or_default());
    let (http, payload_start) = parse_http_head(&record_type, &headers, &block);

    Ok((
        WarcRecord {
            record_type,
            headers,
            http,
            block,
            payload_start,
            offset: 0,
            length: 0,
        },
        next,
    ))
}

fn parse_http_head(
    record_type: &RecordType,
    headers: &HeaderMap,
    block: &[u8],
) -> (Option<HttpHead>, usize) {
    let is_http = headers
        .get("Content-Type")
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/http"));
    let eligible = matches!(
        record_type,
        RecordType::Response | RecordType::Request | RecordType::Revisit
    );
    if !is_http || !eligible {
        return (None, 0);
    }
    let Some((start_line, pos)) = read_line(block, 0) else {
        return (None, 0);
    };
    match parse_header_block(block, pos, 0) {
        Ok((http_headers, payload_start)) => (
            Some(HttpHead {
                start_line: String::from_utf8_lossy(start_line).into_owned(),
                headers: http_headers,
            }),
            payload_start,
        ),
        // Revisit records may end right after the head without a blank line.
        Err(_) => (None, 0),
    }
}

fn find_next_record(data: &[u8], from: usize) -> Option<usize> {
    let needle = b"\nWARC/";
    data.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|rel| from + rel + 1)
}
