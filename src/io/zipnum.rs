//! ZipNum packing: CDXJ lines in independently gzipped blocks plus a summary.
//!
//! `index.cdx.gz` is a concatenation of gzip members of up to
//! [`ZIPNUM_BLOCK_LINES`](crate::constants::ZIPNUM_BLOCK_LINES) lines each.
//! `index.idx` names the first key of every block with its byte range, so a
//! reader can binary-search the summary and inflate a single block.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::{Compression, GzBuilder};
use serde::Serialize;

use crate::constants::{INDEX_CDX_NAME, ZIPNUM_FORMAT};
use crate::error::Result;

/// Packed index bytes ready to be stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipNumIndex {
    pub cdx_gz: Vec<u8>,
    pub idx: Vec<u8>,
    pub blocks: usize,
}

#[derive(Serialize)]
struct MetaLine<'a> {
    format: &'a str,
    filename: &'a str,
}

#[derive(Serialize)]
struct BlockLine {
    offset: u64,
    length: u64,
}

/// Pack sorted CDXJ `lines` (no trailing newlines) into ZipNum blocks.
///
/// Output is byte-for-byte deterministic: gzip headers carry no mtime or name.
pub fn write_zipnum(lines: &[String], block_lines: usize) -> Result<ZipNumIndex> {
    let block_lines = block_lines.max(1);
    let mut cdx_gz = Vec::new();
    let mut idx = String::new();
    idx.push_str("!meta 0 ");
    idx.push_str(&serde_json::to_string(&MetaLine {
        format: ZIPNUM_FORMAT,
        filename: INDEX_CDX_NAME,
    })?);
    idx.push('\n');

    let mut blocks = 0;
    for chunk in lines.chunks(block_lines) {
        let offset = cdx_gz.len() as u64;
        let mut encoder = GzBuilder::new()
            .mtime(0)
            .write(Vec::new(), Compression::default());
        for line in chunk {
            encoder.write_all(line.as_bytes())?;
            encoder.write_all(b"\n")?;
        }
        let member = encoder.finish()?;
        cdx_gz.extend_from_slice(&member);

        let first = &chunk[0];
        let key: String = first.splitn(3, ' ').take(2).collect::<Vec<_>>().join(" ");
        idx.push_str(&key);
        idx.push(' ');
        idx.push_str(&serde_json::to_string(&BlockLine {
            offset,
            length: member.len() as u64,
        })?);
        idx.push('\n');
        blocks += 1;
    }

    Ok(ZipNumIndex {
        cdx_gz,
        idx: idx.into_bytes(),
        blocks,
    })
}

/// Inflate every block of an `index.cdx.gz` back into lines.
pub fn read_zipnum_lines(cdx_gz: &[u8]) -> Result<Vec<String>> {
    let mut text = String::new();
    MultiGzDecoder::new(cdx_gz).read_to_string(&mut text)?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("com,example)/{i:04} 20201007212236 {{\"url\":\"http://example.com/{i:04}\"}}"))
            .collect()
    }

    #[test]
    fn summary_lists_one_line_per_block() {
        let packed = write_zipnum(&lines(5), 2).expect("pack");
        assert_eq!(packed.blocks, 3);

        let idx = String::from_utf8(packed.idx).expect("utf8");
        let summary: Vec<_> = idx.lines().collect();
        assert_eq!(
            summary[0],
            r#"!meta 0 {"format":"cdxj-gzip-1.0","filename":"index.cdx.gz"}"#
        );
        assert_eq!(summary.len(), 4);
        assert!(summary[1].starts_with(r#"com,example)/0000 20201007212236 {"offset":0,"length":"#));
        assert!(summary[3].starts_with("com,example)/0004 20201007212236 "));
    }

    #[test]
    fn blocks_inflate_back_to_the_input() {
        let input = lines(7);
        let packed = write_zipnum(&input, 3).expect("pack");
        assert_eq!(read_zipnum_lines(&packed.cdx_gz).expect("read"), input);
    }

    #[test]
    fn packing_is_deterministic() {
        let input = lines(10);
        assert_eq!(
            write_zipnum(&input, 4).expect("first"),
            write_zipnum(&input, 4).expect("second")
        );
    }

    #[test]
    fn empty_index_has_only_meta_line() {
        let packed = write_zipnum(&[], 3000).expect("pack");
        assert!(packed.cdx_gz.is_empty());
        assert_eq!(packed.blocks, 0);
        assert_eq!(String::from_utf8(packed.idx).expect("utf8").lines().count(), 1);
    }
}
