//! Index throughput benchmarks.
//!
//! # Benchmarks
//!
//! - `index_plain_warc`: single pass over an uncompressed WARC, sorted output
//! - `index_with_page_detection`: same pass with a `PageDetector` observing
//! - `zipnum_pack`: packing the resulting lines into gzip blocks
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench index_throughput
//! ```

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use wacz_core::{
    IndexBuilder, PageDetector, RecordFilter, ZIPNUM_BLOCK_LINES, index_warcs, write_zipnum,
};

/// Synthetic capture: one HTML page plus a request referring to it per URL.
fn setup_warc(pages: usize) -> Vec<u8> {
    let mut out = String::new();
    for i in 0..pages {
        let body = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><title>Page {i}</title><body>page {i}</body></html>"
        );
        out.push_str(&format!(
            "WARC/1.0\r\nWARC-Type: response\r\nWARC-Target-URI: http://example.com/{i}\r\nWARC-Date: 2020-10-07T21:22:36Z\r\nContent-Type: application/http; msgtype=response\r\nContent-Length: {}\r\n\r\n{body}\r\n\r\n",
            body.len()
        ));
        let request = format!(
            "GET /{i}.css HTTP/1.1\r\nReferer: http://example.com/{i}\r\n\r\n"
        );
        out.push_str(&format!(
            "WARC/1.0\r\nWARC-Type: request\r\nWARC-Target-URI: http://example.com/{i}.css\r\nWARC-Date: 2020-10-07T21:22:36Z\r\nContent-Type: application/http; msgtype=request\r\nContent-Length: {}\r\n\r\n{request}\r\n\r\n",
            request.len()
        ));
    }
    out.into_bytes()
}

fn bench_index(c: &mut Criterion) {
    let warc = setup_warc(5_000);
    let mut group = c.benchmark_group("index");
    group.throughput(Throughput::Bytes(warc.len() as u64));

    group.bench_function("index_plain_warc", |b| {
        b.iter(|| {
            let output =
                index_warcs([("bench.warc", warc.as_slice())], RecordFilter::All).unwrap();
            black_box(output.lines.len())
        });
    });

    group.bench_function("index_with_page_detection", |b| {
        b.iter(|| {
            let mut detector = PageDetector::new(true);
            let mut builder = IndexBuilder::new(RecordFilter::All);
            builder.add_warc("bench.warc", &warc, &mut detector).unwrap();
            let pages = detector.finish().unwrap();
            black_box((builder.finish().unwrap().lines.len(), pages.pages.len()))
        });
    });
    group.finish();
}

fn bench_zipnum(c: &mut Criterion) {
    let warc = setup_warc(5_000);
    let lines = index_warcs([("bench.warc", warc.as_slice())], RecordFilter::All)
        .unwrap()
        .lines;

    c.bench_function("zipnum_pack", |b| {
        b.iter(|| black_box(write_zipnum(&lines, ZIPNUM_BLOCK_LINES).unwrap().blocks));
    });
}

criterion_group!(benches, bench_index, bench_zipnum);
criterion_main!(benches);
