//! Shared fixtures: hand-built WARC captures and zip helpers.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

pub const DATE: &str = "2020-10-07T21:22:36Z";
pub const TS: &str = "20201007212236";

pub fn html(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><p>{body}</p></body></html>")
}

/// Builds a WARC file record by record.
#[derive(Default)]
pub struct WarcFixture {
    records: Vec<String>,
}

impl WarcFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, kind: &str, uri: &str, date: &str, content_type: &str, block: &str) -> Self {
        let target = if uri.is_empty() {
            String::new()
        } else {
            format!("WARC-Target-URI: {uri}\r\n")
        };
        self.records.push(format!(
            "WARC/1.0\r\nWARC-Type: {kind}\r\n{target}WARC-Date: {date}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{block}\r\n\r\n",
            block.len()
        ));
        self
    }

    pub fn response(self, url: &str, date: &str, mime: &str, body: &str) -> Self {
        let block = format!("HTTP/1.1 200 OK\r\nContent-Type: {mime}\r\n\r\n{body}");
        self.record("response", url, date, "application/http; msgtype=response", &block)
    }

    pub fn html_page(self, url: &str, date: &str, title: &str, body: &str) -> Self {
        self.response(url, date, "text/html", &html(title, body))
    }

    pub fn redirect(self, url: &str, date: &str, location: &str) -> Self {
        let block = format!("HTTP/1.1 301 Moved Permanently\r\nLocation: {location}\r\nContent-Type: text/html\r\n\r\n");
        self.record("response", url, date, "application/http; msgtype=response", &block)
    }

    pub fn request(self, url: &str, date: &str, referer: Option<&str>) -> Self {
        let mut block = format!("GET {url} HTTP/1.1\r\nHost: example\r\n");
        if let Some(referer) = referer {
            block.push_str(&format!("Referer: {referer}\r\n"));
        }
        block.push_str("\r\n");
        self.record("request", url, date, "application/http; msgtype=request", &block)
    }

    pub fn warcinfo(self, json: &str) -> Self {
        self.record("warcinfo", "", DATE, "application/warc-fields", &format!("json-metadata: {json}\r\n"))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.records.concat().into_bytes()
    }

    /// One gzip member per record.
    pub fn to_gzip(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for record in &self.records {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(record.as_bytes()).unwrap();
            out.extend(encoder.finish().unwrap());
        }
        out
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let bytes = if name.ends_with(".gz") { self.to_gzip() } else { self.to_bytes() };
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

/// One HTML page referenced by a stylesheet request.
pub fn example_capture() -> WarcFixture {
    WarcFixture::new()
        .html_page("http://www.example.com/", DATE, "Example Domain", "Hello archive")
        .request("http://www.example.com/style.css", DATE, Some("http://www.example.com/"))
        .response("http://www.example.com/style.css", DATE, "text/css", "p { color: red }")
}

pub fn write_page_list(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = String::from("{\"format\":\"json-pages-1.0\",\"id\":\"pages\",\"title\":\"Pages\"}\n");
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Every member of a zip, in archive order.
pub fn read_members(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut members = Vec::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        members.push((file.name().to_string(), data));
    }
    members
}

pub fn member(path: &Path, name: &str) -> Vec<u8> {
    read_members(path)
        .into_iter()
        .find(|(member, _)| member == name)
        .map(|(_, data)| data)
        .unwrap_or_else(|| panic!("no member {name}"))
}

pub fn member_text(path: &Path, name: &str) -> String {
    String::from_utf8(member(path, name)).unwrap()
}

/// Non-header lines of a page list as JSON values.
pub fn page_lines(path: &Path, name: &str) -> Vec<serde_json::Value> {
    member_text(path, name)
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

pub fn write_zip(path: &Path, members: &[(String, Vec<u8>)]) {
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    for (name, data) in members {
        zip.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Rewrite the zip at `source` into `target`, letting `edit` drop or change members.
pub fn rewrite_zip(
    source: &Path,
    target: &Path,
    edit: impl Fn(&str, Vec<u8>) -> Option<Vec<u8>>,
) {
    let members: Vec<_> = read_members(source)
        .into_iter()
        .filter_map(|(name, data)| edit(&name, data).map(|data| (name, data)))
        .collect();
    write_zip(target, &members);
}
