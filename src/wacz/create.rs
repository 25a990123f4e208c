//! The creation run: index, detect pages, write members, manifest last.

use std::collections::HashSet;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use tracing::instrument;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::constants::{
    ARCHIVE_DIR, DATAPACKAGE_PATH, EXTRA_PAGES_PATH, INDEX_CDX_PATH, INDEX_IDX_PATH, LOGS_DIR,
    PAGES_PATH,
};
use crate::error::{Result, WaczError};
use crate::index::IndexBuilder;
use crate::pages::{MainPage, OverrideList, PageDetector, load_page_list, serialize_page_list};
use crate::timestamp::{normalize_timestamp, timestamp_to_iso};
use crate::types::{CreateOptions, Manifest, PageListHeader};
use crate::wacz::manifest::ManifestBuilder;

const PAGES_LIST_ID: &str = "pages";
const PAGES_LIST_TITLE: &str = "All Pages";
const EXTRA_PAGES_LIST_ID: &str = "extra-pages";
const EXTRA_PAGES_LIST_TITLE: &str = "Extra Pages";

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct CreateSummary {
    pub output: PathBuf,
    pub index_entries: usize,
    pub pages: usize,
    pub extra_pages: usize,
    pub manifest: Manifest,
}

/// Build a WACZ package from `options`.
///
/// The archive is assembled in a temporary file next to the output and only
/// moved into place once the manifest is written, so a failed run leaves
/// nothing behind.
#[instrument(skip_all, fields(output = %options.output.display()))]
pub fn create_wacz(options: &CreateOptions) -> Result<CreateSummary> {
    options.validate()?;

    let main_page = options
        .main_url
        .as_deref()
        .map(|url| MainPage::new(url, options.main_ts.as_deref()))
        .transpose()?;
    let explicit_date = options
        .date
        .as_deref()
        .map(|date| normalize_timestamp(date).and_then(|ts| timestamp_to_iso(&ts)))
        .transpose()?;

    let mut detector = PageDetector::new(options.detect_pages).with_text(options.text);
    if let Some(path) = &options.pages_file {
        detector = detector.with_passed_pages(read_override_list(path)?);
    }
    if let Some(path) = &options.extra_pages_file {
        detector = detector.with_extra_pages(read_override_list(path)?);
    }
    if let Some(main) = main_page.clone() {
        detector = detector.with_main_page(main);
    }

    let inputs = read_inputs(&options.inputs)?;
    let mut builder = IndexBuilder::new(options.records.clone());
    for (name, data) in &inputs {
        let stats = builder.add_warc(name, data, &mut detector)?;
        tracing::info!(
            target = "wacz::create",
            input = %name,
            records = stats.records,
            indexed = stats.indexed,
            skipped = stats.skipped,
            "indexed input"
        );
    }
    let index = builder.finish()?;
    let page_set = detector.finish()?;
    let zipnum = index.zipnum()?;

    let pages_jsonl = serialize_page_list(
        &PageListHeader::new(PAGES_LIST_ID, PAGES_LIST_TITLE, options.text),
        &page_set.pages,
    )?;
    let extra_jsonl = match &options.extra_pages_file {
        Some(_) => Some(serialize_page_list(
            &PageListHeader::new(EXTRA_PAGES_LIST_ID, EXTRA_PAGES_LIST_TITLE, options.text),
            &page_set.extra_pages,
        )?),
        None => None,
    };
    let logs = match &options.log_directory {
        Some(dir) => read_logs(dir)?,
        None => Vec::new(),
    };

    let mut manifest = ManifestBuilder::new(options.hash_algorithm)
        .title(options.title.clone().or(page_set.collection_title.clone()))
        .description(
            options
                .description
                .clone()
                .or(page_set.collection_description.clone()),
        );
    if let Some(main) = &main_page {
        let detected_date = page_set
            .main_page_timestamp
            .as_deref()
            .or(main.timestamp.as_deref())
            .map(timestamp_to_iso)
            .transpose()?;
        manifest = manifest.main_page(main.url.clone(), explicit_date.or(detected_date));
    }

    let output = options.output.clone();
    let parent = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
    let mut writer = ArchiveWriter::new(temp.as_file_mut(), manifest);

    for (name, data) in &inputs {
        writer.add(&format!("{ARCHIVE_DIR}{name}"), data, CompressionMethod::Stored)?;
    }
    writer.add(INDEX_CDX_PATH, &zipnum.cdx_gz, CompressionMethod::Stored)?;
    writer.add(INDEX_IDX_PATH, &zipnum.idx, CompressionMethod::Deflated)?;
    writer.add(PAGES_PATH, &pages_jsonl, CompressionMethod::Deflated)?;
    if let Some(extra) = &extra_jsonl {
        writer.add(EXTRA_PAGES_PATH, extra, CompressionMethod::Deflated)?;
    }
    for (name, data) in &logs {
        writer.add(&format!("{LOGS_DIR}{name}"), data, CompressionMethod::Deflated)?;
    }
    let manifest = writer.finish()?;

    temp.persist(&output).map_err(|err| WaczError::Io(err.error))?;
    tracing::info!(
        target = "wacz::create",
        output = %output.display(),
        entries = index.entries.len(),
        pages = page_set.pages.len(),
        "archive written"
    );

    Ok(CreateSummary {
        output,
        index_entries: index.entries.len(),
        pages: page_set.pages.len(),
        extra_pages: page_set.extra_pages.len(),
        manifest,
    })
}

/// Zip writer that hashes each member into the manifest as it is written.
struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    manifest: ManifestBuilder,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    fn new(inner: W, manifest: ManifestBuilder) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            manifest,
        }
    }

    fn add(&mut self, path: &str, data: &[u8], method: CompressionMethod) -> Result<()> {
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .large_file(data.len() as u64 >= u64::from(u32::MAX));
        self.zip.start_file(path, options)?;
        self.zip.write_all(data)?;
        self.manifest.add_member(path, data);
        tracing::debug!(target = "wacz::create", path, bytes = data.len(), "member written");
        Ok(())
    }

    /// Write `datapackage.json` as the final member and close the container.
    fn finish(mut self) -> Result<Manifest> {
        let manifest = self.manifest.finish();
        let json = serde_json::to_vec_pretty(&manifest)?;
        self.zip.start_file(
            DATAPACKAGE_PATH,
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        )?;
        self.zip.write_all(&json)?;
        let mut inner = self.zip.finish()?;
        inner.flush()?;
        Ok(manifest)
    }
}

fn read_override_list(path: &Path) -> Result<OverrideList> {
    let source_name = path.display().to_string();
    let contents = fs_err::read_to_string(path)?;
    let lines = load_page_list(&source_name, &contents)?;
    tracing::info!(target = "wacz::create", list = %source_name, pages = lines.len(), "loaded page list");
    OverrideList::from_lines(&source_name, lines)
}

/// Read every input into memory under its archive file name.
fn read_inputs(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let name = file_name(path)?;
        if !seen.insert(name.clone()) {
            return Err(WaczError::ConflictingOptions {
                reason: format!("two inputs share the file name '{name}'").into(),
            });
        }
        inputs.push((name, fs_err::read(path)?));
    }
    Ok(inputs)
}

/// Regular files directly inside `dir`, sorted by name.
fn read_logs(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut logs = Vec::new();
    for entry in fs_err::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            logs.push((file_name(&path)?, fs_err::read(&path)?));
        }
    }
    logs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(logs)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| WaczError::MissingOption {
            reason: format!("'{}' has no usable file name", path.display()).into(),
        })
}
