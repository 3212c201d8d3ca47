use anyhow::{Context, Result};
use calamine::{Data, Range, Reader};
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::core::error::SchemaError;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub enum FileContent {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for FileContent {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileContent::Mapped(mmap) => mmap,
            FileContent::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        // Use memory mapping for large reports
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: We're only reading the file, not modifying it
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Raw tabular report: trimmed headers plus every non-blank data row.
#[derive(Debug, Clone)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
}

/// How a report file is laid out on disk, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    /// Delimited text with the given field separator
    Delimited(u8),
    /// Spreadsheet workbook; the first sheet is the report
    Workbook,
}

/// Tab for `.tsv`/`.txt`, workbook for `.xlsx`/`.xlsm`/`.xls`/`.ods`,
/// comma otherwise.
fn report_format(path: &Path) -> ReportFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("txt") => ReportFormat::Delimited(b'\t'),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => ReportFormat::Workbook,
        _ => ReportFormat::Delimited(b','),
    }
}

/// Read a search term report. Delimited reports accept ragged rows, with
/// missing trailing cells reading as absent; workbooks are read from their
/// first sheet.
pub fn read_report<P: AsRef<Path>>(path: P) -> Result<Report> {
    let path = path.as_ref();
    let content = read_file_smart(path)?;

    let report = match report_format(path) {
        ReportFormat::Delimited(delimiter) => read_delimited(path, content.as_ref(), delimiter)?,
        ReportFormat::Workbook => read_workbook(path, content.as_ref())?,
    };

    debug!(
        path = %path.display(),
        columns = report.headers.len(),
        rows = report.rows.len(),
        "read report"
    );
    Ok(report)
}

fn read_delimited(path: &Path, bytes: &[u8], delimiter: u8) -> Result<Report> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers = trimmed_headers(
        reader
            .headers()
            .with_context(|| format!("Failed to read header row of {}", path.display()))?,
    );
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SchemaError::EmptyReport { path: path.display().to_string() }.into());
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // +2: 1-based and the header line
        let record = record.with_context(|| format!("Failed to parse {} line {}", path.display(), i + 2))?;
        if !is_blank(&record) {
            rows.push(record);
        }
    }

    Ok(Report { headers, rows })
}

fn read_workbook(path: &Path, bytes: &[u8]) -> Result<Report> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.with_context(|| format!("Failed to read first sheet of {}", path.display()))?,
        None => return Err(SchemaError::EmptyReport { path: path.display().to_string() }.into()),
    };

    report_from_range(path, &range)
}

/// First used row of the sheet is the header row. Cells are rendered to
/// text so workbook rows go through the same normalization as CSV rows.
fn report_from_range(path: &Path, range: &Range<Data>) -> Result<Report> {
    let mut records = range
        .rows()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect::<csv::StringRecord>());

    let headers = records.next().map(|h| trimmed_headers(&h)).unwrap_or_default();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SchemaError::EmptyReport { path: path.display().to_string() }.into());
    }

    let rows = records.filter(|r| !is_blank(r)).collect();
    Ok(Report { headers, rows })
}

fn trimmed_headers(record: &csv::StringRecord) -> Vec<String> {
    record.iter().map(|h| h.trim().to_string()).collect()
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}

/// Write rendered output, creating parent directories as needed.
pub fn write_output<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_read_report_skips_blank_rows_and_bom() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let file = tmp.child("report.csv");
        file.write_binary(b"\xEF\xBB\xBFCustomer Search Term , Sales\nshoes,10\n,\nsocks,5\n")
            .unwrap();

        let report = read_report(file.path()).unwrap();

        assert_eq!(report.headers, vec!["Customer Search Term", "Sales"]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[1].get(0), Some("socks"));
    }

    #[test]
    fn test_read_report_accepts_ragged_rows() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let file = tmp.child("report.tsv");
        file.write_str("Term\tCampaign\tSales\nshoes\tA\n").unwrap();

        let report = read_report(file.path()).unwrap();

        assert_eq!(report.headers.len(), 3);
        assert_eq!(report.rows[0].get(2), None);
    }

    #[test]
    fn test_empty_report_is_schema_error() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let file = tmp.child("empty.csv");
        file.write_str("").unwrap();

        let err = read_report(file.path()).unwrap_err();
        assert!(err.downcast_ref::<SchemaError>().is_some());
    }

    #[test]
    fn test_report_format_by_extension() {
        assert_eq!(report_format(Path::new("r.csv")), ReportFormat::Delimited(b','));
        assert_eq!(report_format(Path::new("r.TSV")), ReportFormat::Delimited(b'\t'));
        assert_eq!(report_format(Path::new("r.xlsx")), ReportFormat::Workbook);
        assert_eq!(report_format(Path::new("r.ods")), ReportFormat::Workbook);
        assert_eq!(report_format(Path::new("report")), ReportFormat::Delimited(b','));
    }

    #[test]
    fn test_workbook_sheet_becomes_report() {
        let mut range = Range::new((0, 0), (3, 2));
        range.set_value((0, 0), Data::String(" Customer Search Term".to_string()));
        range.set_value((0, 1), Data::String("Campaign Name".to_string()));
        range.set_value((0, 2), Data::String("7 Day Total Sales ".to_string()));
        range.set_value((1, 0), Data::String("red shoes".to_string()));
        range.set_value((1, 1), Data::String("Camp A".to_string()));
        range.set_value((1, 2), Data::Float(12.5));
        // row 2 left empty
        range.set_value((3, 0), Data::String("blue socks".to_string()));
        range.set_value((3, 2), Data::Int(8));

        let report = report_from_range(Path::new("report.xlsx"), &range).unwrap();

        assert_eq!(report.headers, vec!["Customer Search Term", "Campaign Name", "7 Day Total Sales"]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].get(2), Some("12.5"));
        assert_eq!(report.rows[1].get(0), Some("blue socks"));
        assert_eq!(report.rows[1].get(1), Some(""));
        assert_eq!(report.rows[1].get(2), Some("8"));
    }

    #[test]
    fn test_workbook_without_header_is_schema_error() {
        let range: Range<Data> = Range::new((0, 0), (1, 1));

        let err = report_from_range(Path::new("blank.xlsx"), &range).unwrap_err();
        assert!(err.downcast_ref::<SchemaError>().is_some());
    }

    #[test]
    fn test_unreadable_workbook_reports_path() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let file = tmp.child("report.xlsx");
        file.write_str("Customer Search Term,Sales\nshoes,10\n").unwrap();

        let err = read_report(file.path()).unwrap_err();

        assert!(err.downcast_ref::<SchemaError>().is_none());
        assert!(format!("{err:#}").contains("Failed to open workbook"));
    }

    #[test]
    fn test_write_output_creates_parents() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let out = tmp.child("nested/dir/out.csv");

        write_output(out.path(), "a,b\n").unwrap();

        out.assert("a,b\n");
    }
}
