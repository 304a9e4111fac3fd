// ==========================================
// 订单齐套放行分析系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx, 按工作表读取) / CSV (.csv)
// 输出: RawRelation（表头 + 文本行）, 不做类型解析
// ==========================================

use crate::domain::relations::{RawRelation, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 单文件解析接口
pub trait FileParser {
    fn parse_relation(&self, file_path: &Path) -> ImportResult<RawRelation>;
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 组装一行; 完全空白的行返回 None
fn build_row(headers: &[String], values: impl Iterator<Item = String>) -> Option<RawRow> {
    let mut row = RawRow::with_capacity(headers.len());
    for (header, value) in headers.iter().zip(values) {
        if !header.is_empty() {
            row.insert(header.clone(), value);
        }
    }
    if row.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_relation(&self, file_path: &Path) -> ImportResult<RawRelation> {
        check_exists(file_path)?;
        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some(row) = build_row(&headers, record.iter().map(|v| v.trim().to_string())) {
                rows.push(row);
            }
        }

        Ok(RawRelation::new(headers, rows))
    }
}

// ==========================================
// Excel 工作簿
// ==========================================
pub struct ExcelWorkbook {
    workbook: Xlsx<BufReader<File>>,
}

impl ExcelWorkbook {
    pub fn open(path: &Path) -> ImportResult<Self> {
        check_exists(path)?;
        let ext = extension_of(path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }
        let workbook: Xlsx<_> = open_workbook(path)?;
        Ok(Self { workbook })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// 工作表名是否存在（忽略大小写与首尾空白）
    pub fn find_sheet(&self, name: &str) -> Option<String> {
        self.workbook
            .sheet_names()
            .into_iter()
            .find(|s| s.trim().eq_ignore_ascii_case(name))
    }

    pub fn read_sheet(&mut self, sheet_name: &str) -> ImportResult<RawRelation> {
        let range = self
            .workbook
            .worksheet_range(sheet_name)
            .map_err(|e| match e {
                calamine::XlsxError::WorksheetNotFound(name) => ImportError::SheetNotFound(name),
                other => ImportError::ExcelParseError(other.to_string()),
            })?;
        Ok(range_to_relation(&range))
    }

    /// 读取第一个工作表
    pub fn read_first_sheet(&mut self) -> ImportResult<RawRelation> {
        let first = self
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        self.read_sheet(&first)
    }
}

fn range_to_relation(range: &Range<Data>) -> RawRelation {
    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return RawRelation::default();
    };

    let headers: Vec<String> = header_row.iter().map(|c| cell_to_text(c).trim().to_string()).collect();
    let rows = rows_iter
        .filter_map(|data_row| build_row(&headers, data_row.iter().map(cell_to_text)))
        .collect();

    RawRelation::new(headers, rows)
}

/// 单元格文本化（日期序列号转为 YYYY-MM-DD）
fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        other => other.to_string().trim().to_string(),
    }
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Excel 单表解析（第一个工作表）
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_relation(&self, file_path: &Path) -> ImportResult<RawRelation> {
        ExcelWorkbook::open(file_path)?.read_first_sheet()
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawRelation> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_relation(path),
            "xlsx" => ExcelParser.parse_relation(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
