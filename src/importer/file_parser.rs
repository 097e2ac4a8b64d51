// ==========================================
// 债务导入服务 - 表格读取器
// ==========================================
// 支持: CSV / XLSX（第一个工作表）
// 输出: 按表头投影的行，再按批大小切分
// ==========================================

use calamine::{Data, DataType, Reader, Xlsx};
use chrono::Timelike;
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::domain::{Batch, Row, TabularFormat};
use crate::importer::error::{ImportError, ImporterResult};

/// 行迭代器
pub type RowIter<'a> = Box<dyn Iterator<Item = Row> + Send + 'a>;

// ==========================================
// BatchReader Trait
// ==========================================
// 实现者: CsvBatchReader / XlsxBatchReader
pub trait BatchReader: Send + Sync {
    fn format(&self) -> TabularFormat;

    /// 读表头并返回数据行迭代器
    ///
    /// # 返回
    /// - Ok(RowIter): 表头读取成功，数据行惰性产出（全空行同样产出，由处理器判定）
    /// - Err: 表头或工作簿无法解析（调用方据此回退到另一种格式）
    fn read_rows<'a>(&self, payload: &'a [u8]) -> ImporterResult<RowIter<'a>>;
}

/// 规整表头单元格
fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

// ==========================================
// CSV Reader
// ==========================================
pub struct CsvBatchReader;

impl BatchReader for CsvBatchReader {
    fn format(&self) -> TabularFormat {
        TabularFormat::Csv
    }

    fn read_rows<'a>(&self, payload: &'a [u8]) -> ImporterResult<RowIter<'a>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(payload);

        let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::CsvParseError("缺少表头行".to_string()));
        }
        debug!(?headers, "CSV 表头");

        let rows = reader
            .into_records()
            .enumerate()
            .filter_map(move |(idx, result)| match result {
                Ok(record) => Some(Row::project(&headers, record.iter())),
                Err(e) => {
                    // 数据行从第 2 行开始
                    warn!(line = idx + 2, error = %e, "CSV 行读取失败，已跳过");
                    None
                }
            });

        Ok(Box::new(rows))
    }
}

// ==========================================
// XLSX Reader
// ==========================================
pub struct XlsxBatchReader;

impl BatchReader for XlsxBatchReader {
    fn format(&self) -> TabularFormat {
        TabularFormat::Xlsx
    }

    fn read_rows<'a>(&self, payload: &'a [u8]) -> ImporterResult<RowIter<'a>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(payload))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("xlsx has no sheets".to_string()))?;
        debug!(sheet = %sheet_name, "XLSX 第一个工作表");

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = match sheet_rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| clean_header(&cell_text(cell)))
                .collect(),
            None => return Ok(Box::new(std::iter::empty())),
        };
        debug!(?headers, "XLSX 表头");

        // 单元格在 Range 内，整表物化后再交给调用方
        let rows: Vec<Row> = sheet_rows
            .map(|cells| {
                let values: Vec<String> = cells.iter().map(cell_text).collect();
                Row::project(&headers, values.iter().map(String::as_str))
            })
            .collect();

        Ok(Box::new(rows.into_iter()))
    }
}

/// 单元格转文本；日期单元格按日历日期输出，而不是 Excel 序列号
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time().num_seconds_from_midnight() == 0 => {
                dt.format("%Y-%m-%d").to_string()
            }
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(iso) => iso.clone(),
        _ => cell.to_string(),
    }
}

static CSV_READER: CsvBatchReader = CsvBatchReader;
static XLSX_READER: XlsxBatchReader = XlsxBatchReader;

/// 按格式取读取器（Unknown 先按 XLSX 尝试）
pub fn reader_for(format: TabularFormat) -> &'static dyn BatchReader {
    match format {
        TabularFormat::Csv => &CSV_READER,
        TabularFormat::Xlsx | TabularFormat::Unknown => &XLSX_READER,
    }
}

// ==========================================
// 批次切分
// ==========================================

/// 把行迭代器切成定长批次，最后一批可以更短，不产出空批次
pub struct Batches<'a> {
    rows: RowIter<'a>,
    batch_size: usize,
}

impl<'a> Batches<'a> {
    pub fn new(rows: RowIter<'a>, batch_size: usize) -> Self {
        Self {
            rows,
            batch_size: batch_size.max(1),
        }
    }
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let batch: Batch = self.rows.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
