//! # Tabular Dataset Module / 表格数据集模块
//!
//! This module turns a data file on disk into a rectangular matrix of string
//! cells. It dispatches on the file extension to one of two strategies: an
//! Excel strategy for `.xls`/`.xlsx` workbooks and a delimited-text strategy
//! for `.csv` files. Both strategies share one post-processing contract: the
//! returned dataset is rectangular, header rows are excluded on request, and
//! every failure is converted to a typed `ReadError` instead of escaping.
//!
//! 此模块将磁盘上的数据文件转换为字符串单元格的矩形矩阵。
//! 它根据文件扩展名分发到两种策略之一：用于 `.xls`/`.xlsx` 工作簿的
//! Excel 策略和用于 `.csv` 文件的分隔文本策略。两种策略共享同一个
//! 后处理契约：返回的数据集是矩形的，按需排除表头行，
//! 并且每个失败都会转换为类型化的 `ReadError` 而不会逃逸。

use calamine::{open_workbook_auto, Data, Reader};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// The fixed escape character used by the delimited-text strategy.
/// 分隔文本策略使用的固定转义字符。
const ESCAPE: u8 = b'\\';

/// Errors produced while turning a file into a dataset.
/// Both variants are terminal for an execution run.
///
/// 将文件转换为数据集时产生的错误。
/// 两个变体对一次执行运行而言都是终止性的。
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file extension is not one of the supported formats.
    /// 文件扩展名不属于受支持的格式。
    #[error("error reading the file '{}': the file format must be csv, xls or xlsx", path.display())]
    UnsupportedFormat {
        /// The offending file path / 出错的文件路径
        path: PathBuf,
    },
    /// The file could not be read or parsed; the underlying cause is kept.
    /// 文件无法读取或解析；保留底层原因。
    #[error("error reading the file '{}': {source}", path.display())]
    Io {
        /// The offending file path / 出错的文件路径
        path: PathBuf,
        /// The underlying I/O or parse failure / 底层的 I/O 或解析失败
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ReadError {
    /// Returns the path of the file that failed to read.
    pub fn path(&self) -> &Path {
        match self {
            ReadError::UnsupportedFormat { path } => path,
            ReadError::Io { path, .. } => path,
        }
    }
}

/// Caller-supplied knobs for a single dataset load.
/// The sheet index applies to the Excel strategy only; the separator and
/// quote byte apply to the delimited-text strategy only.
///
/// 单次数据集加载的调用方参数。
/// 工作表索引仅适用于 Excel 策略；分隔符和引用字节仅适用于分隔文本策略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Which worksheet to read, 0-based.
    /// 要读取的工作表，从 0 开始。
    pub sheet_index: usize,
    /// If `true`, the first row is a header and never appears in the dataset.
    /// 如果为 `true`，第一行是表头，永远不会出现在数据集中。
    pub has_header: bool,
    /// The delimiter byte separating entries on a line.
    /// 分隔一行中各条目的分隔字节。
    pub separator: u8,
    /// The byte delimiting quoted entries, or `None` to disable quoting.
    /// 界定引用条目的字节，`None` 表示禁用引用。
    pub quote: Option<u8>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            has_header: false,
            separator: b',',
            quote: Some(b'"'),
        }
    }
}

/// A rectangular, immutable matrix of string cells produced by [`read`].
/// Every row holds exactly `width` cells; missing trailing cells have been
/// padded with empty strings by the reader.
///
/// 由 [`read`] 生成的矩形、不可变的字符串单元格矩阵。
/// 每一行恰好持有 `width` 个单元格；缺失的尾部单元格已由读取器
/// 用空字符串填充。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularDataset {
    /// The cell count every row shares / 每一行共享的单元格数量
    width: usize,
    /// The rows, in file order / 按文件顺序排列的行
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    fn new(width: usize, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Self { width, rows }
    }

    /// The cell count shared by every row, used as the procedure arity.
    /// 每一行共享的单元格数量，用作过程的参数个数。
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of data rows (header rows are never counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the dataset holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Returns one row by 0-based index, if present.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}

/// Reads the file at `path` into a [`TabularDataset`].
///
/// The format strategy is selected from the file extension: `.xls` and
/// `.xlsx` use the Excel strategy (honoring `options.sheet_index`), `.csv`
/// uses the delimited-text strategy (honoring `options.separator` and
/// `options.quote`). Any other extension is an `UnsupportedFormat` error.
///
/// 将 `path` 处的文件读取为 [`TabularDataset`]。
///
/// 格式策略根据文件扩展名选择：`.xls` 和 `.xlsx` 使用 Excel 策略
///（遵循 `options.sheet_index`），`.csv` 使用分隔文本策略
///（遵循 `options.separator` 和 `options.quote`）。
/// 任何其他扩展名都是 `UnsupportedFormat` 错误。
///
/// # Arguments
/// * `path` - The data file to load
/// * `options` - Format knobs for the selected strategy
///
/// # Returns
/// The rectangular dataset, or a typed `ReadError`; this function never
/// panics and never lets a foreign error type escape.
pub fn read(path: impl AsRef<Path>, options: &ReadOptions) -> Result<TabularDataset, ReadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("xls") | Some("xlsx") => {
            read_spreadsheet(path, options.sheet_index, options.has_header)
        }
        Some("csv") => read_delimited(path, options),
        _ => {
            error!(
                path = %path.display(),
                "unsupported dataset format, the file format must be csv, xls or xlsx"
            );
            Err(ReadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Reads one worksheet of an Excel workbook into a dataset.
///
/// The dataset width is not taken from the first row: trailing cells may be
/// physically absent from any individual row, so the width is the maximum
/// physical cell count observed while scanning from the header offset until
/// the row index reaches the larger of 10 and the row count. Rows shorter
/// than the inferred width are padded with empty strings; wholly absent rows
/// are skipped rather than emitted as blank rows.
fn read_spreadsheet(
    path: &Path,
    sheet_index: usize,
    has_header: bool,
) -> Result<TabularDataset, ReadError> {
    debug!(path = %path.display(), sheet_index, "reading excel dataset");

    let mut workbook = open_workbook_auto(path).map_err(|e| io_error(path, e))?;
    let range = workbook
        .worksheet_range_at(sheet_index)
        .ok_or_else(|| io_error(path, format!("no sheet at index {sheet_index}")))?
        .map_err(|e| io_error(path, e))?;

    // Keep only physically present rows, each trimmed to its last non-empty
    // cell: the trimmed length is the row's physical cell count.
    let physical_rows: Vec<&[Data]> = range
        .rows()
        .map(trim_trailing_empty)
        .filter(|row| !row.is_empty())
        .collect();

    let row_count = physical_rows.len();
    let first_row = usize::from(has_header);

    // Infer the dataset width from a sample of rows. The scan deliberately
    // runs until the index reaches the larger of 10 and the row count, so an
    // unrepresentative first row cannot undercount columns used further down
    // the sheet.
    let mut width = 0;
    let mut index = first_row;
    while index < 10 || index < row_count {
        if let Some(row) = physical_rows.get(index) {
            width = width.max(row.len());
        }
        index += 1;
    }

    let mut rows = Vec::with_capacity(row_count.saturating_sub(first_row));
    for row in physical_rows.iter().skip(first_row) {
        let mut cells = Vec::with_capacity(width);
        for position in 0..width {
            cells.push(row.get(position).map_or_else(String::new, cell_text));
        }
        rows.push(cells);
    }

    Ok(TabularDataset::new(width, rows))
}

/// Reads a delimited-text file into a dataset.
///
/// Entries are split on `options.separator`, quoted with `options.quote`
/// (or not at all when it is `None`), and escaped with a backslash. When
/// `options.has_header` is set the reader starts from line index 1 instead
/// of 0. Records are read strictly: a line whose entry count differs from
/// the first line's is a parse failure, which is what keeps the returned
/// dataset rectangular.
fn read_delimited(path: &Path, options: &ReadOptions) -> Result<TabularDataset, ReadError> {
    debug!(path = %path.display(), "reading csv dataset");

    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(options.separator)
        .has_headers(options.has_header)
        .escape(Some(ESCAPE))
        .flexible(false);
    match options.quote {
        Some(quote) => {
            builder.quote(quote);
        }
        None => {
            builder.quoting(false);
        }
    }

    let mut reader = builder.from_path(path).map_err(|e| io_error(path, e))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| io_error(path, e))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    let width = rows.first().map_or(0, Vec::len);
    Ok(TabularDataset::new(width, rows))
}

/// Strips trailing empty cells; the remaining length is the physical width.
fn trim_trailing_empty(row: &[Data]) -> &[Data] {
    let end = row
        .iter()
        .rposition(|cell| !matches!(cell, Data::Empty))
        .map_or(0, |position| position + 1);
    &row[..end]
}

/// Renders one cell as text: string content is taken as is, and any other
/// value falls back to its decimal rendering. An absent cell never reaches
/// this function; it becomes the empty string during padding.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        Data::Empty => String::new(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => decimal_text(*value),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => decimal_text(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        Data::Error(error) => error.to_string(),
    }
}

/// Decimal rendering of a numeric cell. Integral values keep one decimal
/// place, so `1815` stored as a number reads back as `"1815.0"`.
fn decimal_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn io_error(path: &Path, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> ReadError {
    let source = source.into();
    error!(path = %path.display(), %source, "error reading the file");
    ReadError::Io {
        path: path.to_path_buf(),
        source,
    }
}
