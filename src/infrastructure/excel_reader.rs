// Spreadsheet reader backed by calamine
use crate::application::catalog_repository::SpreadsheetReader;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::tabular::{CellValue, Record};
use crate::infrastructure::encryption::FileCipher;
use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use std::io::Cursor;
use std::path::Path;

/// Reads the first worksheet of an xlsx/xlsm/xls/ods file.
/// Files are decrypted first when a cipher is configured.
#[derive(Clone, Default)]
pub struct CalamineReader {
    cipher: Option<FileCipher>,
}

impl CalamineReader {
    pub fn new(cipher: Option<FileCipher>) -> Self {
        Self { cipher }
    }

    async fn load_bytes(&self, path: &Path) -> CatalogResult<Vec<u8>> {
        match &self.cipher {
            Some(cipher) => cipher.decrypt_file_to_bytes(path).await,
            None => tokio::fs::read(path)
                .await
                .map_err(|e| CatalogError::SourceRead(format!("{}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl SpreadsheetReader for CalamineReader {
    async fn read(&self, path: &str) -> CatalogResult<Vec<Record>> {
        let file = Path::new(path);
        let exists = tokio::fs::try_exists(file)
            .await
            .map_err(|e| CatalogError::SourceRead(format!("cannot access {path}: {e}")))?;
        if !exists {
            tracing::warn!("Excel file does not exist: {}", path);
            return Ok(Vec::new());
        }

        let result: CatalogResult<Vec<Record>> = async {
            let bytes = self.load_bytes(file).await?;
            tokio::task::spawn_blocking(move || parse_workbook(bytes))
                .await
                .map_err(|e| CatalogError::SourceRead(format!("spreadsheet parser task failed: {e}")))?
        }
        .await;

        match &result {
            Ok(records) => tracing::info!("Successfully read {} rows from Excel file {}", records.len(), path),
            Err(e) => tracing::error!("Error reading Excel file {}: {}", path, e),
        }
        result
    }
}

fn parse_workbook(bytes: Vec<u8>) -> CatalogResult<Vec<Record>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CatalogError::SourceRead(format!("cannot open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CatalogError::SourceRead("workbook has no worksheets".to_string()))?
        .map_err(|e| CatalogError::SourceRead(format!("cannot read first worksheet: {e}")))?;

    let (rows, cols) = range.get_size();
    tracing::debug!("Processing worksheet: rows={}, columns={}", rows, cols);

    Ok(range_to_records(&range))
}

/// The range covers used cells only. Its first row is the header; rows with
/// no values at all are skipped.
fn range_to_records(range: &Range<Data>) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();

    rows.filter(|row| row.iter().any(|cell| !spreadsheet_cell(cell).is_null()))
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .map(|(header, cell)| (header.clone(), spreadsheet_cell(cell)))
                .collect()
        })
        .collect()
}

/// Spreadsheet cell inference: typed by the cell's stored type, not its text.
fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::Timestamp)
            .unwrap_or_else(|| CellValue::Text(cell.to_string())),
        Data::String(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
