//! CSV to [`Table`] parser with delimiter auto-detection and type inference.
//!
//! Uploads must be UTF-8. Each column's type is inferred from its non-empty
//! cells: integers, then floats, then booleans, falling back to text.
//! Empty cells become null.

use serde_json::{Number, Value};
use std::path::Path;

use crate::error::CsvError;
use crate::models::Table;

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed dataset
    pub table: Table,
    /// Detected encoding (always utf-8 on success)
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "" => "unknown".to_string(),
        _ => charset,
    }
}

/// Decode bytes as strict UTF-8, dropping a leading byte order mark.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, CsvError> {
    let body = match encoding_rs::Encoding::for_bom(bytes) {
        Some((enc, bom_len)) if enc == encoding_rs::UTF_8 => &bytes[bom_len..],
        Some(_) => return Err(CsvError::Encoding(detect_encoding(bytes))),
        None => bytes,
    };

    encoding_rs::UTF_8
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|s| s.into_owned())
        .ok_or_else(|| CsvError::Encoding(detect_encoding(bytes)))
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` when the header contains none of the candidates.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with UTF-8 check and delimiter detection.
pub fn parse_bytes(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    let content = decode_utf8(bytes)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding: "utf-8".to_string(),
        delimiter,
    })
}

/// Parse a CSV file from disk.
pub fn parse_csv_file<P: AsRef<Path>>(path: P) -> Result<ParseResult, CsvError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use tabkit::parser::parse_str;
///
/// let table = parse_str("name,age\nAlice,30\nBob,25", ',').unwrap();
///
/// assert_eq!(table.shape(), (2, 2));
/// assert_eq!(table.value(0, "age"), Some(&serde_json::json!(30)));
/// ```
pub fn parse_str(content: &str, delimiter: char) -> Result<Table, CsvError> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::Parse {
        line: 1,
        message: format!("delimiter '{}' is not a single byte", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }
    if let Some(pos) = headers.iter().position(|h| h.is_empty()) {
        return Err(CsvError::Parse {
            line: 1,
            message: format!("column {} has an empty name", pos + 1),
        });
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        raw_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|idx| infer_kind(raw_rows.iter().map(|row| row[idx].as_str())))
        .collect();

    let rows = raw_rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&kinds)
                .map(|(cell, kind)| convert_cell(cell, *kind))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows)?)
}

fn parse_error(err: csv::Error) -> CsvError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("expected {} fields, found {}", expected_len, len)
        }
        _ => err.to_string(),
    };
    CsvError::Parse { line, message }
}

/// Infer the narrowest type that fits every non-empty cell.
pub fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let (mut all_int, mut all_float, mut all_bool, mut any) = (true, true, true, false);

    for cell in cells.filter(|c| !c.is_empty()) {
        any = true;
        all_int &= cell.parse::<i64>().is_ok();
        all_float &= is_finite_float(cell);
        all_bool &= parse_bool(cell).is_some();
        if !all_int && !all_float && !all_bool {
            return ColumnKind::Text;
        }
    }

    match (any, all_int, all_float, all_bool) {
        (false, ..) => ColumnKind::Text,
        (true, true, _, _) => ColumnKind::Integer,
        (true, false, true, _) => ColumnKind::Float,
        (true, false, false, true) => ColumnKind::Boolean,
        _ => ColumnKind::Text,
    }
}

fn is_finite_float(cell: &str) -> bool {
    cell.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn convert_cell(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => cell
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| Value::String(cell.to_string())),
        ColumnKind::Float => cell
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnKind::Boolean => parse_bool(cell)
            .map(Value::Bool)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name,age,salary\nJohn,30,50000\nJane,25,45000", ',').unwrap();

        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.value(0, "name"), Some(&json!("John")));
        assert_eq!(table.value(0, "age"), Some(&json!(30)));
        assert_eq!(table.value(1, "salary"), Some(&json!(45000)));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let table = parse_str("a;b;c\n1;2;3", ';').unwrap();
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.value(0, "c"), Some(&json!(3)));
    }

    #[test]
    fn test_quoted_values() {
        let table = parse_str("name,value\n\"Doe, John\",\"Hello World\"", ',').unwrap();

        assert_eq!(table.value(0, "name"), Some(&json!("Doe, John")));
        assert_eq!(table.value(0, "value"), Some(&json!("Hello World")));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_missing_values_become_null() {
        let table = parse_str("a,b,c\n1,,3\n4,5,6", ',').unwrap();

        assert_eq!(table.value(0, "b"), Some(&Value::Null));
        assert_eq!(table.value(1, "b"), Some(&json!(5)));
    }

    #[test]
    fn test_type_inference() {
        let table = parse_str(
            "int,float,flag,text,mixed\n1,1.5,true,x,1\n2,2,False,y,true",
            ',',
        )
        .unwrap();

        assert_eq!(table.value(0, "int"), Some(&json!(1)));
        assert_eq!(table.value(1, "float"), Some(&json!(2.0)));
        assert_eq!(table.value(1, "flag"), Some(&json!(false)));
        assert_eq!(table.value(0, "text"), Some(&json!("x")));
        assert_eq!(table.value(0, "mixed"), Some(&json!("1")));
        assert_eq!(table.value(1, "mixed"), Some(&json!("true")));
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind(["1", "", "2"].into_iter()), ColumnKind::Integer);
        assert_eq!(infer_kind(["1", "2.5"].into_iter()), ColumnKind::Float);
        assert_eq!(infer_kind(["TRUE", "false"].into_iter()), ColumnKind::Boolean);
        assert_eq!(infer_kind(["true", "1"].into_iter()), ColumnKind::Text);
        assert_eq!(infer_kind(["inf"].into_iter()), ColumnKind::Text);
        assert_eq!(infer_kind(["", ""].into_iter()), ColumnKind::Text);
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let table = parse_str("a,b\n", ',').unwrap();
        assert_eq!(table.shape(), (0, 2));
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_str(" \n\n", ','), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_unequal_row_length_error() {
        let err = parse_str("a,b\n1,2,3", ',').unwrap_err();
        match err {
            CsvError::Parse { message, .. } => {
                assert!(message.contains("expected 2 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_header_error() {
        let err = parse_str("a,a\n1,2", ',').unwrap_err();
        assert!(matches!(err, CsvError::Table(_)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_single_column() {
        assert_eq!(detect_delimiter("name\nAlice"), ',');
    }

    #[test]
    fn test_parse_bytes_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"name,age\nAlice,30");
        let result = parse_bytes(&bytes).unwrap();

        assert_eq!(result.delimiter, ',');
        assert_eq!(result.table.columns(), &["name", "age"]);
    }

    #[test]
    fn test_latin1_rejected() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x6E, 0x61, 0x6D, 0x65, 0x0A, 0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert!(matches!(parse_bytes(bytes), Err(CsvError::Encoding(_))));
    }

    #[test]
    fn test_parse_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name,age\nAlice,30\n").unwrap();

        let result = parse_csv_file(&path).unwrap();
        assert_eq!(result.table.shape(), (1, 2));
    }
}
