use crate::error::{GrowthError, Result};
use crate::models::profile::Sex;
use crate::models::reference::{ReferenceRow, ReferenceTable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies the LMS table for one sex. Never substitutes the other sex's table.
pub trait ReferenceProvider {
    fn load_table(&self, sex: Sex) -> Result<ReferenceTable>;
}

/// Reads WHO tables exported as delimited text (`.csv`, `.tsv`, `.txt`) or JSON.
#[derive(Debug, Clone)]
pub struct FileReferenceProvider {
    reference_dir: PathBuf,
    tables: HashMap<Sex, String>,
}

impl FileReferenceProvider {
    pub fn new(reference_dir: impl Into<PathBuf>, tables: HashMap<Sex, String>) -> Self {
        Self {
            reference_dir: reference_dir.into(),
            tables,
        }
    }

    pub fn table_path(&self, sex: Sex) -> Result<PathBuf> {
        let identifier = self.tables.get(&sex).ok_or_else(|| {
            GrowthError::ReferenceDataUnavailable(format!("no reference table configured for {sex}"))
        })?;
        Ok(self.reference_dir.join(identifier))
    }
}

impl ReferenceProvider for FileReferenceProvider {
    fn load_table(&self, sex: Sex) -> Result<ReferenceTable> {
        let path = self.table_path(sex)?;
        log::debug!("loading {sex} reference table from {}", path.display());

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            GrowthError::ReferenceDataUnavailable(format!("{}: {e}", path.display()))
        })?;

        let table = parse_reference_file(&path, &raw)?;
        log::info!(
            "loaded {sex} reference table: {} rows, days {}-{}",
            table.rows().len(),
            table.first_day(),
            table.last_day()
        );
        Ok(table)
    }
}

/// Tables already held in memory, e.g. embedded by a host application or built in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceProvider {
    tables: HashMap<Sex, ReferenceTable>,
}

impl InMemoryReferenceProvider {
    pub fn with_table(mut self, sex: Sex, table: ReferenceTable) -> Self {
        self.tables.insert(sex, table);
        self
    }
}

impl ReferenceProvider for InMemoryReferenceProvider {
    fn load_table(&self, sex: Sex) -> Result<ReferenceTable> {
        self.tables.get(&sex).cloned().ok_or_else(|| {
            GrowthError::ReferenceDataUnavailable(format!("no {sex} reference table loaded"))
        })
    }
}

pub fn parse_reference_file(path: &Path, raw: &str) -> Result<ReferenceTable> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let rows: Vec<ReferenceRow> = serde_json::from_str(raw).map_err(|e| {
            GrowthError::InvalidReferenceData(format!("{}: {e}", path.display()))
        })?;
        return ReferenceTable::from_rows(rows);
    }

    parse_delimited(raw)
}

/// Parse a delimited export. The header is the first line naming `Day`, `L`,
/// `M` and `S`; title lines above it and other columns (SD bands, percentiles)
/// are ignored. Semicolon exports may use decimal commas.
pub fn parse_delimited(raw: &str) -> Result<ReferenceTable> {
    let mut lines = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let header = lines
        .by_ref()
        .find_map(|(_, line)| HeaderColumns::locate(line))
        .ok_or_else(|| {
            GrowthError::InvalidReferenceData("no header naming Day, L, M and S".to_string())
        })?;
    let delimiter = header.delimiter;

    let mut rows = Vec::new();
    for (index, line) in lines {
        let fields: Vec<&str> = line.split(delimiter).map(|f| f.trim().trim_matches('"')).collect();
        let field = |col: usize| {
            fields.get(col).copied().ok_or_else(|| {
                GrowthError::InvalidReferenceData(format!("line {}: too few columns", index + 1))
            })
        };
        let number = |col: usize| -> Result<f64> {
            let text = field(col)?;
            let normalized = if delimiter == ';' {
                text.replace(',', ".")
            } else {
                text.to_string()
            };
            normalized.parse::<f64>().map_err(|_| {
                GrowthError::InvalidReferenceData(format!(
                    "line {}: {text:?} is not a number",
                    index + 1
                ))
            })
        };

        let day_text = field(header.day)?;
        let day = day_text.parse::<u32>().map_err(|_| {
            GrowthError::InvalidReferenceData(format!(
                "line {}: {day_text:?} is not a day number",
                index + 1
            ))
        })?;

        rows.push(ReferenceRow {
            day,
            l: number(header.l)?,
            m: number(header.m)?,
            s: number(header.s)?,
        });
    }

    ReferenceTable::from_rows(rows)
}

struct HeaderColumns {
    delimiter: char,
    day: usize,
    l: usize,
    m: usize,
    s: usize,
}

impl HeaderColumns {
    fn locate(line: &str) -> Option<Self> {
        let delimiter = detect_delimiter(line);
        let columns: Vec<String> = line
            .trim_start_matches('\u{feff}')
            .split(delimiter)
            .map(|c| c.trim().trim_matches('"').to_lowercase())
            .collect();
        let position = |name: &str| columns.iter().position(|c| c == name);

        Some(Self {
            delimiter,
            day: position("day")?,
            l: position("l")?,
            m: position("m")?,
            s: position("s")?,
        })
    }
}

fn detect_delimiter(header: &str) -> char {
    if header.contains('\t') {
        '\t'
    } else if header.contains(';') {
        ';'
    } else {
        ','
    }
}
