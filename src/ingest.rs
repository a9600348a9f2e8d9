//! Normalization of a raw generation-by-source table into annual series.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Columns that describe the row rather than a generation source.
const NON_SOURCE_COLUMNS: &[&str] = &["Entity", "Code", "date", "year", "Year"];

/// Errors raised while reading a historical dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("no `year`, `Year` or `date` column in header")]
    MissingYearColumn,
    #[error("dataset contains no rows with a usable year")]
    NoRows,
}

/// Historical generation by source, one row per year.
///
/// `years` is sorted and unique; every column in `sources` has one cell per
/// year, `None` where no numeric observation exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoricalMix {
    pub years: Vec<i32>,
    pub sources: Vec<SourceSeries>,
}

/// One generation source's annual observations, aligned with
/// [`HistoricalMix::years`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl HistoricalMix {
    /// Builds a table from `(year, value)` pairs per source.
    ///
    /// Years absent from a source's pairs are left missing. Duplicate years
    /// within a source are summed.
    pub fn from_series<S: Into<String>>(series: Vec<(S, Vec<(i32, f64)>)>) -> Self {
        let mut by_year: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
        let n = series.len();
        let mut names = Vec::with_capacity(n);
        for (idx, (name, points)) in series.into_iter().enumerate() {
            names.push(name.into());
            for (year, value) in points {
                let row = by_year.entry(year).or_insert_with(|| vec![None; n]);
                row[idx] = Some(row[idx].unwrap_or(0.0) + value);
            }
        }
        Self::from_rows(names, by_year)
    }

    fn from_rows(names: Vec<String>, by_year: BTreeMap<i32, Vec<Option<f64>>>) -> Self {
        let years: Vec<i32> = by_year.keys().copied().collect();
        let sources = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| SourceSeries {
                name,
                values: by_year.values().map(|row| row[idx]).collect(),
            })
            .collect();
        Self { years, sources }
    }

    /// Whether the table has no years.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Latest historical year, if any.
    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Looks up a source column by name.
    pub fn source(&self, name: &str) -> Option<&SourceSeries> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Parses a whole-number `year` cell; `2015.0` is accepted, `2015.7` is not.
fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(y) = cell.parse::<i32>() {
        return Some(y);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|y| y.is_finite() && y.fract() == 0.0)
        .filter(|y| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(y))
        .map(|y| y as i32)
}

/// Takes the year from the leading four digits of a `date` cell.
fn parse_date_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    let digits: String = cell.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() == 4 { digits.parse().ok() } else { None }
}

fn parse_value(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a historical table from CSV.
///
/// The year comes from a `year` or `Year` column, or failing that from a
/// `date` column. `Entity`, `Code` and `date` are never sources; every other
/// column is. Non-numeric cells are treated as missing, rows without a
/// usable year are dropped and duplicate years are summed per source.
///
/// # Errors
///
/// Returns an [`IngestError`] if the CSV is malformed, has no year column,
/// or has no usable rows.
pub fn read_history_csv(reader: impl Read) -> Result<HistoricalMix, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let (year_idx, from_date) = match headers.iter().position(|h| h == "year" || h == "Year") {
        Some(i) => (i, false),
        None => {
            let i = headers
                .iter()
                .position(|h| h == "date")
                .ok_or(IngestError::MissingYearColumn)?;
            (i, true)
        }
    };

    let source_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !NON_SOURCE_COLUMNS.contains(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let n = source_cols.len();
    let mut by_year: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    let mut dropped = 0_usize;
    for record in rdr.records() {
        let record = record?;
        let cell = record.get(year_idx).unwrap_or_default();
        let year = if from_date {
            parse_date_year(cell)
        } else {
            parse_year(cell)
        };
        let Some(year) = year else {
            dropped += 1;
            continue;
        };
        let row = by_year.entry(year).or_insert_with(|| vec![None; n]);
        for (slot, (col, _)) in row.iter_mut().zip(&source_cols) {
            if let Some(v) = record.get(*col).and_then(parse_value) {
                *slot = Some(slot.unwrap_or(0.0) + v);
            }
        }
    }

    if by_year.is_empty() {
        return Err(IngestError::NoRows);
    }
    if dropped > 0 {
        debug!(dropped, "dropped rows without a usable year");
    }

    let names = source_cols.into_iter().map(|(_, name)| name).collect();
    let mix = HistoricalMix::from_rows(names, by_year);
    info!(
        years = mix.years.len(),
        sources = mix.sources.len(),
        "ingested historical generation"
    );
    Ok(mix)
}

/// Reads a historical table from a CSV file on disk.
///
/// # Errors
///
/// Returns an [`IngestError`] if the file cannot be opened or parsed.
pub fn read_history_file(path: &Path) -> Result<HistoricalMix, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_history_csv(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWID_SAMPLE: &str = "\
Entity,Code,Year,Coal,Gas,Solar
Bangladesh,BGD,2001,0.5,14.2,
Bangladesh,BGD,2000,0.4,13.1,0.0
Bangladesh,BGD,2002,0.6,n/a,0.01
";

    #[test]
    fn reads_owid_layout_and_sorts_years() {
        let mix = read_history_csv(OWID_SAMPLE.as_bytes()).expect("sample should parse");
        assert_eq!(mix.years, vec![2000, 2001, 2002]);
        let names: Vec<&str> = mix.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Coal", "Gas", "Solar"]);
    }

    #[test]
    fn non_numeric_cells_become_missing() {
        let mix = read_history_csv(OWID_SAMPLE.as_bytes()).expect("sample should parse");
        let gas = mix.source("Gas").expect("gas column");
        assert_eq!(gas.values, vec![Some(13.1), Some(14.2), None]);
        let solar = mix.source("Solar").expect("solar column");
        assert_eq!(solar.values, vec![Some(0.0), None, Some(0.01)]);
    }

    #[test]
    fn duplicate_years_are_summed() {
        let csv = "year,Hydro\n2010,1.0\n2010,2.5\n2011,4.0\n";
        let mix = read_history_csv(csv.as_bytes()).expect("should parse");
        assert_eq!(mix.years, vec![2010, 2011]);
        assert_eq!(mix.sources[0].values, vec![Some(3.5), Some(4.0)]);
    }

    #[test]
    fn date_column_is_used_when_year_missing() {
        let csv = "date,Wind\n2015-01-01,1.0\n2016-01-01,2.0\nbogus,3.0\n";
        let mix = read_history_csv(csv.as_bytes()).expect("should parse");
        assert_eq!(mix.years, vec![2015, 2016]);
        assert_eq!(mix.sources.len(), 1);
    }

    #[test]
    fn fractional_year_cells_are_dropped() {
        let csv = "year,Coal\n2014,1.0\n2015.7,2.0\n2016.0,3.0\n2017-01-01,4.0\n";
        let mix = read_history_csv(csv.as_bytes()).expect("should parse");
        assert_eq!(mix.years, vec![2014, 2016]);
        assert_eq!(mix.sources[0].values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn missing_year_column_is_an_error() {
        let csv = "Entity,Coal\nX,1.0\n";
        let err = read_history_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingYearColumn));
    }

    #[test]
    fn no_usable_rows_is_an_error() {
        let csv = "year,Coal\nabc,1.0\n";
        let err = read_history_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::NoRows));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_history_file(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.csv"));
    }

    #[test]
    fn from_series_aligns_sources_on_year() {
        let mix = HistoricalMix::from_series(vec![
            ("Coal", vec![(2001, 2.0), (2000, 1.0)]),
            ("Gas", vec![(2001, 5.0)]),
        ]);
        assert_eq!(mix.years, vec![2000, 2001]);
        assert_eq!(mix.sources[1].values, vec![None, Some(5.0)]);
        assert_eq!(mix.last_year(), Some(2001));
    }
}
