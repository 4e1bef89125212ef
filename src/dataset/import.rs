//! CSV import for country-year records.
//!
//! The importer accepts both the cleaned dashboard export
//! (`life_expectancy_clean.csv`, `life_expectancy_advanced.csv`) and the raw
//! World Bank column names, resolving headers case-insensitively with aliases.
//!
//! A bad cell never aborts the load: empty cells become `None`, unparseable
//! numeric cells become `None` and are counted as malformed, and rows missing
//! an identifying field are skipped and counted. Records with the wrong field
//! count or invalid UTF-8 are skipped the same way; only I/O errors abort.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lifedash::dataset::{CsvImporter, CsvSchema};
//!
//! let schema = CsvSchema::builder()
//!     .life_column("Life Expectancy World Bank")
//!     .income_column("IncomeGroup")
//!     .build();
//!
//! let (dataset, report) = CsvImporter::new(schema).import("life expectancy.csv")?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::derive::fill_rolling_average;
use super::{Dataset, IncomeGroup, Record};
use crate::error::{Error, Result};

/// Schema for CSV import.
///
/// Unset columns fall back to the built-in aliases.
#[derive(Debug, Clone, Default)]
pub struct CsvSchema {
    /// Column name for the country name.
    pub country_column: Option<String>,
    /// Column name for the country code.
    pub code_column: Option<String>,
    /// Column name for the income group.
    pub income_column: Option<String>,
    /// Column name for the region.
    pub region_column: Option<String>,
    /// Column name for the year.
    pub year_column: Option<String>,
    /// Column name for life expectancy.
    pub life_column: Option<String>,
    /// Column name for CO₂ emissions.
    pub co2_column: Option<String>,
}

impl CsvSchema {
    /// Create a schema builder.
    #[must_use]
    pub fn builder() -> CsvSchemaBuilder {
        CsvSchemaBuilder::default()
    }

    /// Create a schema that auto-detects columns from common names.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::default()
    }

    /// Try to find a column index by name (case-insensitive, with aliases).
    fn find_column(headers: &[&str], primary: Option<&str>, aliases: &[&str]) -> Option<usize> {
        primary
            .into_iter()
            .chain(aliases.iter().copied())
            .find_map(|name| find_header_index(headers, name))
    }
}

/// Builder for CSV schema.
#[derive(Debug, Default)]
pub struct CsvSchemaBuilder {
    schema: CsvSchema,
}

impl CsvSchemaBuilder {
    /// Set the country name column.
    #[must_use]
    pub fn country_column(mut self, name: impl Into<String>) -> Self {
        self.schema.country_column = Some(name.into());
        self
    }

    /// Set the country code column.
    #[must_use]
    pub fn code_column(mut self, name: impl Into<String>) -> Self {
        self.schema.code_column = Some(name.into());
        self
    }

    /// Set the income group column.
    #[must_use]
    pub fn income_column(mut self, name: impl Into<String>) -> Self {
        self.schema.income_column = Some(name.into());
        self
    }

    /// Set the region column.
    #[must_use]
    pub fn region_column(mut self, name: impl Into<String>) -> Self {
        self.schema.region_column = Some(name.into());
        self
    }

    /// Set the year column.
    #[must_use]
    pub fn year_column(mut self, name: impl Into<String>) -> Self {
        self.schema.year_column = Some(name.into());
        self
    }

    /// Set the life expectancy column.
    #[must_use]
    pub fn life_column(mut self, name: impl Into<String>) -> Self {
        self.schema.life_column = Some(name.into());
        self
    }

    /// Set the CO₂ column.
    #[must_use]
    pub fn co2_column(mut self, name: impl Into<String>) -> Self {
        self.schema.co2_column = Some(name.into());
        self
    }

    /// Build the schema.
    #[must_use]
    pub fn build(self) -> CsvSchema {
        self.schema
    }
}

/// What happened during an import, beyond the records themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Data rows read from the file.
    pub rows_read: usize,
    /// Rows kept as records.
    pub rows_kept: usize,
    /// Rows dropped for a missing or unparseable identifying field.
    pub skipped_rows: usize,
    /// Non-empty numeric cells that failed to parse and were nulled.
    pub malformed_cells: usize,
    /// Whether the five-year average was derived rather than read.
    pub derived_rolling_average: bool,
}

/// Resolved column positions for one file.
struct Columns {
    country: Option<usize>,
    code: usize,
    income: usize,
    region: usize,
    year: usize,
    life: Option<usize>,
    co2: Option<usize>,
    corruption: Option<usize>,
    sanitation: Option<usize>,
    education: Option<usize>,
    undernourishment: Option<usize>,
    health: Option<usize>,
    unemployment: Option<usize>,
    rolling: Option<usize>,
    interpolated: Option<usize>,
}

impl Columns {
    fn resolve(schema: &CsvSchema, headers: &[&str]) -> Result<Self> {
        let find = |primary: &Option<String>, aliases: &[&str]| {
            CsvSchema::find_column(headers, primary.as_deref(), aliases)
        };
        let none = None;

        Ok(Self {
            country: find(&schema.country_column, &["country", "country name", "country_name"]),
            code: find(
                &schema.code_column,
                &["country_code", "country code", "code", "iso3", "iso_a3"],
            )
            .ok_or(Error::MissingColumn("country_code"))?,
            income: find(
                &schema.income_column,
                &["income_group", "incomegroup", "income group", "income"],
            )
            .ok_or(Error::MissingColumn("income_group"))?,
            region: find(&schema.region_column, &["region"]).ok_or(Error::MissingColumn("region"))?,
            year: find(&schema.year_column, &["year"]).ok_or(Error::MissingColumn("year"))?,
            life: find(
                &schema.life_column,
                &["life_expectancy", "life expectancy world bank", "life expectancy", "life"],
            ),
            co2: find(&schema.co2_column, &["co2", "co2_emissions"]),
            corruption: find(&none, &["corruption"]),
            sanitation: find(&none, &["sanitation"]),
            education: find(&none, &["education_exp_pct", "education expenditure %"]),
            undernourishment: find(
                &none,
                &[
                    "undernourishment",
                    "prevelance of undernourishment",
                    "prevalence of undernourishment",
                ],
            ),
            health: find(&none, &["health_exp_pct", "health expenditure %"]),
            unemployment: find(&none, &["unemployment"]),
            rolling: find(&none, &["life_expectancy_5yr_avg"]),
            interpolated: find(&none, &["interpolated", "life_expectancy_was_interpolated"]),
        })
    }
}

/// CSV importer producing a [`Dataset`].
pub struct CsvImporter {
    schema: CsvSchema,
    rolling_window: usize,
}

impl CsvImporter {
    /// Create a new importer with the given schema.
    #[must_use]
    pub fn new(schema: CsvSchema) -> Self {
        Self {
            schema,
            rolling_window: 5,
        }
    }

    /// Create an importer that auto-detects columns.
    #[must_use]
    pub fn auto_detect() -> Self {
        Self::new(CsvSchema::auto_detect())
    }

    /// Window used when the five-year average has to be derived.
    #[must_use]
    pub fn rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window.max(1);
        self
    }

    /// Import records from a CSV file.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<(Dataset, ImportReport)> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let (dataset, report) = self.import_reader(reader)?;
        info!(
            path = %path.display(),
            rows = report.rows_kept,
            skipped = report.skipped_rows,
            malformed = report.malformed_cells,
            "dataset loaded"
        );
        Ok((dataset, report))
    }

    /// Import records from any CSV reader.
    pub fn import_reader<R: std::io::Read>(
        &self,
        mut reader: csv::Reader<R>,
    ) -> Result<(Dataset, ImportReport)> {
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let columns = Columns::resolve(&self.schema, &header_refs)?;

        let mut report = ImportReport::default();
        let mut records = Vec::new();

        for (line_num, row) in reader.records().enumerate() {
            let line = line_num + 2; // +2 for 1-based and header
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => {
                    return Err(Error::CsvImport {
                        line,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(line, error = %e, "skipping unreadable row");
                    report.rows_read += 1;
                    report.skipped_rows += 1;
                    continue;
                }
            };
            report.rows_read += 1;

            match parse_row(&row, &columns, &mut report.malformed_cells) {
                Some(record) => records.push(record),
                None => {
                    debug!(line, "skipping row without identifying fields");
                    report.skipped_rows += 1;
                }
            }
        }

        if report.skipped_rows > 0 {
            warn!(skipped = report.skipped_rows, "rows dropped during import");
        }

        if columns.rolling.is_none() {
            fill_rolling_average(&mut records, self.rolling_window);
            report.derived_rolling_average = true;
        }

        report.rows_kept = records.len();
        Ok((Dataset::new(records), report))
    }
}

fn parse_row(row: &csv::StringRecord, columns: &Columns, malformed: &mut usize) -> Option<Record> {
    let text = |idx: usize| row.get(idx).map(str::trim).filter(|s| !s.is_empty());

    let code = text(columns.code)?;
    let income_group = IncomeGroup::from_str_loose(text(columns.income)?)?;
    let region = text(columns.region)?;
    let year = parse_year(text(columns.year)?)?;
    let country = columns.country.and_then(text).unwrap_or(code);

    let mut number = |idx: Option<usize>| -> Option<f64> {
        let raw = idx.and_then(text)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                *malformed += 1;
                None
            }
        }
    };

    let mut record = Record::new(country, code, income_group, region, year);
    record.life_expectancy = number(columns.life);
    record.co2 = number(columns.co2);
    record.corruption = number(columns.corruption);
    record.sanitation = number(columns.sanitation);
    record.education_exp_pct = number(columns.education);
    record.undernourishment = number(columns.undernourishment);
    record.health_exp_pct = number(columns.health);
    record.unemployment = number(columns.unemployment);
    record.life_expectancy_5yr_avg = number(columns.rolling);
    record.interpolated = columns
        .interpolated
        .and_then(text)
        .map_or(false, parse_flag);

    Some(record)
}

/// Parse a year cell, accepting integral floats such as `2001.0`.
fn parse_year(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|y| y.is_finite() && y.fract() == 0.0)
            .map(|y| y as i32)
    })
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes" | "t")
}

/// Find a header index by name (case-insensitive).
fn find_header_index(headers: &[&str], name: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();
    headers.iter().position(|h| h.trim().to_lowercase() == name_lower)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_schema_builder() {
        let schema = CsvSchema::builder()
            .code_column("iso")
            .life_column("le")
            .build();

        assert_eq!(schema.code_column, Some("iso".to_string()));
        assert_eq!(schema.life_column, Some("le".to_string()));
        assert_eq!(schema.region_column, None);
    }

    #[test]
    fn test_find_header_index() {
        let headers = ["Country Name", "Region", "Year"];
        assert_eq!(find_header_index(&headers, "country name"), Some(0));
        assert_eq!(find_header_index(&headers, "YEAR"), Some(2));
        assert_eq!(find_header_index(&headers, "unknown"), None);
    }

    #[test]
    fn test_import_normalizes_missing_and_malformed() {
        let file = write_csv(
            "country,country_code,region,income_group,year,life_expectancy,co2,corruption,life_expectancy_5yr_avg,life_expectancy_was_interpolated\n\
             Chad,TCD,Sub-Saharan Africa,Low income,2001,50.5,,abc,50.5,False\n\
             Chad,TCD,Sub-Saharan Africa,Low income,2002,51.0,120,2.5,50.75,True\n\
             Nowhere,,Sub-Saharan Africa,Low income,2002,51.0,120,2.5,50.75,True\n",
        );

        let (dataset, report) = CsvImporter::auto_detect().import(file.path()).unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_kept, 2);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.malformed_cells, 1);
        assert!(!report.derived_rolling_average);

        let first = &dataset.records()[0];
        assert_eq!(first.year, 2001);
        assert_eq!(first.co2, None);
        assert_eq!(first.corruption, None);
        assert!(!first.interpolated);

        let second = &dataset.records()[1];
        assert_eq!(second.co2, Some(120.0));
        assert!(second.interpolated);
    }

    #[test]
    fn test_import_skips_ragged_rows() {
        let file = write_csv(
            "country,country_code,region,income_group,year,life_expectancy\n\
             Chad,TCD,Sub-Saharan Africa,Low income,2001,50.5\n\
             Chad,TCD,Sub-Saharan Africa,Low income\n\
             Chad,TCD,Sub-Saharan Africa,Low income,2003,51.5,extra\n\
             Chad,TCD,Sub-Saharan Africa,Low income,2004,52.0\n",
        );

        let (dataset, report) = CsvImporter::auto_detect().import(file.path()).unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_kept, 3);
        assert_eq!(report.skipped_rows, 1);
        let years: Vec<i32> = dataset.records().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2001, 2003, 2004]);
    }

    #[test]
    fn test_import_reader_skips_invalid_utf8() {
        let mut bytes = b"country_code,region,income_group,year\n".to_vec();
        bytes.extend_from_slice(b"TCD,Sub-Saharan Africa,Low income,2001\n");
        bytes.extend_from_slice(b"TCD,\xff\xfe,Low income,2002\n");
        bytes.extend_from_slice(b"TCD,Sub-Saharan Africa,Low income,2003\n");
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes.as_slice());

        let (dataset, report) = CsvImporter::auto_detect().import_reader(reader).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(report.skipped_rows, 1);
    }

    #[test]
    fn test_import_raw_world_bank_headers() {
        let file = write_csv(
            "Country Name,Country Code,Region,IncomeGroup,Year,Life Expectancy World Bank,CO2\n\
             Norway,NOR,Europe & Central Asia,High income,2001,79.0,40000\n\
             Norway,NOR,Europe & Central Asia,High income,2002,81.0,41000\n",
        );

        let (dataset, report) = CsvImporter::auto_detect().import(file.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(report.derived_rolling_average);
        assert_eq!(dataset.records()[0].income_group, IncomeGroup::High);
        assert_eq!(dataset.records()[1].life_expectancy_5yr_avg, Some(80.0));
    }

    #[test]
    fn test_import_missing_required_column() {
        let file = write_csv("country,year\nChad,2001\n");
        let err = CsvImporter::auto_detect().import(file.path()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn("country_code")));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2001"), Some(2001));
        assert_eq!(parse_year("2001.0"), Some(2001));
        assert_eq!(parse_year("2001.5"), None);
        assert_eq!(parse_year("soon"), None);
    }
}
