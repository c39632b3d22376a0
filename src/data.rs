use std::borrow::Cow;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use csv::ByteRecord;
use log::{debug, info};
use thiserror::Error;

use crate::expenses::normalize::{parse_duration, parse_locale_number, parse_locale_number_or_zero};
use crate::expenses::record::{EventRecord, Measurements};

const PRIMARY_DELIMITER: u8 = b',';
const ALTERNATE_DELIMITER: u8 = b';';
pub const MIN_COLUMNS: usize = 5;

pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

const DATE_COLUMN: usize = 0;
const PRICE_COLUMN: usize = 3;
const COST_COLUMN: usize = 4;
const VOLUME_COLUMN: usize = 5;
const DISTANCE_COLUMN: usize = 6;
const DURATION_COLUMN: usize = 7;
const SPEED_COLUMN: usize = 8;
const EFFICIENCY_COLUMN: usize = 9;
const STATION_COLUMN: usize = 13;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed source file: {0}")]
    Csv(#[from] csv::Error),
    #[error("source file is empty")]
    Empty,
    #[error("expected at least {min} columns, found {found}")]
    TooFewColumns { found: usize, min: usize },
}

#[derive(Debug, PartialEq, Error)]
pub enum RowError {
    #[error("invalid date {0:?}")]
    InvalidDate(String),
}

/// A source row with its cells bound to names. Cells missing from ragged
/// rows are empty.
#[derive(Debug, Default, PartialEq)]
pub struct SourceRow {
    pub date: String,
    pub price_per_unit: String,
    pub cost: String,
    pub fuel_volume: String,
    pub distance: String,
    pub duration: String,
    pub speed: String,
    pub efficiency: String,
    pub station: String,
}

impl From<&ByteRecord> for SourceRow {
    fn from(record: &ByteRecord) -> Self {
        let cell = |index: usize| -> String {
            record
                .get(index)
                .map(String::from_utf8_lossy)
                .map(Cow::into_owned)
                .unwrap_or_default()
        };

        SourceRow {
            date: cell(DATE_COLUMN),
            price_per_unit: cell(PRICE_COLUMN),
            cost: cell(COST_COLUMN),
            fuel_volume: cell(VOLUME_COLUMN),
            distance: cell(DISTANCE_COLUMN),
            duration: cell(DURATION_COLUMN),
            speed: cell(SPEED_COLUMN),
            efficiency: cell(EFFICIENCY_COLUMN),
            station: cell(STATION_COLUMN).trim().to_string(),
        }
    }
}

impl TryFrom<SourceRow> for EventRecord {
    type Error = RowError;

    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(row.date.trim(), SOURCE_DATE_FORMAT)
            .map_err(|_| RowError::InvalidDate(row.date.clone()))?;

        let measurements = Measurements {
            distance: parse_locale_number_or_zero(&row.distance),
            fuel_volume: parse_locale_number_or_zero(&row.fuel_volume),
            cost: parse_locale_number_or_zero(&row.cost),
            duration_hours: parse_duration(&row.duration),
            speed_avg: parse_locale_number(&row.speed),
            efficiency: parse_locale_number(&row.efficiency),
            price_per_unit: parse_locale_number(&row.price_per_unit),
        };

        Ok(EventRecord::new(date, measurements, row.station))
    }
}

struct Table {
    width: usize,
    rows: Vec<ByteRecord>,
}

fn parse_table(bytes: &[u8], delimiter: u8) -> Result<Table, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let width = csv_reader.byte_headers()?.len();
    let rows = csv_reader.byte_records().collect::<Result<Vec<_>, _>>()?;

    Ok(Table { width, rows })
}

fn detect_table(bytes: &[u8]) -> Result<Table, LoadError> {
    match parse_table(bytes, PRIMARY_DELIMITER) {
        Ok(table) if table.width >= MIN_COLUMNS => {
            debug!("using ',' delimiter, {} columns", table.width);
            return Ok(table);
        },
        Ok(table) => debug!("',' delimiter gave {} columns, retrying with ';'", table.width),
        Err(err) => debug!("',' delimiter failed, retrying with ';', err={}", err),
    }

    let table = parse_table(bytes, ALTERNATE_DELIMITER)?;
    if table.width < MIN_COLUMNS {
        return Err(LoadError::TooFewColumns {
            found: table.width,
            min: MIN_COLUMNS,
        });
    }

    debug!("using ';' delimiter, {} columns", table.width);
    Ok(table)
}

/// Parses an expense log held in memory. The header row is skipped, rows
/// without a valid date are dropped, and the result is sorted by date with
/// ties kept in file order.
pub fn parse_events(bytes: &[u8]) -> Result<Vec<EventRecord>, LoadError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::Empty);
    }

    let table = detect_table(bytes)?;

    let mut events = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;
    for record in &table.rows {
        match EventRecord::try_from(SourceRow::from(record)) {
            Ok(event) => events.push(event),
            Err(err) => {
                dropped += 1;
                debug!("skipping row, err={}", err);
            },
        }
    }

    events.sort_by_key(|event| event.date());

    info!("loaded {} events, dropped {} rows without a valid date", events.len(), dropped);

    Ok(events)
}

pub fn load_events(file_path: &Path) -> Result<Vec<EventRecord>, LoadError> {
    let bytes = fs::read(file_path)?;
    parse_events(&bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "Data;Hodometro;Combustivel;Preco;Custo;Litros;Distancia;Tempo;Velocidade;Consumo;A;B;C;Posto";

    #[test]
    fn test_semicolon_delimited_file() -> Result<()> {
        let content = format!(
            "{}\n05/01/2024;1000;Gasolina;R$ 5,89;R$ 250,00;42,45;512,3;8:30;60,2;12,07;;;;Posto Shell\n",
            HEADER
        );

        let events = parse_events(content.as_bytes())?;

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(event.price_per_unit(), Some(dec!(5.89)));
        assert_eq!(event.cost(), dec!(250));
        assert_eq!(event.fuel_volume(), dec!(42.45));
        assert_eq!(event.distance(), dec!(512.3));
        assert_eq!(event.duration_hours(), dec!(8.5));
        assert_eq!(event.speed_avg(), Some(dec!(60.2)));
        assert_eq!(event.efficiency(), Some(dec!(12.07)));
        assert_eq!(event.station(), "Posto Shell");

        Ok(())
    }

    #[test]
    fn test_comma_delimited_file_without_station() -> Result<()> {
        let content = "date,odo,fuel,price,cost,litres,km,time,speed,eff\n\
                       02/03/2024,1,x,5.89,\"1.250,00\",40,300,5:00,55,11.5\n";

        let events = parse_events(content.as_bytes())?;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cost(), dec!(1250));
        assert_eq!(events[0].price_per_unit(), Some(dec!(5.89)));
        assert_eq!(events[0].station(), "");

        Ok(())
    }

    #[test]
    fn test_invalid_dates_are_dropped() -> Result<()> {
        let content = format!(
            "{}\n\
             not a date;;;;10;;100;;;\n\
             31/02/2024;;;;10;;100;;;\n\
             ;;;;10;;100;;;\n\
             01/02/2024;;;;10;;100;;;\n",
            HEADER
        );

        let events = parse_events(content.as_bytes())?;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());

        Ok(())
    }

    #[test]
    fn test_malformed_cells_fall_back() -> Result<()> {
        let content = format!("{}\n10/10/2024;;;abc;R$ ???;;-4;ninety;;0\n", HEADER);

        let events = parse_events(content.as_bytes())?;

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.cost(), Decimal::ZERO);
        assert_eq!(event.distance(), Decimal::ZERO);
        assert_eq!(event.duration_hours(), Decimal::ZERO);
        assert_eq!(event.price_per_unit(), None);
        assert_eq!(event.efficiency(), None);

        Ok(())
    }

    #[test]
    fn test_sorted_by_date_keeping_file_order() -> Result<()> {
        let content = format!(
            "{}\n\
             15/03/2024;;;;1;;;;;;;;;C\n\
             01/01/2024;;;;1;;;;;;;;;A\n\
             15/03/2024;;;;1;;;;;;;;;D\n\
             01/01/2024;;;;1;;;;;;;;;B\n",
            HEADER
        );

        let stations: Vec<String> = parse_events(content.as_bytes())?
            .iter()
            .map(|event| event.station().clone())
            .collect();

        assert_eq!(stations, vec!["A", "B", "C", "D"]);

        Ok(())
    }

    #[test]
    fn test_latin1_cells_do_not_abort() -> Result<()> {
        let mut content = format!("{}\n01/05/2024;;;;10;;100;;;;;;;", HEADER).into_bytes();
        content.extend_from_slice(b"Posto S\xe3o Jo\xe3o\n");

        let events = parse_events(&content)?;

        assert_eq!(events.len(), 1);
        assert!(events[0].station().starts_with("Posto S"));

        Ok(())
    }

    #[test]
    fn test_too_few_columns() {
        match parse_events(b"a,b\n1,2\n") {
            Err(LoadError::TooFewColumns { found, min }) => {
                assert_eq!(found, 1);
                assert_eq!(min, MIN_COLUMNS);
            },
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse_events(b"  \n"), Err(LoadError::Empty)));
    }

    #[test]
    fn test_load_from_disk() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "{}", HEADER)?;
        writeln!(file, "20/06/2023;;;;R$ 80,00;;200;;;")?;

        let events = load_events(file.path())?;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].cost_per_distance(), dec!(0.4));

        Ok(())
    }

    #[test]
    fn test_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        if let Err(err) = load_events(&dir.path().join("missing.csv")) {
            assert!(matches!(err, LoadError::Io(_)));
        } else {
            bail!("loading a missing file should fail");
        }

        Ok(())
    }
}
