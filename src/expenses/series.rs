use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::mean;
use super::record::EventRecord;

/// One point of the monthly time-series charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySeriesRow {
    pub year: i32,
    pub month: u32,
    pub month_label: String,
    /// First day of the month, used as the chart's x value.
    pub period: NaiveDate,
    pub avg_speed: Option<Decimal>,
    pub avg_efficiency: Option<Decimal>,
    pub avg_price_per_unit: Option<Decimal>,
}

#[derive(Default)]
struct MonthSamples {
    label: String,
    speeds: Vec<Decimal>,
    efficiencies: Vec<Decimal>,
    prices: Vec<Decimal>,
}

/// Per-month means of speed, efficiency and unit price, in chronological
/// order. Built straight from the records, independent of the drill-down
/// tree. Months without any defined value are left out.
pub fn build_monthly_series(records: &[EventRecord]) -> Vec<MonthlySeriesRow> {
    let mut months: BTreeMap<NaiveDate, MonthSamples> = BTreeMap::new();

    for record in records {
        let Some(period) = NaiveDate::from_ymd_opt(record.year(), record.month(), 1) else {
            continue;
        };

        let samples = months.entry(period).or_insert_with(|| MonthSamples {
            label: record.month_name(),
            ..Default::default()
        });
        samples.speeds.extend(record.speed_avg());
        samples.efficiencies.extend(record.efficiency());
        samples.prices.extend(record.price_per_unit());
    }

    months
        .into_iter()
        .map(|(period, samples)| MonthlySeriesRow {
            year: period.year(),
            month: period.month(),
            month_label: samples.label,
            period,
            avg_speed: mean(samples.speeds),
            avg_efficiency: mean(samples.efficiencies),
            avg_price_per_unit: mean(samples.prices),
        })
        .filter(|row| row.avg_speed.is_some() || row.avg_efficiency.is_some() || row.avg_price_per_unit.is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::expenses::record::Measurements;

    fn event(y: i32, m: u32, d: u32, speed: Option<Decimal>, price: Option<Decimal>) -> Result<EventRecord> {
        let date = NaiveDate::from_ymd_opt(y, m, d).context("date")?;
        Ok(EventRecord::new(
            date,
            Measurements {
                speed_avg: speed,
                price_per_unit: price,
                ..Default::default()
            },
            "",
        ))
    }

    #[test]
    fn test_series_means_skip_undefined() -> Result<()> {
        let records = vec![
            event(2024, 1, 3, Some(dec!(40)), Some(dec!(5.80)))?,
            event(2024, 1, 20, None, Some(dec!(6.00)))?,
            event(2024, 1, 28, Some(dec!(60)), None)?,
        ];

        let series = build_monthly_series(&records);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].month_label, "Janeiro");
        assert_eq!(series[0].avg_speed, Some(dec!(50)));
        assert_eq!(series[0].avg_price_per_unit, Some(dec!(5.90)));
        assert_eq!(series[0].avg_efficiency, None);

        Ok(())
    }

    #[test]
    fn test_series_is_chronological() -> Result<()> {
        let records = vec![
            event(2024, 2, 1, Some(dec!(30)), None)?,
            event(2023, 12, 1, Some(dec!(30)), None)?,
            event(2024, 1, 1, Some(dec!(30)), None)?,
        ];

        let periods: Vec<String> = build_monthly_series(&records)
            .iter()
            .map(|row| row.period.to_string())
            .collect();

        assert_eq!(periods, vec!["2023-12-01", "2024-01-01", "2024-02-01"]);

        Ok(())
    }

    #[test]
    fn test_series_skips_months_without_rates() -> Result<()> {
        let records = vec![
            event(2024, 3, 1, None, None)?,
            event(2024, 4, 1, None, Some(dec!(6.10)))?,
        ];

        let series = build_monthly_series(&records);

        assert_eq!(series.len(), 1);
        assert_eq!((series[0].year, series[0].month), (2024, 4));

        Ok(())
    }
}
