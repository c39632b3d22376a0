use chrono::{Datelike, NaiveDate};
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;

pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// English month names as produced by `%B`, mapped to the report's
/// Portuguese display names.
const MONTH_NAMES: [(&str, &str); 12] = [
    ("January", "Janeiro"),
    ("February", "Fevereiro"),
    ("March", "Março"),
    ("April", "Abril"),
    ("May", "Maio"),
    ("June", "Junho"),
    ("July", "Julho"),
    ("August", "Agosto"),
    ("September", "Setembro"),
    ("October", "Outubro"),
    ("November", "Novembro"),
    ("December", "Dezembro"),
];

/// Translates an English month name. Unknown names pass through unchanged.
pub fn translate_month_name(name: &str) -> &str {
    MONTH_NAMES
        .iter()
        .find(|(english, _)| *english == name)
        .map(|(_, local)| *local)
        .unwrap_or(name)
}

/// One cleaned fuel or expense event.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct EventRecord {
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get_copy = "pub")]
    distance: Decimal,
    #[getset(get_copy = "pub")]
    fuel_volume: Decimal,
    #[getset(get_copy = "pub")]
    cost: Decimal,
    #[getset(get_copy = "pub")]
    duration_hours: Decimal,
    #[getset(get_copy = "pub")]
    speed_avg: Option<Decimal>,
    #[getset(get_copy = "pub")]
    efficiency: Option<Decimal>,
    #[getset(get_copy = "pub")]
    price_per_unit: Option<Decimal>,
    #[getset(get = "pub")]
    station: String,
}

#[derive(Debug, Default, Clone)]
pub struct Measurements {
    pub distance: Decimal,
    pub fuel_volume: Decimal,
    pub cost: Decimal,
    pub duration_hours: Decimal,
    pub speed_avg: Option<Decimal>,
    pub efficiency: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
}

impl EventRecord {
    pub fn new(date: NaiveDate, measurements: Measurements, station: impl Into<String>) -> EventRecord {
        let Measurements {
            distance,
            fuel_volume,
            cost,
            duration_hours,
            speed_avg,
            efficiency,
            price_per_unit,
        } = measurements;

        // Summed quantities never go below zero, averaged ones are either
        // positive or absent.
        let positive = |value: Option<Decimal>| value.filter(|v| *v > Decimal::ZERO);

        EventRecord {
            date,
            distance: distance.max(Decimal::ZERO),
            fuel_volume: fuel_volume.max(Decimal::ZERO),
            cost: cost.max(Decimal::ZERO),
            duration_hours: duration_hours.max(Decimal::ZERO),
            speed_avg: positive(speed_avg),
            efficiency: positive(efficiency),
            price_per_unit: positive(price_per_unit),
            station: station.into(),
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn month_name(&self) -> String {
        let english = self.date.format("%B").to_string();
        translate_month_name(&english).to_string()
    }

    pub fn day_label(&self) -> String {
        self.date.format(DISPLAY_DATE_FORMAT).to_string()
    }

    pub fn cost_per_distance(&self) -> Decimal {
        ratio_or_zero(self.cost, self.distance)
    }
}

/// Zero when the denominator is not positive or the quotient does not fit
/// in a `Decimal`.
pub(crate) fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}
