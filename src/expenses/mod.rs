use rust_decimal::Decimal;
use serde::Serialize;

pub mod hierarchy;
pub mod normalize;
pub mod record;
pub mod series;


use record::{ratio_or_zero, EventRecord};

/// Anything that can be rolled up into a parent level: a single event or an
/// already aggregated node.
pub trait Measured {
    fn distance(&self) -> Decimal;
    fn fuel_volume(&self) -> Decimal;
    fn cost(&self) -> Decimal;
    fn hours(&self) -> Decimal;
    fn speed(&self) -> Option<Decimal>;
    fn efficiency(&self) -> Option<Decimal>;
    fn event_count(&self) -> usize;
}

impl Measured for EventRecord {
    fn distance(&self) -> Decimal {
        EventRecord::distance(self)
    }

    fn fuel_volume(&self) -> Decimal {
        EventRecord::fuel_volume(self)
    }

    fn cost(&self) -> Decimal {
        EventRecord::cost(self)
    }

    fn hours(&self) -> Decimal {
        self.duration_hours()
    }

    fn speed(&self) -> Option<Decimal> {
        self.speed_avg()
    }

    fn efficiency(&self) -> Option<Decimal> {
        EventRecord::efficiency(self)
    }

    fn event_count(&self) -> usize {
        1
    }
}

/// Aggregated metrics shared by every node level.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_distance: Decimal,
    pub total_fuel_volume: Decimal,
    pub total_cost: Decimal,
    pub total_hours: Decimal,
    pub avg_speed: Option<Decimal>,
    pub avg_efficiency: Option<Decimal>,
    pub cost_per_distance: Decimal,
    pub event_count: usize,
}

impl Totals {
    /// Sums the additive fields and averages the optional ones over the
    /// children that define them. Sums saturate at `Decimal::MAX`.
    pub fn rollup<'a, M, I>(children: I) -> Totals
    where
        M: Measured + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        let mut totals = Totals::default();
        let mut speeds = Vec::new();
        let mut efficiencies = Vec::new();

        for child in children {
            totals.total_distance = totals.total_distance.saturating_add(child.distance());
            totals.total_fuel_volume = totals.total_fuel_volume.saturating_add(child.fuel_volume());
            totals.total_cost = totals.total_cost.saturating_add(child.cost());
            totals.total_hours = totals.total_hours.saturating_add(child.hours());
            totals.event_count += child.event_count();
            speeds.extend(child.speed());
            efficiencies.extend(child.efficiency());
        }

        totals.avg_speed = mean(speeds);
        totals.avg_efficiency = mean(efficiencies);
        totals.cost_per_distance = ratio_or_zero(totals.total_cost, totals.total_distance);

        totals
    }

    /// Totals of a single event, values carried verbatim.
    pub fn of_event(record: &EventRecord) -> Totals {
        Totals {
            total_distance: record.distance(),
            total_fuel_volume: record.fuel_volume(),
            total_cost: record.cost(),
            total_hours: record.duration_hours(),
            avg_speed: record.speed_avg(),
            avg_efficiency: record.efficiency(),
            cost_per_distance: record.cost_per_distance(),
            event_count: 1,
        }
    }
}

impl Measured for Totals {
    fn distance(&self) -> Decimal {
        self.total_distance
    }

    fn fuel_volume(&self) -> Decimal {
        self.total_fuel_volume
    }

    fn cost(&self) -> Decimal {
        self.total_cost
    }

    fn hours(&self) -> Decimal {
        self.total_hours
    }

    fn speed(&self) -> Option<Decimal> {
        self.avg_speed
    }

    fn efficiency(&self) -> Option<Decimal> {
        self.avg_efficiency
    }

    fn event_count(&self) -> usize {
        self.event_count
    }
}

/// Arithmetic mean, `None` when there is nothing to average or the sum
/// leaves the `Decimal` range.
pub fn mean<I: IntoIterator<Item = Decimal>>(values: I) -> Option<Decimal> {
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;
    for value in values {
        sum = sum.checked_add(value)?;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        sum.checked_div(Decimal::from(count))
    }
}
