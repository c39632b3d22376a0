use std::collections::BTreeMap;

use getset::{CopyGetters, Getters};
use log::debug;
use serde::Serialize;

use super::record::EventRecord;
use super::Totals;

/// How year-level speed and efficiency averages are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupPolicy {
    /// Mean of the month means. Not weighted by the number of events in
    /// each month, so months with few events count as much as busy ones.
    AverageOfAverages,
    /// Mean over every defined event value of the year.
    EventWeighted,
}

/// Year rollup used by the report.
pub const YEAR_ROLLUP_POLICY: RollupPolicy = RollupPolicy::AverageOfAverages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Year,
    Month,
    Event,
}

/// One row of the drill-down table.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
#[serde(rename_all = "camelCase")]
pub struct AggregateNode {
    #[getset(get_copy = "pub")]
    kind: NodeKind,
    #[getset(get = "pub")]
    id: String,
    #[getset(get = "pub")]
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[getset(get = "pub")]
    label: String,
    #[getset(get = "pub")]
    #[serde(flatten)]
    totals: Totals,
}

impl AggregateNode {
    fn year(year: i32, totals: Totals) -> AggregateNode {
        AggregateNode {
            kind: NodeKind::Year,
            id: year_id(year),
            parent_id: None,
            label: year.to_string(),
            totals,
        }
    }

    fn month(year: i32, month: u32, label: String, totals: Totals) -> AggregateNode {
        AggregateNode {
            kind: NodeKind::Month,
            id: month_id(year, month),
            parent_id: Some(year_id(year)),
            label,
            totals,
        }
    }

    fn event(index: usize, record: &EventRecord) -> AggregateNode {
        let label = if record.station().is_empty() {
            record.day_label()
        } else {
            format!("{} - {}", record.day_label(), record.station())
        };

        AggregateNode {
            kind: NodeKind::Event,
            id: format!("e{}", index),
            parent_id: Some(month_id(record.year(), record.month())),
            label,
            totals: Totals::of_event(record),
        }
    }
}

fn year_id(year: i32) -> String {
    format!("y{}", year)
}

fn month_id(year: i32, month: u32) -> String {
    format!("m{}-{}", year, month)
}

type MonthGroups<'a> = BTreeMap<u32, Vec<(usize, &'a EventRecord)>>;

/// Builds the year → month → event tree as a pre-order list using
/// [`YEAR_ROLLUP_POLICY`].
pub fn build_hierarchy(records: &[EventRecord]) -> Vec<AggregateNode> {
    build_hierarchy_with(records, YEAR_ROLLUP_POLICY)
}

/// Years and months come out in ascending order, events in input order.
/// Month totals roll up their events; year totals roll up their months.
pub fn build_hierarchy_with(records: &[EventRecord], policy: RollupPolicy) -> Vec<AggregateNode> {
    let mut years: BTreeMap<i32, MonthGroups> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        years
            .entry(record.year())
            .or_default()
            .entry(record.month())
            .or_default()
            .push((index, record));
    }

    let mut nodes = Vec::with_capacity(records.len() + years.len() * 13);

    for (year, months) in years {
        let mut month_totals = Vec::with_capacity(months.len());
        let mut children = Vec::new();

        for (month, events) in months {
            let totals = Totals::rollup(events.iter().map(|(_, record)| *record));
            let label = events
                .first()
                .map(|(_, record)| record.month_name())
                .unwrap_or_default();

            children.push(AggregateNode::month(year, month, label, totals.clone()));
            children.extend(events.iter().map(|(index, record)| AggregateNode::event(*index, record)));
            month_totals.push(totals);
        }

        let mut year_totals = Totals::rollup(&month_totals);
        if policy == RollupPolicy::EventWeighted {
            let weighted = Totals::rollup(
                children
                    .iter()
                    .filter(|node| node.kind == NodeKind::Event)
                    .map(|node| &node.totals),
            );
            year_totals.avg_speed = weighted.avg_speed;
            year_totals.avg_efficiency = weighted.avg_efficiency;
        }

        debug!(
            "year {} rolled up from {} months, {} events",
            year,
            month_totals.len(),
            year_totals.event_count
        );

        nodes.push(AggregateNode::year(year, year_totals));
        nodes.append(&mut children);
    }

    nodes
}
