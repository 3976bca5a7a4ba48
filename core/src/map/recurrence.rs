//! Recurrence block <-> recurrence payload, including the nested schedule.

use crate::job::{DayName, MonthlyOccurrence, RecurrenceSpec, ScheduleSpec};
use crate::presence::{Collection, Presence};
use crate::remote::{JobRecurrence, RecurrenceSchedule, ScheduleMonthlyOccurrence};
use crate::set::{IdSet, SetElement};

/// Build the recurrence payload.
///
/// `count` and `end_time` are copied when present; requiring one of them is
/// the validator's job. The schedule object is attached only when at least
/// one collection has members, the service rejects an empty one.
pub fn encode(rec: &RecurrenceSpec) -> JobRecurrence {
    JobRecurrence {
        frequency: Some(rec.frequency.clone()),
        interval: Some(rec.interval),
        count: rec.count,
        end_time: rec.end_time,
        schedule: encode_schedule(&rec.schedule),
    }
}

fn encode_schedule(s: &ScheduleSpec) -> Option<RecurrenceSchedule> {
    if s.is_empty() {
        return None;
    }
    Some(RecurrenceSchedule {
        minutes: s.minutes.members().map(IdSet::to_vec),
        hours: s.hours.members().map(IdSet::to_vec),
        week_days: s
            .week_days
            .members()
            .map(|days| days.iter().map(|d| d.as_str().to_string()).collect()),
        month_days: s.month_days.members().map(IdSet::to_vec),
        monthly_occurrences: s.monthly_occurrences.members().map(|occ| {
            occ.iter()
                .map(|m| ScheduleMonthlyOccurrence {
                    day: m.day.as_str().to_string(),
                    occurrence: Some(m.occurrence),
                })
                .collect()
        }),
    })
}

/// Rebuild the recurrence block. Schedule collections stay `Unset` unless the
/// response carries a schedule object.
pub fn decode(rec: &JobRecurrence) -> RecurrenceSpec {
    RecurrenceSpec {
        frequency: rec.frequency.clone().unwrap_or_default(),
        interval: rec.interval.unwrap_or(1),
        count: rec.count,
        end_time: rec.end_time,
        schedule: rec.schedule.as_ref().map(decode_schedule).unwrap_or_default(),
    }
}

fn decode_schedule(s: &RecurrenceSchedule) -> ScheduleSpec {
    ScheduleSpec {
        minutes: collect(s.minutes.as_deref(), |m| Some(*m)),
        hours: collect(s.hours.as_deref(), |h| Some(*h)),
        week_days: collect(s.week_days.as_deref(), |d| Some(DayName::from(d.as_str()))),
        month_days: collect(s.month_days.as_deref(), |d| Some(*d)),
        // an occurrence without its number cannot be addressed, drop it
        monthly_occurrences: collect(s.monthly_occurrences.as_deref(), |m| {
            m.occurrence.map(|occurrence| MonthlyOccurrence {
                day: DayName::from(m.day.as_str()),
                occurrence,
            })
        }),
    }
}

fn collect<W, T, F>(wire: Option<&[W]>, f: F) -> Presence<IdSet<T>>
where
    T: SetElement,
    IdSet<T>: Collection,
    F: Fn(&W) -> Option<T>,
{
    match wire {
        Some(items) => Presence::provided(items.iter().filter_map(f).collect()),
        None => Presence::Unset,
    }
}
