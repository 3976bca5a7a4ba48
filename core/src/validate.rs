//! Checks run on a proposed [`JobSpec`] before anything is sent.
//!
//! The service accepts several broken payloads and then does nothing (or
//! something odd) with them; these rules turn that into a local error.
//! Every rule runs and every violation is reported.

use thiserror::Error;

use crate::job::{ActionSpec, DayName, JobSpec, RecurrenceSpec, RetrySpec, ScheduleSpec};
use crate::presence::Presence;
use crate::set::IdSet;

/// HTTP methods the service accepts.
pub const METHODS: [&str; 4] = ["Get", "Put", "Post", "Delete"];
/// Recurrence frequencies.
pub const FREQUENCIES: [&str; 5] = ["Minute", "Hour", "Day", "Week", "Month"];
/// Day names for week days and monthly occurrences.
pub const DAYS: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
/// Settable job states (`Faulted`/`Completed` exist but only the service sets them).
pub const STATES: [&str; 2] = ["Enabled", "Disabled"];

/// One broken rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Violation {
    /// No action block at all.
    #[error("`action_web` must be set")]
    MissingAction,
    /// Recurrence without an end condition.
    #[error("one of `count` or `end_time` must be set for the `recurrence` block")]
    MissingEndCondition,
    /// Two blocks that exclude each other are both set.
    #[error("`{0}` conflicts with `{1}`")]
    Conflict(&'static str, &'static str),
    /// A single field is out of its domain.
    #[error("`{field}`: {reason}")]
    Field {
        /// Dotted path of the field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

fn field(path: impl Into<String>, reason: impl Into<String>) -> Violation {
    Violation::Field { field: path.into(), reason: reason.into() }
}

/// All violations found in one spec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", join(.violations))]
pub struct ValidationError {
    /// Violations in rule order.
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Run every rule; `Err` lists all violations.
pub fn check(spec: &JobSpec) -> Result<(), ValidationError> {
    let mut violations = cross_field(spec);
    violations.extend(fields(spec));
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

/// Constraints spanning several fields that the file shape cannot express.
pub fn cross_field(spec: &JobSpec) -> Vec<Violation> {
    let mut out = Vec::new();
    if spec.action_web.is_none() {
        out.push(Violation::MissingAction);
    }
    if let Some(rec) = &spec.recurrence {
        // without either the service silently never runs the job
        if rec.count.is_none() && rec.end_time.is_none() {
            out.push(Violation::MissingEndCondition);
        }
    }
    out
}

/// Per-field domain rules.
pub fn fields(spec: &JobSpec) -> Vec<Violation> {
    let mut out = Vec::new();

    if !valid_name(&spec.name) {
        out.push(field(
            "name",
            "must start with a letter and contain only letters, numbers, hyphens and underscores",
        ));
    }
    if spec.resource_group_name.trim().is_empty() {
        out.push(field("resource_group_name", "must not be empty"));
    }
    if spec.job_collection_name.trim().is_empty() {
        out.push(field("job_collection_name", "must not be empty"));
    }

    if let Some(a) = &spec.action_web {
        check_action("action_web", a, &mut out);
    }
    if let Some(a) = &spec.error_action_web {
        check_action("error_action_web", a, &mut out);
    }

    if let RetrySpec::Fixed(f) = &spec.retry {
        if !(1..=20).contains(&f.count) {
            out.push(field("retry.count", format!("must be between 1 and 20, got {}", f.count)));
        }
    }

    if let Some(rec) = &spec.recurrence {
        check_recurrence(rec, &mut out);
    }

    if let Some(state) = &spec.state {
        if !one_of(state, &STATES) {
            out.push(field("state", format!("expected one of {STATES:?}, got {state:?}")));
        }
    }

    out
}

// ^[a-zA-Z][-_a-zA-Z0-9].*$
fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let second = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    first && second
}

fn one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.iter().any(|a| a.eq_ignore_ascii_case(value))
}

fn has_web_scheme(url: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(scheme))
            && url.len() > scheme.len()
    })
}

fn check_action(block: &str, a: &ActionSpec, out: &mut Vec<Violation>) {
    if !has_web_scheme(&a.url) {
        out.push(field(
            format!("{block}.url"),
            format!("must start with http:// or https://, got {:?}", a.url),
        ));
    }
    if !one_of(&a.method, &METHODS) {
        out.push(field(
            format!("{block}.method"),
            format!("expected one of {METHODS:?}, got {:?}", a.method),
        ));
    }
}

fn check_recurrence(rec: &RecurrenceSpec, out: &mut Vec<Violation>) {
    if !one_of(&rec.frequency, &FREQUENCIES) {
        out.push(field(
            "recurrence.frequency",
            format!("expected one of {FREQUENCIES:?}, got {:?}", rec.frequency),
        ));
    }
    // the upper bound depends on frequency and collection quotas, the service checks it
    if rec.interval < 1 {
        out.push(field("recurrence.interval", format!("must be at least 1, got {}", rec.interval)));
    }
    if let Some(count) = rec.count {
        if count < 1 {
            out.push(field(
                "recurrence.count",
                format!("must be between 1 and {}, got {count}", i32::MAX),
            ));
        }
    }
    check_schedule(&rec.schedule, out);
}

fn check_schedule(s: &ScheduleSpec, out: &mut Vec<Violation>) {
    check_ints(&s.minutes, "recurrence.minutes", |m| (0..=59).contains(&m), "0..=59", out);
    check_ints(&s.hours, "recurrence.hours", |h| (0..=23).contains(&h), "0..=23", out);
    check_ints(
        &s.month_days,
        "recurrence.month_days",
        |d| d != 0 && (-31..=31).contains(&d),
        "-31..=31 excluding 0",
        out,
    );

    if let Some(days) = s.week_days.members() {
        check_days(days.iter(), "recurrence.week_days", out);
    }
    if let Some(occ) = s.monthly_occurrences.members() {
        check_days(occ.iter().map(|m| &m.day), "recurrence.monthly_occurrences.day", out);
        for m in occ.iter() {
            if m.occurrence == 0 || !(-5..=5).contains(&m.occurrence) {
                out.push(field(
                    "recurrence.monthly_occurrences.occurrence",
                    format!("must be in -5..=5 excluding 0, got {}", m.occurrence),
                ));
            }
        }
    }

    // an explicitly empty list is still "set" for conflict and minimum checks
    let selectors = [
        ("recurrence.week_days", s.week_days.is_provided()),
        ("recurrence.month_days", s.month_days.is_provided()),
        ("recurrence.monthly_occurrences", s.monthly_occurrences.is_provided()),
    ];
    for (i, (a, a_set)) in selectors.iter().enumerate() {
        for (b, b_set) in &selectors[i + 1..] {
            if *a_set && *b_set {
                out.push(Violation::Conflict(*a, *b));
            }
        }
    }
    if s.month_days == Presence::Empty {
        out.push(field("recurrence.month_days", "must contain at least 1 item"));
    }
    if s.monthly_occurrences == Presence::Empty {
        out.push(field("recurrence.monthly_occurrences", "must contain at least 1 item"));
    }
}

fn check_ints(
    set: &Presence<IdSet<i32>>,
    path: &str,
    ok: impl Fn(i32) -> bool,
    range: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(items) = set.members() {
        for v in items.iter().copied().filter(|v| !ok(*v)) {
            out.push(field(path, format!("must be in {range}, got {v}")));
        }
    }
}

fn check_days<'a>(days: impl Iterator<Item = &'a DayName>, path: &str, out: &mut Vec<Violation>) {
    for d in days.filter(|d| !one_of(d.as_str(), &DAYS)) {
        out.push(field(path, format!("expected a day name, got {:?}", d.as_str())));
    }
}
