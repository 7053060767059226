use causeway_core::config::ExpanderSettings;
use causeway_occurrence::{DateEntry, ExpansionWindow, OccurrenceExpander, TimeZoneResolver};
use chrono::{DateTime, NaiveDateTime, Utc};

/// `(start_at, end_at, rrule)`
pub type EntryRow = (&'static str, &'static str, &'static str);

/// `(occurrence_start, occurrence_end)`
pub type OccurrenceRow = (&'static str, &'static str);

pub struct ExpansionCase {
    pub name: &'static str,
    pub entries: &'static [EntryRow],
    pub default_timezone: &'static str,
    pub treat_z_as_local: bool,
    pub year: i32,
    pub now: &'static str,
    pub expected: Option<&'static [OccurrenceRow]>,
    pub expected_len: Option<usize>,
    pub first: Option<OccurrenceRow>,
    pub last: Option<OccurrenceRow>,
    pub next: ExpectedNext,
}

pub enum ExpectedNext {
    Unchecked,
    Absent,
    At(&'static str),
}

const NEW_YEAR_2025: &str = "2025-01-01 00:00:00";

#[expect(clippy::too_many_lines)]
pub fn expansion_cases() -> Vec<ExpansionCase> {
    vec![
        ExpansionCase {
            name: "one_off_in_window",
            entries: &[("2025-06-01 09:00:00", "2025-06-01 11:00:00", "")],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[("2025-06-01 09:00:00", "2025-06-01 11:00:00")]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::At("2025-06-01 09:00:00"),
        },
        ExpansionCase {
            name: "one_off_out_of_window",
            entries: &[("2025-06-01 09:00:00", "2025-06-01 11:00:00", "")],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2024,
            now: "2024-01-01 00:00:00",
            expected: Some(&[]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::Absent,
        },
        ExpansionCase {
            name: "weekly_cross_midnight_wrap",
            entries: &[("2025-01-06 23:00:00", "2025-01-06 01:00:00", "FREQ=WEEKLY")],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(52),
            first: Some(("2025-01-06 23:00:00", "2025-01-07 01:00:00")),
            last: Some(("2025-12-29 23:00:00", "2025-12-30 01:00:00")),
            next: ExpectedNext::At("2025-01-06 23:00:00"),
        },
        ExpansionCase {
            name: "malformed_rule_isolated",
            entries: &[
                ("2025-06-01 09:00:00", "2025-06-01 11:00:00", "NOT-A-VALID-RULE"),
                ("2025-07-01 09:00:00", "2025-07-01 10:00:00", ""),
            ],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[("2025-07-01 09:00:00", "2025-07-01 10:00:00")]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::At("2025-07-01 09:00:00"),
        },
        ExpansionCase {
            name: "z_as_local_keeps_wall_clock_across_dst",
            entries: &[(
                "2025-01-07 18:00:00",
                "2025-01-07 20:00:00",
                "DTSTART:20250107T180000Z\nRRULE:FREQ=WEEKLY;BYDAY=TU;COUNT=10",
            )],
            default_timezone: "America/New_York",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[
                ("2025-01-07 23:00:00", "2025-01-08 01:00:00"),
                ("2025-01-14 23:00:00", "2025-01-15 01:00:00"),
                ("2025-01-21 23:00:00", "2025-01-22 01:00:00"),
                ("2025-01-28 23:00:00", "2025-01-29 01:00:00"),
                ("2025-02-04 23:00:00", "2025-02-05 01:00:00"),
                ("2025-02-11 23:00:00", "2025-02-12 01:00:00"),
                ("2025-02-18 23:00:00", "2025-02-19 01:00:00"),
                ("2025-02-25 23:00:00", "2025-02-26 01:00:00"),
                ("2025-03-04 23:00:00", "2025-03-05 01:00:00"),
                // EDT from March 9
                ("2025-03-11 22:00:00", "2025-03-12 00:00:00"),
            ]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::At("2025-01-07 23:00:00"),
        },
        ExpansionCase {
            name: "z_as_utc_keeps_instant",
            entries: &[(
                "2025-01-07 18:00:00",
                "2025-01-07 20:00:00",
                "DTSTART:20250107T180000Z\nRRULE:FREQ=WEEKLY;BYDAY=TU;COUNT=10",
            )],
            default_timezone: "America/New_York",
            treat_z_as_local: false,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(10),
            first: Some(("2025-01-07 18:00:00", "2025-01-07 20:00:00")),
            last: Some(("2025-03-11 18:00:00", "2025-03-11 20:00:00")),
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "rule_tzid_sydney_dst_end",
            entries: &[(
                "2025-04-04 10:00:00",
                "2025-04-04 11:00:00",
                "DTSTART;TZID=Australia/Sydney:20250404T100000\nRRULE:FREQ=DAILY;COUNT=3",
            )],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[
                ("2025-04-03 23:00:00", "2025-04-04 00:00:00"),
                ("2025-04-04 23:00:00", "2025-04-05 00:00:00"),
                // AEST from April 6
                ("2025-04-06 00:00:00", "2025-04-06 01:00:00"),
            ]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "windows_tzid_normalized",
            entries: &[(
                "2025-01-15 10:00:00",
                "2025-01-15 11:00:00",
                "DTSTART;TZID=Eastern Standard Time:20250115T100000\nRRULE:FREQ=DAILY;COUNT=1",
            )],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[("2025-01-15 15:00:00", "2025-01-15 16:00:00")]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "floating_until_utc_fallback",
            entries: &[(
                "2025-01-06 10:00:00",
                "2025-01-06 11:00:00",
                "FREQ=WEEKLY;UNTIL=20250301T000000",
            )],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(8),
            first: Some(("2025-01-06 10:00:00", "2025-01-06 11:00:00")),
            last: Some(("2025-02-24 10:00:00", "2025-02-24 11:00:00")),
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "floating_until_new_york_fallback",
            entries: &[(
                "2025-01-06 10:00:00",
                "2025-01-06 11:00:00",
                "FREQ=WEEKLY;UNTIL=20250301T000000",
            )],
            default_timezone: "America/New_York",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(8),
            first: Some(("2025-01-06 15:00:00", "2025-01-06 16:00:00")),
            last: Some(("2025-02-24 15:00:00", "2025-02-24 16:00:00")),
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "floating_dtstart_with_floating_until_is_inclusive",
            entries: &[(
                "2025-01-06 10:00:00",
                "2025-01-06 11:00:00",
                "DTSTART:20250106T100000\nRRULE:FREQ=WEEKLY;UNTIL=20250224T100000",
            )],
            default_timezone: "America/New_York",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(8),
            first: Some(("2025-01-06 15:00:00", "2025-01-06 16:00:00")),
            last: Some(("2025-02-24 15:00:00", "2025-02-24 16:00:00")),
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "z_as_local_until_keeps_last_local_occurrence",
            entries: &[(
                "2025-01-07 18:00:00",
                "2025-01-07 20:00:00",
                "DTSTART:20250107T180000Z\nRRULE:FREQ=WEEKLY;UNTIL=20250311T180000Z",
            )],
            default_timezone: "America/New_York",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: None,
            expected_len: Some(10),
            first: Some(("2025-01-07 23:00:00", "2025-01-08 01:00:00")),
            last: Some(("2025-03-11 22:00:00", "2025-03-12 00:00:00")),
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "next_is_inclusive_of_now",
            entries: &[
                ("2025-03-01 08:00:00", "2025-03-01 09:00:00", "FREQ=DAILY;COUNT=5"),
                ("2025-03-02 12:00:00", "2025-03-02 13:00:00", ""),
            ],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: "2025-03-03 08:00:00",
            expected: None,
            expected_len: Some(6),
            first: Some(("2025-03-01 08:00:00", "2025-03-01 09:00:00")),
            last: Some(("2025-03-05 08:00:00", "2025-03-05 09:00:00")),
            next: ExpectedNext::At("2025-03-03 08:00:00"),
        },
        ExpansionCase {
            name: "year_end_wrap_exceeds_window",
            entries: &[("2025-12-31 23:30:00", "2025-12-31 00:30:00", "FREQ=DAILY;COUNT=2")],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[("2025-12-31 23:30:00", "2026-01-01 00:30:00")]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::Unchecked,
        },
        ExpansionCase {
            name: "equal_times_wrap_full_day",
            entries: &[("2025-05-05 09:00:00", "2025-05-05 09:00:00", "FREQ=DAILY;COUNT=1")],
            default_timezone: "UTC",
            treat_z_as_local: true,
            year: 2025,
            now: NEW_YEAR_2025,
            expected: Some(&[("2025-05-05 09:00:00", "2025-05-06 09:00:00")]),
            expected_len: None,
            first: None,
            last: None,
            next: ExpectedNext::Unchecked,
        },
    ]
}

pub fn assert_case(case: &ExpansionCase) {
    let settings = ExpanderSettings::default()
        .with_default_timezone(case.default_timezone)
        .with_treat_z_as_local(case.treat_z_as_local);
    let expander = OccurrenceExpander::new(settings);

    let entries: Vec<DateEntry> = case
        .entries
        .iter()
        .map(|&(start_at, end_at, rrule)| DateEntry::new(start_at, end_at, rrule))
        .collect();

    let window = ExpansionWindow::for_year(case.year)
        .unwrap_or_else(|| panic!("Case {} has an invalid year", case.name));
    let mut resolver = TimeZoneResolver::new();

    let expansion = expander.expand(&entries, window, parse_utc(case.now), &mut resolver);

    let actual: Vec<(String, String)> = expansion
        .occurrences
        .iter()
        .map(|occ| (occ.start_string(), occ.end_string()))
        .collect();

    if let Some(expected) = case.expected {
        assert_eq!(actual, to_owned_rows(expected), "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            actual.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }

    if let Some(first) = case.first {
        assert_eq!(
            actual.first(),
            to_owned_rows(&[first]).first(),
            "Case {} first occurrence",
            case.name
        );
    }

    if let Some(last) = case.last {
        assert_eq!(
            actual.last(),
            to_owned_rows(&[last]).first(),
            "Case {} last occurrence",
            case.name
        );
    }

    let expected_next = match case.next {
        ExpectedNext::Unchecked => return,
        ExpectedNext::Absent => None,
        ExpectedNext::At(start) => Some(start),
    };
    assert_eq!(
        expansion.next_string().as_deref(),
        expected_next,
        "Case {} next occurrence",
        case.name
    );
}

fn to_owned_rows(rows: &[OccurrenceRow]) -> Vec<(String, String)> {
    rows.iter()
        .map(|&(start, end)| (start.to_string(), end.to_string()))
        .collect()
}

pub fn parse_utc(value: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|err| panic!("Failed to parse timestamp {value}: {err}"))
        .and_utc()
}
