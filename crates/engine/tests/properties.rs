use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};

use engine::{
    Clock, FixedClock, MoneyCents, PayCycle,
    cycle::{self, last_n_month_keys},
    ledger::{self, next_due},
    plans::{group_plans, monthly_commitment},
    records::decode_ledger,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn member_row(id: u32, plan: &str, index: u32, paid: bool) -> Value {
    json!([
        format!("R{id}"),
        "2024-03-01",
        "installment",
        format!("Plan {plan}"),
        "",
        1500,
        if paid { "yes" } else { "" },
        "",
        plan,
        index,
        5
    ])
}

#[test]
fn every_day_sits_in_exactly_one_window() {
    for boundary in [2, 15, 21, 28] {
        let cycle = PayCycle::new(boundary).unwrap();
        let mut day = date(2023, 1, 1);
        let mut current = cycle.window_containing(day);
        let mut changes = 0;

        while day <= date(2025, 12, 31) {
            let window = cycle.window_containing(day);
            assert!(window.start <= day && day <= window.end, "{day} not in {window:?}");
            assert!(window.contains(day));

            if window != current {
                // A new window starts the day after the previous one ended.
                assert_eq!(current.end + Duration::days(1), window.start);
                assert_eq!(cycle.following(current), window);
                assert_eq!(day, window.start);
                changes += 1;
                current = window;
            }
            day += Duration::days(1);
        }
        // 36 months, one boundary crossing per month.
        assert_eq!(changes, 36, "boundary {boundary}");
    }
}

#[test]
fn window_changes_exactly_at_boundary() {
    let cycle = PayCycle::default();
    let before = cycle.window_containing(date(2024, 5, 20));
    let after = cycle.window_containing(date(2024, 5, 21));
    assert_ne!(before, after);
    assert_eq!(before.end, date(2024, 5, 20));
    assert_eq!(after.start, date(2024, 5, 21));
}

#[test]
fn month_keys_from_injected_clock() {
    let clock = FixedClock::new(date(2024, 3, 15));
    let keys: Vec<String> = last_n_month_keys(clock.today(), 3)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(cycle::next_month_key(clock.today()).to_string(), "2024-04");
}

#[test]
fn grouping_preserves_every_installment_member() {
    let rows = vec![
        member_row(1, "A", 3, false),
        json!(["B1", "2024-03-02", "bill", "Water", "", 300, "", "", "", "", ""]),
        member_row(2, "B", 1, true),
        member_row(3, "A", 1, true),
        member_row(4, "A", 2, false),
        member_row(5, "B", 2, false),
    ];
    let records = decode_ledger(&rows, chrono_tz::Asia::Bangkok);
    let plans = group_plans(&records);

    let mut flattened: Vec<String> = plans
        .iter()
        .flat_map(|p| p.members.iter().map(|m| m.id.clone()))
        .collect();
    flattened.sort();
    let mut members: Vec<String> = records
        .iter()
        .filter(|r| r.is_installment())
        .map(|r| r.id.clone())
        .collect();
    members.sort();
    assert_eq!(flattened, members);

    for plan in &plans {
        assert!(
            plan.members
                .windows(2)
                .all(|w| w[0].installment_index < w[1].installment_index)
        );
    }
}

#[test]
fn next_due_absent_iff_all_paid() {
    let rows: Vec<Value> = (1..=3).map(|i| member_row(i, "A", i, true)).collect();
    let records = decode_ledger(&rows, chrono_tz::Asia::Bangkok);
    assert!(next_due(&records).is_none());
    let plans = group_plans(&records);
    assert!(plans[0].next_unpaid_member().is_none());
    assert_eq!(monthly_commitment(&plans), MoneyCents::ZERO);

    let rows: Vec<Value> = (1..=3).map(|i| member_row(i, "A", i, i != 2)).collect();
    let records = decode_ledger(&rows, chrono_tz::Asia::Bangkok);
    assert_eq!(next_due(&records).map(|r| r.id.as_str()), Some("R2"));
    let plans = group_plans(&records);
    assert_eq!(
        plans[0].next_unpaid_member().map(|r| r.id.as_str()),
        Some("R2")
    );
    assert_eq!(monthly_commitment(&plans), MoneyCents::new(150_000));
}

#[test]
fn month_summary_percent_stays_in_range() {
    let rows = vec![
        json!(["1", "2024-03-01", "bill", "A", "", 100, "yes", "", "", "", ""]),
        json!(["2", "01/03/2024", "credit", "B", "", "oops", "yes", "", "", "", ""]),
        json!(["3", "2024-03-09", "bill", "C", "", 0.5, "", "", "", "", ""]),
    ];
    let records = decode_ledger(&rows, chrono_tz::Asia::Bangkok);
    let march = "2024-03".parse().unwrap();
    let summary = ledger::month_summary(&records, march);
    assert_eq!(summary.total, MoneyCents::new(10_050));
    assert!(summary.percent <= 100);
    assert_eq!(summary.percent, 100);
    assert_eq!(summary, ledger::month_summary(&records, march));

    let april = "2024-04".parse().unwrap();
    assert_eq!(ledger::month_summary(&records, april).percent, 0);
}
