//! Plain-text views printed by the commands.

use api_types::{card::CreditCard, intent::DayType};
use engine::{
    CarInstallment, LedgerRecord, MoneyCents, MonthKey, PayrollSettings,
    car::CarSummary,
    ledger::{self, ChartPoint, MonthSummary, OtCycleSummary},
    plans::InstallmentPlan,
    settings::SETTINGS_FIELDS,
};
use hub_sync::BulkAck;

const BAR_WIDTH: i64 = 30;

fn mark(paid: bool) -> &'static str {
    if paid { "[x]" } else { "[ ]" }
}

pub fn car(summary: &CarSummary, schedule: &[CarInstallment]) -> String {
    let mut lines = vec![
        format!(
            "Car loan: {}/{} paid ({}%)",
            summary.paid_count, summary.total, summary.progress_percent
        ),
        format!(
            "Paid {}  Remaining {}",
            summary.total_paid, summary.remaining
        ),
    ];
    match &summary.next {
        Some(next) => lines.push(format!(
            "Next due: #{} on {} ({})",
            next.number, next.raw_date, next.amount
        )),
        None => lines.push("All installments paid".to_string()),
    }
    lines.push(String::new());
    lines.extend(schedule.iter().map(|item| {
        format!(
            "{} #{:<3} {:<12} {}",
            mark(item.paid),
            item.number,
            item.raw_date,
            item.amount
        )
    }));
    lines.join("\n")
}

pub fn ot_cycle(summary: &OtCycleSummary, settings: &PayrollSettings) -> String {
    let hours = summary.hours;
    let mut lines = vec![
        format!("Pay cycle {} .. {}", summary.window.start, summary.window.end),
        format!(
            "Hours 1x {:.1}  1.5x {:.1}  3x {:.1}  total {:.1}",
            hours.at_1x,
            hours.at_1_5x,
            hours.at_3x,
            hours.total()
        ),
        format!("OT pay     {}", summary.pay),
        format!("Allowance  {}", summary.allowance),
        format!("Net income {}", summary.net_income),
    ];
    if !summary.cycle_records.is_empty() {
        lines.push(String::new());
    }
    for record in &summary.cycle_records {
        let day = match record.day_type {
            DayType::Work => "work",
            DayType::Holiday => "holiday",
        };
        lines.push(format!(
            "{:<12} {:<8} {:>4.1} {:>4.1} {:>4.1}  {}  {}",
            record.raw_date,
            day,
            record.hours_1x,
            record.hours_1_5x,
            record.hours_3x,
            ledger::daily_income(record, settings),
            record.note
        ));
    }
    lines.join("\n")
}

pub fn settings(settings: &PayrollSettings) -> String {
    SETTINGS_FIELDS
        .iter()
        .map(|field| {
            let value = match *field {
                "salary" => settings.salary.to_string(),
                "ot_rate" => settings.ot_rate.to_string(),
                "deduct" => settings.deduct.to_string(),
                "food" => settings.food.to_string(),
                "food_ot" => settings.food_ot.to_string(),
                "gas" => settings.gas.to_string(),
                "incentive" => settings.incentive.to_string(),
                _ => settings.boundary_day.to_string(),
            };
            format!("{field:<13} {value}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn month(
    month: MonthKey,
    summary: &MonthSummary,
    records: &[&LedgerRecord],
    categories: &[(String, MoneyCents)],
) -> String {
    let mut lines = vec![
        format!("{month}: total {}", summary.total),
        format!(
            "Paid {}  Unpaid {}  ({}% paid)",
            summary.paid, summary.unpaid, summary.percent
        ),
    ];
    if records.is_empty() {
        lines.push("No entries".to_string());
    } else {
        lines.push(String::new());
    }
    for record in records {
        lines.push(format!(
            "{} {:<10} {:<12} {:<24} {:>12}  {}",
            mark(record.paid),
            record.id,
            record.raw_date,
            record.label,
            record.amount.to_string(),
            record.category
        ));
    }
    if !categories.is_empty() {
        lines.push(String::new());
        lines.extend(
            categories
                .iter()
                .map(|(name, total)| format!("{:<16} {total}", display_category(name))),
        );
    }
    lines.join("\n")
}

fn display_category(name: &str) -> &str {
    if name.is_empty() { "(none)" } else { name }
}

/// One bar per month, scaled to the largest total.
pub fn chart(points: &[ChartPoint]) -> String {
    let max = points
        .iter()
        .map(|p| p.total.cents())
        .max()
        .unwrap_or(0);
    points
        .iter()
        .map(|point| {
            let width = if max > 0 {
                let cents = i128::from(point.total.cents().max(0));
                (cents * i128::from(BAR_WIDTH) / i128::from(max)) as usize
            } else {
                0
            };
            format!("{} {:<30} {}", point.month, "#".repeat(width), point.total)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn plans(plans: &[InstallmentPlan], commitment: MoneyCents) -> String {
    if plans.is_empty() {
        return "No installment plans".to_string();
    }
    let mut lines: Vec<String> = plans
        .iter()
        .map(|plan| {
            let progress = plan.progress();
            let next = plan
                .next_unpaid_member()
                .map_or_else(|| "done".to_string(), |m| format!("next {}", m.raw_date));
            format!(
                "{:<10} {:<24} {}/{} ({:>3}%)  {} / month  remaining {}  {}",
                plan.plan_id,
                plan.label(),
                progress.paid_count,
                progress.total_count,
                progress.percent,
                plan.per_installment(),
                plan.remaining_amount(),
                next
            )
        })
        .collect();
    lines.push(format!("Monthly commitment {commitment}"));
    lines.join("\n")
}

pub fn cards(cards: &[CreditCard]) -> String {
    if cards.is_empty() {
        return "No cards".to_string();
    }
    cards
        .iter()
        .map(|card| {
            format!(
                "{:<12} {:<20} cutoff day {}",
                card.card_id, card.name, card.statement_cutoff_day
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn bulk(action: &str, ack: &BulkAck) -> String {
    let mut lines = vec![format!("{action}: {} submitted", ack.submitted)];
    lines.extend(ack.failed.iter().map(|failed| {
        format!(
            "  failed #{} {}: {}",
            failed.position + 1,
            failed.intent.kind(),
            failed.error
        )
    }));
    lines.join("\n")
}
