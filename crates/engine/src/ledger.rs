//! Derived views over decoded records: month summaries, chart series, the
//! OT cycle summary and next-due selection.
//!
//! Every function is pure over its inputs; callers recompute on every read.
//! Installment members are excluded from the month views, they are reported
//! through [`crate::plans`] instead.

use serde::Serialize;

use crate::{
    MoneyCents, PayrollSettings, classify,
    cycle::{MonthKey, PayCycleWindow},
    records::{LedgerRecord, OtRecord, Settled},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub total: MoneyCents,
    pub paid: MoneyCents,
    pub unpaid: MoneyCents,
    /// Paid share of the total, `0..=100`; 0 when nothing is due.
    pub percent: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub month: MonthKey,
    pub total: MoneyCents,
}

/// Which rows the month list shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl StatusFilter {
    fn accepts(self, record: &LedgerRecord) -> bool {
        match self {
            Self::All => true,
            Self::Paid => record.paid,
            Self::Unpaid => !record.paid,
        }
    }
}

fn in_month(record: &LedgerRecord, month: MonthKey) -> bool {
    !record.is_installment() && record.month == Some(month)
}

/// Totals of the non-installment rows dated in `month`.
pub fn month_summary(records: &[LedgerRecord], month: MonthKey) -> MonthSummary {
    let (total, paid) = records
        .iter()
        .filter(|r| in_month(r, month))
        .fold((MoneyCents::ZERO, MoneyCents::ZERO), |(total, paid), r| {
            let paid = if r.paid { paid + r.amount } else { paid };
            (total + r.amount, paid)
        });

    MonthSummary {
        total,
        paid,
        unpaid: total - paid,
        percent: total.percent_of(paid),
    }
}

/// One point per requested month, in the order given; empty months are 0.
pub fn chart_series(records: &[LedgerRecord], months: &[MonthKey]) -> Vec<ChartPoint> {
    months
        .iter()
        .map(|&month| ChartPoint {
            month,
            total: records
                .iter()
                .filter(|r| in_month(r, month))
                .map(|r| r.amount)
                .sum(),
        })
        .collect()
}

/// Non-installment rows of `month` matching `status`, in sheet order.
pub fn filter_month(
    records: &[LedgerRecord],
    month: MonthKey,
    status: StatusFilter,
) -> Vec<&LedgerRecord> {
    records
        .iter()
        .filter(|r| in_month(r, month) && status.accepts(r))
        .collect()
}

/// Rows a "pay everything this month" action toggles.
pub fn unpaid_in_month(records: &[LedgerRecord], month: MonthKey) -> Vec<&LedgerRecord> {
    filter_month(records, month, StatusFilter::Unpaid)
}

/// Sum per category for `month`, categories in first-seen order.
/// Rows without a category are grouped under an empty name.
pub fn category_totals(records: &[LedgerRecord], month: MonthKey) -> Vec<(String, MoneyCents)> {
    let mut totals: Vec<(String, MoneyCents)> = Vec::new();
    for record in records.iter().filter(|r| in_month(r, month)) {
        match totals.iter_mut().find(|(name, _)| *name == record.category) {
            Some((_, sum)) => *sum += record.amount,
            None => totals.push((record.category.clone(), record.amount)),
        }
    }
    totals
}

/// First unsettled item in the order given (not sorted).
///
/// `None` means everything is settled.
pub fn next_due<T: Settled>(items: &[T]) -> Option<&T> {
    items.iter().find(|item| !item.is_paid())
}

/// Overtime hours split by multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OtHours {
    pub at_1x: f64,
    pub at_1_5x: f64,
    pub at_3x: f64,
}

impl OtHours {
    pub fn total(self) -> f64 {
        self.at_1x + self.at_1_5x + self.at_3x
    }

    /// Hours weighted by their multiplier, in 1x-equivalent hours.
    pub fn weighted(self) -> f64 {
        self.at_1x + self.at_1_5x * 1.5 + self.at_3x * 3.0
    }

    fn of(record: &OtRecord) -> Self {
        Self {
            at_1x: record.hours_1x,
            at_1_5x: record.hours_1_5x,
            at_3x: record.hours_3x,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OtCycleSummary {
    pub window: PayCycleWindow,
    pub hours: OtHours,
    pub pay: MoneyCents,
    pub allowance: MoneyCents,
    pub net_income: MoneyCents,
    /// Records inside the window, oldest first.
    pub cycle_records: Vec<OtRecord>,
}

/// Payroll summary of the records dated inside `window`.
///
/// `net_income = salary - deduct + incentive + pay + allowance`, with the
/// fixed figures taken from `settings` and allowances counted per the
/// eligibility rules in [`classify::allowance`]. Records with an unparseable
/// date are outside every window.
pub fn ot_cycle_summary(
    records: &[OtRecord],
    window: PayCycleWindow,
    settings: &PayrollSettings,
) -> OtCycleSummary {
    let mut cycle_records: Vec<OtRecord> = records
        .iter()
        .filter(|r| r.occurred_on.is_some_and(|d| window.contains(d)))
        .cloned()
        .collect();
    // Stable: same-day rows keep their sheet order.
    cycle_records.sort_by_key(|r| r.occurred_on);

    let hours = cycle_records.iter().fold(OtHours::default(), |acc, r| OtHours {
        at_1x: acc.at_1x + r.hours_1x,
        at_1_5x: acc.at_1_5x + r.hours_1_5x,
        at_3x: acc.at_3x + r.hours_3x,
    });
    let pay = settings.ot_rate.scale(hours.weighted());
    let allowance: MoneyCents = cycle_records
        .iter()
        .map(|r| classify::allowance(r).total())
        .sum();
    let net_income = settings.salary - settings.deduct + settings.incentive + pay + allowance;

    OtCycleSummary {
        window,
        hours,
        pay,
        allowance,
        net_income,
        cycle_records,
    }
}

/// Income earned on one OT day: overtime pay plus eligible allowances.
pub fn daily_income(record: &OtRecord, settings: &PayrollSettings) -> MoneyCents {
    settings.ot_rate.scale(OtHours::of(record).weighted()) + classify::allowance(record).total()
}
