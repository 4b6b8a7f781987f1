//! Car loan schedule summary.

use api_types::intent::WriteIntent;
use serde::Serialize;

use crate::{
    MoneyCents, ledger,
    money::percent,
    records::CarInstallment,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CarSummary {
    pub total: usize,
    pub paid_count: usize,
    pub unpaid_count: usize,
    pub total_paid: MoneyCents,
    pub remaining: MoneyCents,
    pub progress_percent: u8,
    pub next: Option<CarInstallment>,
}

/// Summary of the schedule.
///
/// Every installment has the same amount, so totals are counts times the
/// first row's amount.
pub fn car_summary(installments: &[CarInstallment]) -> CarSummary {
    let total = installments.len();
    let paid_count = installments.iter().filter(|i| i.paid).count();
    let unpaid_count = total - paid_count;
    let per_installment = installments
        .first()
        .map_or(MoneyCents::ZERO, |i| i.amount)
        .cents();

    CarSummary {
        total,
        paid_count,
        unpaid_count,
        total_paid: MoneyCents::new(per_installment * paid_count as i64),
        remaining: MoneyCents::new(per_installment * unpaid_count as i64),
        progress_percent: percent(paid_count as i64, total as i64),
        next: ledger::next_due(installments).cloned(),
    }
}

pub fn pay_intent(number: u32) -> WriteIntent {
    WriteIntent::PayCar { no: number }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installment(number: u32, paid: bool) -> CarInstallment {
        CarInstallment {
            number,
            raw_date: String::new(),
            amount: MoneyCents::new(850_000),
            paid,
        }
    }

    #[test]
    fn summary_counts_and_next() {
        let schedule = vec![installment(1, true), installment(2, false), installment(3, false)];
        let summary = car_summary(&schedule);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.unpaid_count, 2);
        assert_eq!(summary.total_paid, MoneyCents::new(850_000));
        assert_eq!(summary.remaining, MoneyCents::new(1_700_000));
        assert_eq!(summary.progress_percent, 33);
        assert_eq!(summary.next.map(|i| i.number), Some(2));
    }

    #[test]
    fn empty_schedule() {
        let summary = car_summary(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.progress_percent, 0);
        assert!(summary.next.is_none());
    }

    #[test]
    fn finished_schedule_has_no_next() {
        let summary = car_summary(&[installment(1, true)]);
        assert_eq!(summary.progress_percent, 100);
        assert!(summary.next.is_none());
        assert_eq!(pay_intent(4), WriteIntent::PayCar { no: 4 });
    }
}
