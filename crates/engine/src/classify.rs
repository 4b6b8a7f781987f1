//! Record classification and allowance eligibility rules.

use api_types::intent::DayType;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::{
    MoneyCents,
    records::{OtRecord, RecordKind},
};

/// Overtime at 1.5x needed for the OT meal allowance.
pub const MEAL_OT_MIN_HOURS_1_5X: f64 = 2.0;

/// Ledger rows carrying a plan id are installment members whatever their
/// source type says; the rest are credit-card spending or plain bills.
pub fn ledger_kind(source_type: &str, plan_id: Option<&str>) -> RecordKind {
    if plan_id.is_some_and(|id| !id.trim().is_empty()) {
        return RecordKind::InstallmentMember;
    }
    if source_type.trim().eq_ignore_ascii_case("credit") {
        RecordKind::Credit
    } else {
        RecordKind::Bill
    }
}

/// Day type stored for a new OT row: Sundays are always holidays.
pub fn effective_day_type(date: NaiveDate, requested: DayType) -> DayType {
    if date.weekday() == Weekday::Sun {
        DayType::Holiday
    } else {
        requested
    }
}

/// Whether the OT meal allowance applies to a day.
pub fn meal_ot_eligible(hours_1_5x: f64, hours_3x: f64) -> bool {
    hours_1_5x >= MEAL_OT_MIN_HOURS_1_5X || hours_3x > 0.0
}

/// Allowances of one OT day after eligibility rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Allowance {
    pub meal: MoneyCents,
    pub meal_ot: MoneyCents,
    pub fuel: MoneyCents,
}

impl Allowance {
    pub fn total(self) -> MoneyCents {
        self.meal + self.meal_ot + self.fuel
    }
}

/// Counted allowances of `record`, whatever its stored cells say.
///
/// Meal and fuel are dropped on holidays; the OT meal needs
/// [`meal_ot_eligible`] hours.
pub fn allowance(record: &OtRecord) -> Allowance {
    let worked = record.day_type == DayType::Work;
    Allowance {
        meal: if worked {
            record.meal_allowance
        } else {
            MoneyCents::ZERO
        },
        meal_ot: if meal_ot_eligible(record.hours_1_5x, record.hours_3x) {
            record.meal_allowance_ot
        } else {
            MoneyCents::ZERO
        },
        fuel: if worked {
            record.fuel_allowance
        } else {
            MoneyCents::ZERO
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ot(hours_1_5x: f64, hours_3x: f64, day_type: DayType) -> OtRecord {
        OtRecord {
            raw_date: "2024-03-10".to_string(),
            occurred_on: NaiveDate::from_ymd_opt(2024, 3, 10),
            hours_1x: 0.0,
            hours_1_5x,
            hours_3x,
            base_salary: MoneyCents::ZERO,
            deduction: MoneyCents::ZERO,
            meal_allowance: MoneyCents::new(4000),
            meal_allowance_ot: MoneyCents::new(3000),
            fuel_allowance: MoneyCents::new(5500),
            note: String::new(),
            day_type,
        }
    }

    #[test]
    fn plan_id_wins_over_source_type() {
        assert_eq!(ledger_kind("credit", Some("P1")), RecordKind::InstallmentMember);
        assert_eq!(ledger_kind("credit", Some("  ")), RecordKind::Credit);
        assert_eq!(ledger_kind("bill", None), RecordKind::Bill);
        assert_eq!(ledger_kind("", None), RecordKind::Bill);
    }

    #[test]
    fn sunday_is_forced_to_holiday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(effective_day_type(sunday, DayType::Work), DayType::Holiday);
        assert_eq!(effective_day_type(monday, DayType::Work), DayType::Work);
        assert_eq!(effective_day_type(monday, DayType::Holiday), DayType::Holiday);
    }

    #[test]
    fn meal_ot_threshold() {
        assert_eq!(allowance(&ot(1.0, 0.0, DayType::Work)).meal_ot, MoneyCents::ZERO);
        assert_eq!(allowance(&ot(2.0, 0.0, DayType::Work)).meal_ot, MoneyCents::new(3000));
        assert_eq!(allowance(&ot(0.0, 0.5, DayType::Work)).meal_ot, MoneyCents::new(3000));
    }

    #[test]
    fn holiday_drops_meal_and_fuel() {
        let counted = allowance(&ot(0.0, 0.0, DayType::Holiday));
        assert_eq!(counted.total(), MoneyCents::ZERO);

        let counted = allowance(&ot(0.0, 0.0, DayType::Work));
        assert_eq!(counted.total(), MoneyCents::new(9500));
    }
}
