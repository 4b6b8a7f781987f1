//! User input turned into write intents.
//!
//! Validation happens here, before anything is sent: a draft that fails it
//! never reaches the remote.

use api_types::intent::{DayType, WriteIntent};
use chrono::NaiveDate;

use crate::{
    EngineError, MoneyCents, PayrollSettings, ResultEngine, classify,
    records::{LedgerRecord, OtRecord},
};

fn wire_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn required(value: &str, what: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{what} is required")));
    }
    Ok(trimmed.to_string())
}

fn positive(amount: MoneyCents, what: &str) -> ResultEngine<f64> {
    if !amount.is_positive() {
        return Err(EngineError::Validation(format!("{what} must be > 0")));
    }
    Ok(amount.to_decimal())
}

/// A bill or cash expense.
#[derive(Debug, Clone)]
pub struct BillDraft {
    pub date: NaiveDate,
    pub name: String,
    pub category: String,
    pub amount: MoneyCents,
    pub note: String,
}

impl BillDraft {
    pub fn into_intent(self) -> ResultEngine<WriteIntent> {
        Ok(WriteIntent::AddDebt {
            date: wire_date(self.date),
            debt_type: "bill".to_string(),
            name: required(&self.name, "name")?,
            category: self.category.trim().to_string(),
            amount: positive(self.amount, "amount")?,
            paid: false,
            note: self.note.trim().to_string(),
        })
    }
}

/// A purchase on a credit card.
#[derive(Debug, Clone)]
pub struct CreditTxnDraft {
    pub date: NaiveDate,
    pub card_id: String,
    pub name: String,
    pub category: String,
    pub amount: MoneyCents,
}

impl CreditTxnDraft {
    pub fn into_intent(self) -> ResultEngine<WriteIntent> {
        let name = required(&self.name, "name")?;
        let amount = positive(self.amount, "amount")?;
        Ok(WriteIntent::AddCreditTxn {
            used_date: wire_date(self.date),
            card_id: required(&self.card_id, "card")?,
            name,
            category: self.category.trim().to_string(),
            amount,
        })
    }
}

/// A purchase split into monthly installments, optionally on a card.
#[derive(Debug, Clone)]
pub struct InstallmentPlanDraft {
    pub start_date: NaiveDate,
    pub name: String,
    pub card_id: Option<String>,
    pub per_month: MoneyCents,
    pub months: u32,
}

impl InstallmentPlanDraft {
    /// What the plan will cost in total.
    pub fn preview_total(&self) -> MoneyCents {
        MoneyCents::new(
            self.per_month
                .cents()
                .saturating_mul(i64::from(self.months)),
        )
    }

    pub fn into_intent(self) -> ResultEngine<WriteIntent> {
        let name = required(&self.name, "name")?;
        let per_month = positive(self.per_month, "monthly amount")?;
        if self.months == 0 {
            return Err(EngineError::Validation(
                "number of months must be > 0".to_string(),
            ));
        }
        Ok(WriteIntent::AddInstallmentPlan {
            start_date: wire_date(self.start_date),
            name,
            category: self.card_id.unwrap_or_default().trim().to_string(),
            per_month,
            months: self.months,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CardDraft {
    pub name: String,
    pub cutoff_day: u32,
}

impl CardDraft {
    pub fn into_intent(self) -> ResultEngine<WriteIntent> {
        let name = required(&self.name, "card name")?;
        if !(1..=31).contains(&self.cutoff_day) {
            return Err(EngineError::Validation(
                "cutoff day must be between 1 and 31".to_string(),
            ));
        }
        Ok(WriteIntent::AddCard {
            name,
            cut_off_day: self.cutoff_day as u8,
        })
    }
}

/// One OT day as typed by the user.
#[derive(Debug, Clone)]
pub struct OtDraft {
    pub date: NaiveDate,
    pub hours_1x: f64,
    pub hours_1_5x: f64,
    pub hours_3x: f64,
    pub note: String,
    pub day_type: DayType,
}

impl OtDraft {
    /// Builds the row; current payroll settings are stored along with it and
    /// Sundays are recorded as holidays whatever was requested.
    pub fn into_intent(self, settings: &PayrollSettings) -> ResultEngine<WriteIntent> {
        for (hours, what) in [
            (self.hours_1x, "1x hours"),
            (self.hours_1_5x, "1.5x hours"),
            (self.hours_3x, "3x hours"),
        ] {
            if !hours.is_finite() || hours < 0.0 {
                return Err(EngineError::Validation(format!("{what} must be >= 0")));
            }
        }
        Ok(WriteIntent::AddOt {
            date: wire_date(self.date),
            ot1: self.hours_1x,
            ot15: self.hours_1_5x,
            ot3: self.hours_3x,
            note: self.note.trim().to_string(),
            day_type: classify::effective_day_type(self.date, self.day_type),
            salary: settings.salary.to_decimal(),
            deduct: settings.deduct.to_decimal(),
            food: settings.food.to_decimal(),
            gas: settings.gas.to_decimal(),
            food_ot: settings.food_ot.to_decimal(),
            incentive: settings.incentive.to_decimal(),
        })
    }
}

/// OT rows carry no id; the remote matches the stored date and 1x hours.
pub fn delete_ot(record: &OtRecord) -> WriteIntent {
    WriteIntent::DeleteOt {
        date: record.raw_date.clone(),
        ot1: record.hours_1x,
    }
}

pub fn delete_card(card_id: &str) -> ResultEngine<WriteIntent> {
    Ok(WriteIntent::DeleteCard {
        card_id: required(card_id, "card id")?,
    })
}

pub fn delete_debt(id: &str) -> ResultEngine<WriteIntent> {
    Ok(WriteIntent::DeleteDebt {
        id: required(id, "id")?,
    })
}

pub fn delete_debt_bulk(ids: &[String]) -> ResultEngine<WriteIntent> {
    let ids = ids
        .iter()
        .map(|id| required(id, "id"))
        .collect::<ResultEngine<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(EngineError::Validation("no ids to delete".to_string()));
    }
    Ok(WriteIntent::DeleteDebtBulk { ids })
}

pub fn toggle_paid(id: &str) -> ResultEngine<WriteIntent> {
    Ok(WriteIntent::ToggleDebtPaid {
        id: required(id, "id")?,
    })
}

/// Toggles for each record, in the order given.
pub fn pay_all_intents(records: &[&LedgerRecord]) -> Vec<WriteIntent> {
    records
        .iter()
        .map(|r| WriteIntent::ToggleDebtPaid { id: r.id.clone() })
        .collect()
}
