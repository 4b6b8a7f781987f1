//! Typed projections of the remote sheet rows.
//!
//! The remote returns rows as JSON arrays indexed by column position (some
//! deployments return objects keyed by header instead). Both shapes are
//! decoded here, once, so the aggregators never index by position. Decoding
//! is lenient: a bad cell becomes a safe default, a row that is neither an
//! array nor an object is skipped.

use api_types::{card::CreditCard, intent::DayType};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    MoneyCents, classify,
    cycle::{self, MonthKey},
    money::lenient_number,
};

/// Status text the car sheet writes for a settled installment.
pub const CAR_PAID_STATUS: &str = "ชำระแล้ว";

/// Anything that can be settled: ledger rows, car installments.
pub trait Settled {
    fn is_paid(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Bill,
    Credit,
    InstallmentMember,
}

/// One row of the debt sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub id: String,
    /// Date text as stored remotely.
    pub raw_date: String,
    pub occurred_on: Option<NaiveDate>,
    /// Month bucket; `None` when the date is malformed.
    pub month: Option<MonthKey>,
    pub kind: RecordKind,
    pub label: String,
    pub category: String,
    pub amount: MoneyCents,
    pub paid: bool,
    pub note: String,
    pub plan_id: Option<String>,
    pub installment_index: u32,
    pub installment_count: u32,
}

impl Settled for LedgerRecord {
    fn is_paid(&self) -> bool {
        self.paid
    }
}

impl LedgerRecord {
    pub fn is_installment(&self) -> bool {
        self.kind == RecordKind::InstallmentMember
    }
}

/// One row of the OT sheet: a worked (or leave) day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OtRecord {
    pub raw_date: String,
    pub occurred_on: Option<NaiveDate>,
    pub hours_1x: f64,
    pub hours_1_5x: f64,
    pub hours_3x: f64,
    pub base_salary: MoneyCents,
    pub deduction: MoneyCents,
    pub meal_allowance: MoneyCents,
    pub meal_allowance_ot: MoneyCents,
    pub fuel_allowance: MoneyCents,
    pub note: String,
    pub day_type: DayType,
}

/// One row of the car loan schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CarInstallment {
    pub number: u32,
    pub raw_date: String,
    pub amount: MoneyCents,
    pub paid: bool,
}

impl Settled for CarInstallment {
    fn is_paid(&self) -> bool {
        self.paid
    }
}

enum Row<'a> {
    Positional(&'a [Value]),
    Named(&'a Map<String, Value>),
}

impl<'a> Row<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(cells) => Some(Self::Positional(cells)),
            Value::Object(fields) => Some(Self::Named(fields)),
            _ => None,
        }
    }

    fn cell(&self, position: usize, name: &str) -> Option<&'a Value> {
        match self {
            Self::Positional(cells) => cells.get(position),
            Self::Named(fields) => fields.get(name),
        }
    }

    fn text(&self, position: usize, name: &str) -> String {
        match self.cell(position, name) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    fn number(&self, position: usize, name: &str) -> f64 {
        lenient_number(self.cell(position, name))
    }

    fn money(&self, position: usize, name: &str) -> MoneyCents {
        MoneyCents::lenient(self.cell(position, name))
    }

    fn count(&self, position: usize, name: &str) -> u32 {
        let n = self.number(position, name);
        if n <= 0.0 { 0 } else { n.round() as u32 }
    }

    fn flag(&self, position: usize, name: &str) -> bool {
        match self.cell(position, name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")
            }
            _ => false,
        }
    }
}

/// Decodes the `debt` dataset.
///
/// Columns: `[0]=id [1]=date [2]=type [3]=name [4]=category [5]=amount
/// [6]=paid [7]=note [8]=planId [9]=installmentNo [10]=installmentTotal`.
pub fn decode_ledger(rows: &[Value], tz: Tz) -> Vec<LedgerRecord> {
    rows.iter()
        .filter_map(Row::from_value)
        .map(|row| {
            let raw_date = row.text(1, "date");
            let occurred_on = cycle::parse_date(&raw_date, tz);
            let month = occurred_on
                .map(MonthKey::of)
                .or_else(|| cycle::month_key(&raw_date));
            let plan_id = Some(row.text(8, "planId")).filter(|id| !id.is_empty());
            let source_type = row.text(2, "type");
            LedgerRecord {
                id: row.text(0, "id"),
                raw_date,
                occurred_on,
                month,
                kind: classify::ledger_kind(&source_type, plan_id.as_deref()),
                label: row.text(3, "name"),
                category: row.text(4, "category"),
                amount: row.money(5, "amount"),
                paid: row.flag(6, "paid"),
                note: row.text(7, "note"),
                plan_id,
                installment_index: row.count(9, "installmentNo"),
                installment_count: row.count(10, "installmentTotal"),
            }
        })
        .collect()
}

/// Decodes the `ot` dataset.
///
/// Columns: `[0]=date [1]=ot1 [2]=ot1.5 [3]=ot3 [4]=salary [5]=deduct
/// [6]=food [7]=foodOt [8]=gas [9]=note [10]=dayType`.
pub fn decode_ot(rows: &[Value], tz: Tz) -> Vec<OtRecord> {
    rows.iter()
        .filter_map(Row::from_value)
        .map(|row| {
            let raw_date = row.text(0, "date");
            let day_type = if row.text(10, "dayType").eq_ignore_ascii_case("holiday") {
                DayType::Holiday
            } else {
                DayType::Work
            };
            OtRecord {
                occurred_on: cycle::parse_date(&raw_date, tz),
                raw_date,
                hours_1x: row.number(1, "ot1"),
                hours_1_5x: row.number(2, "ot15"),
                hours_3x: row.number(3, "ot3"),
                base_salary: row.money(4, "salary"),
                deduction: row.money(5, "deduct"),
                meal_allowance: row.money(6, "food"),
                meal_allowance_ot: row.money(7, "foodOt"),
                fuel_allowance: row.money(8, "gas"),
                note: row.text(9, "note"),
                day_type,
            }
        })
        .collect()
}

/// Decodes the `car` dataset: `[0]=no [1]=date [2]=amount [3]=status`.
pub fn decode_car(rows: &[Value]) -> Vec<CarInstallment> {
    rows.iter()
        .filter_map(Row::from_value)
        .map(|row| {
            let status = row.text(3, "status");
            CarInstallment {
                number: row.count(0, "no"),
                raw_date: row.text(1, "date"),
                amount: row.money(2, "amount"),
                paid: status == CAR_PAID_STATUS
                    || status.eq_ignore_ascii_case("paid")
                    || status.eq_ignore_ascii_case("yes"),
            }
        })
        .collect()
}

/// Decodes the `cards` dataset (objects with `cardId`, `name`, `cutOffDay`).
///
/// Rows without a card id are dropped; an unusable cutoff day becomes 0.
pub fn decode_cards(rows: &[Value]) -> Vec<CreditCard> {
    rows.iter()
        .filter_map(Row::from_value)
        .filter_map(|row| {
            let card_id = row.text(0, "cardId");
            if card_id.is_empty() {
                return None;
            }
            let day = row.count(2, "cutOffDay");
            Some(CreditCard {
                card_id,
                name: row.text(1, "name"),
                statement_cutoff_day: if day <= 31 { day as u8 } else { 0 },
            })
        })
        .collect()
}
