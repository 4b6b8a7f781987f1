//! Wire contract shared by the core and the remote sheet script.
//!
//! The remote exposes one endpoint: `GET ?mode=<dataset>` returns a JSON
//! array of flat rows, `POST` accepts one [`intent::WriteIntent`] encoded as
//! `{"type": "...", ...fields}`.
use serde::{Deserialize, Serialize};

pub mod dataset {
    use super::*;

    /// Logical collection held by the remote store, also the local cache key.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Dataset {
        Car,
        Ot,
        Debt,
        Cards,
    }

    impl Dataset {
        pub const ALL: [Dataset; 4] = [Self::Car, Self::Ot, Self::Debt, Self::Cards];

        /// Returns the value of the `mode` query parameter.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Car => "car",
                Self::Ot => "ot",
                Self::Debt => "debt",
                Self::Cards => "cards",
            }
        }
    }

    impl std::fmt::Display for Dataset {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }
}

pub mod card {
    use super::*;

    /// A credit card as stored by the remote (`mode=cards`).
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreditCard {
        /// Server-assigned, stable identifier.
        pub card_id: String,
        pub name: String,
        /// Statement cutoff day, 1..=31.
        #[serde(rename = "cutOffDay")]
        pub statement_cutoff_day: u8,
    }
}

pub mod intent {
    use super::{dataset::Dataset, *};

    /// Day classification stored on OT rows.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum DayType {
        #[default]
        Work,
        Holiday,
    }

    impl DayType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Work => "work",
                Self::Holiday => "holiday",
            }
        }
    }

    /// One state-changing request understood by the remote.
    ///
    /// Amounts travel as decimal numbers; dates as `YYYY-MM-DD`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
    pub enum WriteIntent {
        /// Mark car installment `no` as paid.
        PayCar { no: u32 },
        AddOt {
            date: String,
            ot1: f64,
            ot15: f64,
            ot3: f64,
            note: String,
            day_type: DayType,
            salary: f64,
            deduct: f64,
            food: f64,
            gas: f64,
            food_ot: f64,
            incentive: f64,
        },
        /// OT rows have no id; the remote matches on date and 1x hours.
        DeleteOt { date: String, ot1: f64 },
        AddCard { name: String, cut_off_day: u8 },
        DeleteCard { card_id: String },
        AddDebt {
            date: String,
            debt_type: String,
            name: String,
            category: String,
            amount: f64,
            paid: bool,
            note: String,
        },
        AddCreditTxn {
            used_date: String,
            card_id: String,
            name: String,
            category: String,
            amount: f64,
        },
        /// The remote expands the plan into `months` member rows sharing a plan id.
        /// `category` carries the card id the plan is charged to (may be empty).
        AddInstallmentPlan {
            start_date: String,
            name: String,
            category: String,
            per_month: f64,
            months: u32,
        },
        DeleteDebt { id: String },
        DeleteDebtBulk { ids: Vec<String> },
        ToggleDebtPaid { id: String },
    }

    impl WriteIntent {
        /// Returns the wire `type` tag.
        pub fn kind(&self) -> &'static str {
            match self {
                Self::PayCar { .. } => "pay_car",
                Self::AddOt { .. } => "add_ot",
                Self::DeleteOt { .. } => "delete_ot",
                Self::AddCard { .. } => "add_card",
                Self::DeleteCard { .. } => "delete_card",
                Self::AddDebt { .. } => "add_debt",
                Self::AddCreditTxn { .. } => "add_credit_txn",
                Self::AddInstallmentPlan { .. } => "add_installment_plan",
                Self::DeleteDebt { .. } => "delete_debt",
                Self::DeleteDebtBulk { .. } => "delete_debt_bulk",
                Self::ToggleDebtPaid { .. } => "toggle_debt_paid",
            }
        }

        /// Datasets that must be re-read once this intent is applied.
        pub fn affects(&self) -> &'static [Dataset] {
            match self {
                Self::PayCar { .. } => &[Dataset::Car],
                Self::AddOt { .. } | Self::DeleteOt { .. } => &[Dataset::Ot],
                Self::AddCard { .. } | Self::DeleteCard { .. } => &[Dataset::Cards],
                Self::AddDebt { .. }
                | Self::AddCreditTxn { .. }
                | Self::AddInstallmentPlan { .. }
                | Self::DeleteDebt { .. }
                | Self::DeleteDebtBulk { .. }
                | Self::ToggleDebtPaid { .. } => &[Dataset::Debt],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dataset::Dataset, intent::*};

    #[test]
    fn intent_is_tagged_with_snake_case_type() {
        let intent = WriteIntent::AddCreditTxn {
            used_date: "2024-03-01".to_string(),
            card_id: "C1".to_string(),
            name: "Groceries".to_string(),
            category: String::new(),
            amount: 250.5,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "add_credit_txn");
        assert_eq!(json["usedDate"], "2024-03-01");
        assert_eq!(json["cardId"], "C1");
        assert_eq!(json["amount"], 250.5);
        assert_eq!(intent.kind(), "add_credit_txn");
    }

    #[test]
    fn add_ot_uses_remote_field_names() {
        let intent = WriteIntent::AddOt {
            date: "2024-03-10".to_string(),
            ot1: 0.0,
            ot15: 2.0,
            ot3: 0.0,
            note: String::new(),
            day_type: DayType::Holiday,
            salary: 18304.0,
            deduct: 1475.0,
            food: 40.0,
            gas: 55.0,
            food_ot: 30.0,
            incentive: 1000.0,
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "add_ot");
        assert_eq!(json["dayType"], "holiday");
        assert_eq!(json["foodOt"], 30.0);
        assert_eq!(intent.affects(), &[Dataset::Ot]);
    }

    #[test]
    fn dataset_mode_strings() {
        let modes: Vec<&str> = Dataset::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(modes, vec!["car", "ot", "debt", "cards"]);
        assert_eq!(serde_json::to_string(&Dataset::Cards).unwrap(), "\"cards\"");
    }
}
