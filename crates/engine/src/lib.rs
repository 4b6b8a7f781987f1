//! Pure core of the household hub.
//!
//! Everything in this crate is a function of its inputs: rows decoded from
//! the remote sheet, a date window and the payroll settings. There is no I/O
//! and no hidden clock; "today" always comes from a [`Clock`].
//!
//! - [`cycle`] month keys and the pay cycle window.
//! - [`classify`] record kinds and allowance eligibility.
//! - [`records`] decoding of positional sheet rows.
//! - [`ledger`] month summaries, chart series, OT cycle summary, next due.
//! - [`plans`] installment plan grouping.
//! - [`car`] car loan schedule.
//! - [`drafts`] validated user input turned into write intents.

pub use clock::{Clock, FixedClock, SystemClock};
pub use cycle::{MonthKey, PayCycle, PayCycleWindow};
pub use error::EngineError;
pub use money::MoneyCents;
pub use records::{CarInstallment, LedgerRecord, OtRecord, RecordKind, Settled};
pub use settings::PayrollSettings;

pub mod car;
pub mod classify;
mod clock;
pub mod cycle;
pub mod drafts;
mod error;
pub mod ledger;
mod money;
pub mod plans;
pub mod records;
pub mod settings;

pub type ResultEngine<T> = Result<T, EngineError>;
