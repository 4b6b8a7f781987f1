use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, cycle::PayCycle};

/// Payroll figures used for the OT cycle summary and copied into new OT rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollSettings {
    /// Monthly base salary.
    pub salary: MoneyCents,
    /// Pay for one overtime hour at 1x.
    pub ot_rate: MoneyCents,
    /// Fixed monthly deductions.
    pub deduct: MoneyCents,
    /// Meal allowance for a worked day.
    pub food: MoneyCents,
    /// Extra meal allowance for a day with enough overtime.
    pub food_ot: MoneyCents,
    /// Fuel allowance for a worked day.
    pub gas: MoneyCents,
    /// Monthly diligence incentive.
    pub incentive: MoneyCents,
    /// Day of month on which a new pay cycle starts.
    pub boundary_day: u32,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        Self {
            salary: MoneyCents::new(18_304_00),
            ot_rate: MoneyCents::new(76_26),
            deduct: MoneyCents::new(1_475_00),
            food: MoneyCents::new(40_00),
            food_ot: MoneyCents::new(30_00),
            gas: MoneyCents::new(55_00),
            incentive: MoneyCents::new(1_000_00),
            boundary_day: crate::cycle::DEFAULT_BOUNDARY_DAY,
        }
    }
}

/// Names accepted by [`PayrollSettings::set`].
pub const SETTINGS_FIELDS: [&str; 8] = [
    "salary",
    "ot_rate",
    "deduct",
    "food",
    "food_ot",
    "gas",
    "incentive",
    "boundary_day",
];

impl PayrollSettings {
    pub fn pay_cycle(&self) -> Result<PayCycle, EngineError> {
        PayCycle::new(self.boundary_day)
    }

    /// Updates one field from user input.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), EngineError> {
        if field == "boundary_day" {
            let day: u32 = value
                .trim()
                .parse()
                .map_err(|_| EngineError::Validation(format!("invalid day: {value}")))?;
            PayCycle::new(day)?;
            self.boundary_day = day;
            return Ok(());
        }

        let amount: MoneyCents = value.parse()?;
        if amount.cents() < 0 {
            return Err(EngineError::Validation(format!("{field} must be >= 0")));
        }
        let slot = match field {
            "salary" => &mut self.salary,
            "ot_rate" => &mut self.ot_rate,
            "deduct" => &mut self.deduct,
            "food" => &mut self.food,
            "food_ot" => &mut self.food_ot,
            "gas" => &mut self.gas,
            "incentive" => &mut self.incentive,
            other => return Err(EngineError::Validation(format!("unknown setting: {other}"))),
        };
        *slot = amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_updates_known_fields() {
        let mut settings = PayrollSettings::default();
        settings.set("ot_rate", "80.5").unwrap();
        settings.set("boundary_day", "25").unwrap();
        assert_eq!(settings.ot_rate, MoneyCents::new(8050));
        assert_eq!(settings.boundary_day, 25);
    }

    #[test]
    fn set_rejects_unknown_or_invalid() {
        let mut settings = PayrollSettings::default();
        assert!(settings.set("bonus", "1").is_err());
        assert!(settings.set("food", "-1").is_err());
        assert_eq!(
            settings.set("boundary_day", "30"),
            Err(EngineError::InvalidBoundaryDay(30))
        );
        assert_eq!(settings, PayrollSettings::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: PayrollSettings = serde_json::from_str(r#"{"salary": 2000000}"#).unwrap();
        assert_eq!(settings.salary, MoneyCents::new(2_000_000));
        assert_eq!(settings.ot_rate, PayrollSettings::default().ot_rate);
    }
}
