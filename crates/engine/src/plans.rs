//! Installment plans: ledger rows sharing a plan id folded into one entity.
//!
//! The grouper never talks to the remote. Paying or deleting a plan only
//! produces [`WriteIntent`]s; the sync coordinator dispatches them.

use api_types::intent::WriteIntent;
use serde::Serialize;

use crate::{
    MoneyCents,
    money::percent,
    records::{LedgerRecord, Settled},
};

/// Members of one plan, ordered by installment index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstallmentPlan {
    pub plan_id: String,
    pub members: Vec<LedgerRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlanProgress {
    pub paid_count: usize,
    pub total_count: usize,
    pub percent: u8,
}

impl InstallmentPlan {
    fn first(&self) -> Option<&LedgerRecord> {
        self.members.first()
    }

    pub fn label(&self) -> &str {
        self.first().map_or("", |m| m.label.as_str())
    }

    /// Amount of one installment; every member carries the same amount.
    pub fn per_installment(&self) -> MoneyCents {
        self.first().map_or(MoneyCents::ZERO, |m| m.amount)
    }

    /// Card the plan is charged to. The sheet keeps it in the category column.
    pub fn card_id(&self) -> Option<&str> {
        self.first()
            .map(|m| m.category.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn progress(&self) -> PlanProgress {
        let paid_count = self.members.iter().filter(|m| m.paid).count();
        let total_count = self.members.len();
        PlanProgress {
            paid_count,
            total_count,
            percent: percent(paid_count as i64, total_count as i64),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.members.iter().all(|m| m.paid)
    }

    pub fn total_amount(&self) -> MoneyCents {
        self.members.iter().map(|m| m.amount).sum()
    }

    pub fn remaining_amount(&self) -> MoneyCents {
        self.members
            .iter()
            .filter(|m| !m.paid)
            .map(|m| m.amount)
            .sum()
    }

    /// Lowest-index unpaid member.
    pub fn next_unpaid_member(&self) -> Option<&LedgerRecord> {
        self.members.iter().find(|m| !m.is_paid())
    }

    /// Marks the next unpaid member as paid; `None` when the plan is complete.
    pub fn pay_next_intent(&self) -> Option<WriteIntent> {
        self.next_unpaid_member()
            .map(|member| WriteIntent::ToggleDebtPaid {
                id: member.id.clone(),
            })
    }

    /// One delete per member, lowest index first. Meant to be dispatched in
    /// order, one at a time.
    pub fn delete_intents(&self) -> Vec<WriteIntent> {
        self.members
            .iter()
            .map(|member| WriteIntent::DeleteDebt {
                id: member.id.clone(),
            })
            .collect()
    }
}

/// Groups installment members by plan id.
///
/// Plans come out in the order their first member appears; members are
/// sorted by installment index (stable for equal indices). Rows that are not
/// installment members are ignored.
pub fn group_plans(records: &[LedgerRecord]) -> Vec<InstallmentPlan> {
    let mut plans: Vec<InstallmentPlan> = Vec::new();
    for record in records.iter().filter(|r| r.is_installment()) {
        let Some(plan_id) = record.plan_id.as_deref() else {
            continue;
        };
        match plans.iter_mut().find(|p| p.plan_id == plan_id) {
            Some(plan) => plan.members.push(record.clone()),
            None => plans.push(InstallmentPlan {
                plan_id: plan_id.to_string(),
                members: vec![record.clone()],
            }),
        }
    }
    for plan in &mut plans {
        plan.members.sort_by_key(|m| m.installment_index);
    }
    plans
}

/// Monthly obligation of the plans that still have something to pay.
pub fn monthly_commitment(plans: &[InstallmentPlan]) -> MoneyCents {
    plans
        .iter()
        .filter(|plan| !plan.is_complete())
        .map(InstallmentPlan::per_installment)
        .sum()
}

pub fn find_plan<'a>(plans: &'a [InstallmentPlan], plan_id: &str) -> Option<&'a InstallmentPlan> {
    plans.iter().find(|plan| plan.plan_id == plan_id)
}
