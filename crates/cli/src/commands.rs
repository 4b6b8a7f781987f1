use api_types::{dataset::Dataset, intent::DayType};
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use engine::{
    Clock, MoneyCents, MonthKey, SystemClock, car, cycle, drafts,
    ledger::{self, StatusFilter},
    plans,
    records::{decode_car, decode_cards, decode_ledger, decode_ot},
};
use hub_sync::{CacheStore, Coordinator, EntryState, RemoteStore, SettingsStore};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    render,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh every dataset into the local cache.
    Sync,
    Car(Car),
    Ot(Ot),
    Debt(Debt),
    Plans(Plans),
    Cards(Cards),
}

#[derive(Args, Debug)]
pub struct Car {
    #[command(subcommand)]
    command: CarCommand,
}

#[derive(Subcommand, Debug)]
enum CarCommand {
    Show,
    /// Mark an installment paid; defaults to the next one due.
    Pay { no: Option<u32> },
}

#[derive(Args, Debug)]
pub struct Ot {
    #[command(subcommand)]
    command: OtCommand,
}

#[derive(Subcommand, Debug)]
enum OtCommand {
    /// Summary of the pay cycle containing `--date` (default today).
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Add(OtAddArgs),
    /// Delete the OT row of a day; `--ot1` picks between rows of the same day.
    Delete {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        ot1: Option<f64>,
    },
    Settings(OtSettings),
}

#[derive(Args, Debug)]
struct OtAddArgs {
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value_t = 0.0)]
    ot1: f64,
    #[arg(long, default_value_t = 0.0)]
    ot15: f64,
    #[arg(long, default_value_t = 0.0)]
    ot3: f64,
    #[arg(long, default_value = "")]
    note: String,
    #[arg(long)]
    holiday: bool,
}

#[derive(Args, Debug)]
struct OtSettings {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    Set { field: String, value: String },
}

#[derive(Args, Debug)]
pub struct Debt {
    #[command(subcommand)]
    command: DebtCommand,
}

#[derive(Subcommand, Debug)]
enum DebtCommand {
    Show(DebtShowArgs),
    /// Monthly totals over the last months.
    Chart,
    AddBill(BillArgs),
    AddCredit(CreditArgs),
    AddPlan(PlanArgs),
    Toggle { id: String },
    Delete { id: String },
    /// Mark every unpaid entry of the month as paid.
    PayMonth {
        #[arg(long)]
        month: Option<MonthKey>,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum StatusArg {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl From<StatusArg> for StatusFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => Self::All,
            StatusArg::Paid => Self::Paid,
            StatusArg::Unpaid => Self::Unpaid,
        }
    }
}

#[derive(Args, Debug)]
struct DebtShowArgs {
    #[arg(long, conflicts_with = "next_month")]
    month: Option<MonthKey>,
    #[arg(long)]
    next_month: bool,
    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    status: StatusArg,
}

#[derive(Args, Debug)]
struct BillArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Args, Debug)]
struct CreditArgs {
    #[arg(long)]
    card: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    category: String,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    per_month: MoneyCents,
    #[arg(long)]
    months: u32,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    card: Option<String>,
}

#[derive(Args, Debug)]
pub struct Plans {
    #[command(subcommand)]
    command: PlansCommand,
}

#[derive(Subcommand, Debug)]
enum PlansCommand {
    List,
    PayNext { plan_id: String },
    /// Delete every installment of the plan, one at a time.
    Delete { plan_id: String },
}

#[derive(Args, Debug)]
pub struct Cards {
    #[command(subcommand)]
    command: CardsCommand,
}

#[derive(Subcommand, Debug)]
enum CardsCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cutoff: u32,
    },
    Delete { card_id: String },
}

/// Everything a command needs: config, clock, sync coordinator and settings.
pub struct Hub<R> {
    config: AppConfig,
    clock: Box<dyn Clock>,
    sync: Coordinator<R>,
    settings: SettingsStore,
}

impl<R: RemoteStore> Hub<R> {
    pub fn new(config: AppConfig, remote: R) -> Result<Self> {
        let clock = SystemClock::from_name(&config.timezone)?;
        let cache = CacheStore::load_or_empty(config.cache_path());
        let settings = SettingsStore::load_or_default(config.settings_path());
        let sync = Coordinator::new(remote, cache, config.write_spacing());
        Ok(Self {
            config,
            clock: Box::new(clock),
            sync,
            settings,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn writable(&self) -> Result<()> {
        if self.config.offline {
            return Err(AppError::Usage(
                "writes are disabled in offline mode".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows to show: fresh when the remote answers, cached otherwise.
    async fn rows(&self, dataset: Dataset) -> Result<Vec<Value>> {
        if self.config.offline {
            return Ok(self.sync.cached(dataset).await);
        }
        let outcome = self.sync.read(dataset).await;
        match outcome.refresh.wait().await {
            Ok(_) => Ok(self.sync.cached(dataset).await),
            Err(err) if outcome.state != EntryState::Empty => {
                warn!(%dataset, error = %err, "showing cached rows");
                Ok(outcome.rows)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, intent: api_types::intent::WriteIntent) -> Result<()> {
        self.writable()?;
        self.sync.mutate(intent).await?;
        Ok(())
    }

    pub async fn run(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Sync => self.sync_all().await,
            Command::Car(Car { command }) => self.car(command).await,
            Command::Ot(Ot { command }) => self.ot(command).await,
            Command::Debt(Debt { command }) => self.debt(command).await,
            Command::Plans(Plans { command }) => self.plans(command).await,
            Command::Cards(Cards { command }) => self.cards(command).await,
        }
    }

    async fn sync_all(&self) -> Result<String> {
        if self.config.offline {
            return Err(AppError::Usage("cannot sync in offline mode".to_string()));
        }
        let mut lines = Vec::new();
        for handle in self.sync.prefetch_all() {
            let dataset = handle.dataset();
            match handle.wait().await {
                Ok(count) => lines.push(format!("{dataset}: {count} rows")),
                Err(err) => lines.push(format!("{dataset}: failed ({err})")),
            }
        }
        info!("sync finished");
        Ok(lines.join("\n"))
    }

    async fn car(&self, command: CarCommand) -> Result<String> {
        let schedule = decode_car(&self.rows(Dataset::Car).await?);
        let summary = car::car_summary(&schedule);
        match command {
            CarCommand::Show => Ok(render::car(&summary, &schedule)),
            CarCommand::Pay { no } => {
                let number = match no {
                    Some(no) if schedule.iter().any(|i| i.number == no) => no,
                    Some(no) => return Err(AppError::Usage(format!("no installment #{no}"))),
                    None => summary
                        .next
                        .as_ref()
                        .map(|next| next.number)
                        .ok_or_else(|| AppError::Usage("every installment is paid".to_string()))?,
                };
                self.write(car::pay_intent(number)).await?;
                Ok(format!("Installment #{number} marked as paid"))
            }
        }
    }

    async fn ot(&mut self, command: OtCommand) -> Result<String> {
        let tz = self.clock.timezone();
        match command {
            OtCommand::Show { date } => {
                let records = decode_ot(&self.rows(Dataset::Ot).await?, tz);
                let settings = self.settings.get();
                let window = settings
                    .pay_cycle()?
                    .window_containing(date.unwrap_or_else(|| self.today()));
                let summary = ledger::ot_cycle_summary(&records, window, settings);
                Ok(render::ot_cycle(&summary, settings))
            }
            OtCommand::Add(args) => {
                let date = args.date.unwrap_or_else(|| self.today());
                let draft = drafts::OtDraft {
                    date,
                    hours_1x: args.ot1,
                    hours_1_5x: args.ot15,
                    hours_3x: args.ot3,
                    note: args.note,
                    day_type: if args.holiday {
                        DayType::Holiday
                    } else {
                        DayType::Work
                    },
                };
                self.write(draft.into_intent(self.settings.get())?).await?;
                Ok(format!("OT on {date} saved"))
            }
            OtCommand::Delete { date, ot1 } => {
                let records = decode_ot(&self.rows(Dataset::Ot).await?, tz);
                let record = records
                    .iter()
                    .find(|r| {
                        r.occurred_on == Some(date)
                            && ot1.is_none_or(|hours| (r.hours_1x - hours).abs() < f64::EPSILON)
                    })
                    .ok_or_else(|| AppError::Usage(format!("no OT row on {date}")))?;
                self.write(drafts::delete_ot(record)).await?;
                Ok(format!("OT on {date} deleted"))
            }
            OtCommand::Settings(OtSettings { command }) => match command {
                SettingsCommand::Show => Ok(render::settings(self.settings.get())),
                SettingsCommand::Set { field, value } => {
                    let mut settings = self.settings.get().clone();
                    settings.set(&field, &value)?;
                    self.settings.replace(settings)?;
                    info!(%field, "payroll setting updated");
                    Ok(render::settings(self.settings.get()))
                }
            },
        }
    }

    async fn debt(&self, command: DebtCommand) -> Result<String> {
        let today = self.today();
        match command {
            DebtCommand::Show(args) => {
                let records = self.ledger().await?;
                let month = match args.month {
                    Some(month) => month,
                    None if args.next_month => cycle::next_month_key(today),
                    None => MonthKey::of(today),
                };
                let summary = ledger::month_summary(&records, month);
                let shown = ledger::filter_month(&records, month, args.status.into());
                let categories = ledger::category_totals(&records, month);
                Ok(render::month(month, &summary, &shown, &categories))
            }
            DebtCommand::Chart => {
                let records = self.ledger().await?;
                let months = cycle::last_n_month_keys(today, self.config.chart_months);
                Ok(render::chart(&ledger::chart_series(&records, &months)))
            }
            DebtCommand::AddBill(args) => {
                let draft = drafts::BillDraft {
                    date: args.date.unwrap_or(today),
                    name: args.name,
                    category: args.category,
                    amount: args.amount,
                    note: args.note,
                };
                self.write(draft.into_intent()?).await?;
                Ok("Bill added".to_string())
            }
            DebtCommand::AddCredit(args) => {
                let draft = drafts::CreditTxnDraft {
                    date: args.date.unwrap_or(today),
                    card_id: args.card,
                    name: args.name,
                    category: args.category,
                    amount: args.amount,
                };
                self.write(draft.into_intent()?).await?;
                Ok("Card purchase added".to_string())
            }
            DebtCommand::AddPlan(args) => {
                let draft = drafts::InstallmentPlanDraft {
                    start_date: args.start.unwrap_or(today),
                    name: args.name,
                    card_id: args.card,
                    per_month: args.per_month,
                    months: args.months,
                };
                let summary = format!(
                    "Plan added: {} x {} = {}",
                    draft.months,
                    draft.per_month,
                    draft.preview_total()
                );
                self.write(draft.into_intent()?).await?;
                Ok(summary)
            }
            DebtCommand::Toggle { id } => {
                self.write(drafts::toggle_paid(&id)?).await?;
                Ok(format!("{id} toggled"))
            }
            DebtCommand::Delete { id } => {
                self.write(drafts::delete_debt(&id)?).await?;
                Ok(format!("{id} deleted"))
            }
            DebtCommand::PayMonth { month } => {
                self.writable()?;
                let month = month.unwrap_or_else(|| MonthKey::of(today));
                let records = self.ledger().await?;
                let targets = ledger::unpaid_in_month(&records, month);
                if targets.is_empty() {
                    return Ok(format!("Nothing left to pay in {month}"));
                }
                let ack = self
                    .sync
                    .mutate_sequential(drafts::pay_all_intents(&targets))
                    .await;
                Ok(render::bulk(&format!("pay {month}"), &ack))
            }
        }
    }

    async fn plans(&self, command: PlansCommand) -> Result<String> {
        let records = self.ledger().await?;
        let grouped = plans::group_plans(&records);
        match command {
            PlansCommand::List => Ok(render::plans(
                &grouped,
                plans::monthly_commitment(&grouped),
            )),
            PlansCommand::PayNext { plan_id } => {
                let plan = plans::find_plan(&grouped, &plan_id)
                    .ok_or_else(|| AppError::Usage(format!("no plan {plan_id}")))?;
                let intent = plan
                    .pay_next_intent()
                    .ok_or_else(|| AppError::Usage(format!("plan {plan_id} is fully paid")))?;
                self.write(intent).await?;
                Ok(format!("Next installment of {} paid", plan.label()))
            }
            PlansCommand::Delete { plan_id } => {
                self.writable()?;
                let plan = plans::find_plan(&grouped, &plan_id)
                    .ok_or_else(|| AppError::Usage(format!("no plan {plan_id}")))?;
                let ack = self.sync.mutate_sequential(plan.delete_intents()).await;
                Ok(render::bulk(&format!("delete plan {plan_id}"), &ack))
            }
        }
    }

    async fn cards(&self, command: CardsCommand) -> Result<String> {
        match command {
            CardsCommand::List => {
                let cards = decode_cards(&self.rows(Dataset::Cards).await?);
                Ok(render::cards(&cards))
            }
            CardsCommand::Add { name, cutoff } => {
                let draft = drafts::CardDraft {
                    name,
                    cutoff_day: cutoff,
                };
                self.write(draft.into_intent()?).await?;
                Ok("Card added".to_string())
            }
            CardsCommand::Delete { card_id } => {
                self.write(drafts::delete_card(&card_id)?).await?;
                Ok(format!("Card {card_id} deleted"))
            }
        }
    }

    async fn ledger(&self) -> Result<Vec<engine::LedgerRecord>> {
        let rows = self.rows(Dataset::Debt).await?;
        Ok(decode_ledger(&rows, self.clock.timezone()))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        path::PathBuf,
        sync::{
            Mutex,
            atomic::{AtomicBool, Ordering},
        },
    };

    use api_types::intent::WriteIntent;
    use clap::Parser;
    use engine::FixedClock;
    use hub_sync::RemoteError;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct StubRemote {
        payloads: Mutex<HashMap<Dataset, Value>>,
        submitted: Mutex<Vec<WriteIntent>>,
        down: AtomicBool,
    }

    impl RemoteStore for StubRemote {
        async fn fetch(&self, dataset: Dataset) -> std::result::Result<Value, RemoteError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(RemoteError::Server {
                    status: 503,
                    message: "down".to_string(),
                });
            }
            Ok(self
                .payloads
                .lock()
                .unwrap()
                .get(&dataset)
                .cloned()
                .unwrap_or_else(|| json!([])))
        }

        async fn submit(&self, intent: &WriteIntent) -> std::result::Result<(), RemoteError> {
            self.submitted.lock().unwrap().push(intent.clone());
            Ok(())
        }
    }

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn command(args: &[&str]) -> Command {
        let argv = std::iter::once("hub").chain(args.iter().copied());
        TestCli::try_parse_from(argv).unwrap().command
    }

    fn temp_config(name: &str) -> AppConfig {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/hub_cli_tests");
        let tag = format!("{name}-{}", std::process::id());
        let cache = dir.join(format!("{tag}-cache.json"));
        let settings = dir.join(format!("{tag}-settings.json"));
        let _ = std::fs::remove_file(&cache);
        let _ = std::fs::remove_file(&settings);
        AppConfig {
            base_url: "http://unused.invalid/exec".to_string(),
            cache_path: cache.to_string_lossy().into_owned(),
            settings_path: settings.to_string_lossy().into_owned(),
            write_spacing_ms: 0,
            ..AppConfig::default()
        }
    }

    fn hub(name: &str, remote: StubRemote) -> Hub<StubRemote> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        Hub::new(temp_config(name), remote)
            .unwrap()
            .with_clock(FixedClock::new(today))
    }

    fn remote_with(dataset: Dataset, rows: Value) -> StubRemote {
        let remote = StubRemote::default();
        remote.payloads.lock().unwrap().insert(dataset, rows);
        remote
    }

    fn submitted(hub: &Hub<StubRemote>) -> Vec<WriteIntent> {
        hub.sync.remote().submitted.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn debt_show_filters_by_status() {
        let rows = json!([
            ["D1", "2024-03-02", "bill", "Water", "home", 300, "yes", "", "", "", ""],
            ["D2", "05/03/2024", "credit", "Shoes", "C1", 1290.5, "", "", "", "", ""],
            ["D3", "2024-04-01", "bill", "Rent", "home", 9000, "", "", "", "", ""],
        ]);
        let mut hub = hub("debt-show", remote_with(Dataset::Debt, rows));

        let out = hub
            .run(command(&["debt", "show", "--status", "unpaid"]))
            .await
            .unwrap();
        assert!(out.starts_with("2024-03: total ฿1590.50"));
        assert!(out.contains("D2"));
        assert!(!out.contains("D1 "));
        assert!(!out.contains("D3"));

        let out = hub
            .run(command(&["debt", "show", "--next-month"]))
            .await
            .unwrap();
        assert!(out.starts_with("2024-04: total ฿9000.00"));
    }

    #[tokio::test]
    async fn plan_delete_sends_members_in_order() {
        let rows = json!([
            ["M2", "2024-04-01", "installment", "Laptop", "C1", 2500, "", "", "P1", 2, 3],
            ["M1", "2024-03-01", "installment", "Laptop", "C1", 2500, "yes", "", "P1", 1, 3],
            ["M3", "2024-05-01", "installment", "Laptop", "C1", 2500, "", "", "P1", 3, 3],
        ]);
        let mut hub = hub("plan-delete", remote_with(Dataset::Debt, rows));

        let out = hub.run(command(&["plans", "list"])).await.unwrap();
        assert!(out.contains("1/3"));
        assert!(out.contains("Monthly commitment ฿2500.00"));

        let out = hub
            .run(command(&["plans", "delete", "P1"]))
            .await
            .unwrap();
        assert_eq!(out, "delete plan P1: 3 submitted");
        let ids: Vec<WriteIntent> = ["M1", "M2", "M3"]
            .into_iter()
            .map(|id| WriteIntent::DeleteDebt { id: id.to_string() })
            .collect();
        assert_eq!(submitted(&hub), ids);

        let err = hub
            .run(command(&["plans", "pay-next", "P9"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }

    #[tokio::test]
    async fn car_pay_defaults_to_next_due() {
        let rows = json!([
            [1, "2024-01-05", 8500, "ชำระแล้ว"],
            [2, "2024-02-05", 8500, ""],
            [3, "2024-03-05", 8500, ""],
        ]);
        let mut hub = hub("car-pay", remote_with(Dataset::Car, rows));

        let out = hub.run(command(&["car", "pay"])).await.unwrap();
        assert_eq!(out, "Installment #2 marked as paid");
        assert_eq!(submitted(&hub), vec![WriteIntent::PayCar { no: 2 }]);

        let err = hub.run(command(&["car", "pay", "9"])).await.unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
    }

    #[tokio::test]
    async fn pay_month_toggles_each_unpaid_entry() {
        let rows = json!([
            ["D1", "2024-03-02", "bill", "Water", "", 300, "", "", "", "", ""],
            ["D2", "2024-03-05", "bill", "Power", "", 800, "yes", "", "", "", ""],
            ["D3", "2024-03-09", "bill", "Net", "", 590, "", "", "", "", ""],
            ["M1", "2024-03-01", "installment", "Laptop", "", 2500, "", "", "P1", 1, 3],
        ]);
        let mut hub = hub("pay-month", remote_with(Dataset::Debt, rows));

        let out = hub.run(command(&["debt", "pay-month"])).await.unwrap();
        assert_eq!(out, "pay 2024-03: 2 submitted");
        assert_eq!(
            submitted(&hub),
            vec![
                WriteIntent::ToggleDebtPaid {
                    id: "D1".to_string()
                },
                WriteIntent::ToggleDebtPaid {
                    id: "D3".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn falls_back_to_cache_when_remote_is_down() {
        let rows = json!([["C1", "KBank", 25]]);
        let mut hub = hub("cards-fallback", remote_with(Dataset::Cards, rows));
        let out = hub.run(command(&["cards", "list"])).await.unwrap();
        assert!(out.contains("KBank"));

        hub.sync.remote().down.store(true, Ordering::SeqCst);
        let out = hub.run(command(&["cards", "list"])).await.unwrap();
        assert!(out.contains("KBank"));

        // Nothing cached for OT: the failure surfaces.
        assert!(matches!(
            hub.run(command(&["ot", "show"])).await,
            Err(AppError::Sync(_))
        ));
    }

    #[tokio::test]
    async fn offline_refuses_writes() {
        let mut config = temp_config("offline");
        config.offline = true;
        let mut hub = Hub::new(config, StubRemote::default()).unwrap();

        let err = hub
            .run(command(&["debt", "toggle", "D1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));
        assert!(submitted(&hub).is_empty());
        assert_eq!(
            hub.run(command(&["cards", "list"])).await.unwrap(),
            "No cards"
        );
    }

    #[tokio::test]
    async fn ot_settings_and_add() {
        let mut hub = hub("ot", StubRemote::default());
        hub.run(command(&["ot", "settings", "set", "food", "45"]))
            .await
            .unwrap();
        assert_eq!(hub.settings.get().food, MoneyCents::new(4_500));

        let err = hub
            .run(command(&["ot", "settings", "set", "boundary_day", "30"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Engine(_)));

        // 2024-03-10 is a Sunday.
        hub.run(command(&[
            "ot", "add", "--date", "2024-03-10", "--ot15", "2",
        ]))
        .await
        .unwrap();
        match &submitted(&hub)[0] {
            WriteIntent::AddOt { day_type, food, .. } => {
                assert_eq!(*day_type, DayType::Holiday);
                assert_eq!(*food, 45.0);
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }
}
