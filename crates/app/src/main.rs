use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tally::{Config, ExpenseInput, IncomeInput, Ledger};
use tally_core::{ExpenseId, FileKind, Money, MonthRange, StatementItemId};
use tally_storage::{create_db, ExpenseQuery, MonthlySummary, SortColumn, SortDirection};

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Shared expense ledger with bill-split import and card statement reconciliation"
)]
struct Cli {
    /// Configuration file (default: config.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a bill-split export (CSV or spreadsheet workbook)
    ImportBillSplit {
        file: PathBuf,
    },
    /// Store a card statement (CSV or spreadsheet workbook) and link the expenses it matches exactly
    Reconcile {
        file: PathBuf,
    },
    /// Unlinked statement lines that could belong to an expense
    Candidates {
        #[arg(long)]
        amount: Decimal,
        /// Expense date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Link an expense to a statement line by hand
    Link {
        #[arg(long)]
        expense: i64,
        #[arg(long)]
        item: i64,
        /// Defaults to the statement's file name
        #[arg(long)]
        label: Option<String>,
    },
    /// List expenses
    List {
        /// Description substring
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        reconciled: Option<bool>,
        /// YYYY-MM
        #[arg(short, long)]
        month: Option<MonthRange>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = ExpenseQuery::DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
        #[arg(long, value_enum, default_value_t = DirectionArg::Desc)]
        direction: DirectionArg,
    },
    /// Income, expenses and balance for one month
    Summary {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Record a manual expense
    AddExpense {
        description: String,
        #[arg(long)]
        amount: Decimal,
        /// Defaults to today (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        party_a: Option<Decimal>,
        #[arg(long)]
        party_b: Option<Decimal>,
    },
    /// Record an income
    AddIncome {
        description: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Defaults to OTHER
        #[arg(long)]
        origin: Option<String>,
    },
    /// Imported files, newest first
    Uploads {
        /// statement or bill-split
        #[arg(long, default_value = "statement")]
        kind: FileKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Date,
    Description,
    Category,
    Total,
    Reconciled,
}

impl From<SortArg> for SortColumn {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Date => SortColumn::Date,
            SortArg::Description => SortColumn::Description,
            SortArg::Category => SortColumn::Category,
            SortArg::Total => SortColumn::Total,
            SortArg::Reconciled => SortColumn::Reconciled,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Asc,
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Asc => SortDirection::Asc,
            DirectionArg::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Serialize)]
struct LabeledSummary<'a> {
    #[serde(flatten)]
    summary: MonthlySummary,
    party_a_name: &'a str,
    party_b_name: &'a str,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_upload(path: &Path) -> Result<(String, File)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, file))
}

async fn run(ledger: &Ledger, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::ImportBillSplit { file } => {
            let (name, data) = open_upload(&file)?;
            print_json(&ledger.import_bill_split_file(&name, data).await?)
        }
        Command::Reconcile { file } => {
            let (name, data) = open_upload(&file)?;
            print_json(&ledger.reconcile_file(&name, data).await?)
        }
        Command::Candidates { amount, date } => {
            print_json(&ledger.find_candidates(Money::from_decimal(amount), date).await?)
        }
        Command::Link {
            expense,
            item,
            label,
        } => print_json(
            &ledger
                .link_manually(ExpenseId(expense), StatementItemId(item), label.as_deref())
                .await?,
        ),
        Command::List {
            search,
            reconciled,
            month,
            page,
            page_size,
            sort,
            direction,
        } => {
            let query = ExpenseQuery {
                search,
                reconciled,
                month,
                page,
                page_size,
                sort: sort.into(),
                direction: direction.into(),
            };
            print_json(&ledger.list_expenses(&query).await?)
        }
        Command::Summary { year, month } => {
            let month = MonthRange::new(year, month)
                .with_context(|| format!("Invalid month: {year}-{month}"))?;
            print_json(&LabeledSummary {
                summary: ledger.monthly_summary(month).await?,
                party_a_name: &config.party_a_name,
                party_b_name: &config.party_b_name,
            })
        }
        Command::AddExpense {
            description,
            amount,
            date,
            category,
            currency,
            party_a,
            party_b,
        } => {
            let input = ExpenseInput {
                date,
                description,
                category,
                total_cost: Money::from_decimal(amount),
                currency,
                party_a_share: party_a.map(Money::from_decimal),
                party_b_share: party_b.map(Money::from_decimal),
            };
            print_json(&ledger.create_expense(input).await?)
        }
        Command::AddIncome {
            description,
            amount,
            date,
            origin,
        } => {
            let input = IncomeInput {
                date,
                description,
                amount: Money::from_decimal(amount),
                origin,
            };
            print_json(&ledger.create_income(input).await?)
        }
        Command::Uploads { kind } => print_json(&ledger.list_uploads(kind).await?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let db_path = config.database_path()?;
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let pool = create_db(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "database ready");

    let ledger = Ledger::new(pool, &config);
    run(&ledger, &config, cli.command).await
}
