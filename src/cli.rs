//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvMarketData;
use crate::adapters::csv_output_adapter::{CsvTelemetryWriter, write_instructions};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sim_broker::SimBroker;
use crate::domain::config_validation::{
    parse_date, validate_logging_config, validate_run_config, validate_strategy_config,
};
use crate::domain::error::StrategyError;
use crate::domain::factor::{DEFAULT_EVENT_LOOKBACK, DEFAULT_LIQUIDITY_WINDOW};
use crate::domain::simulation::{
    SimulationConfig, SimulationSummary, run_simulation, screen_date,
};
use crate::domain::strategy::StrategyConfig;
use crate::logging::{DEFAULT_FORMAT, DEFAULT_LEVEL, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::telemetry_port::NullTelemetry;

#[derive(Parser, Debug)]
#[command(
    name = "buyback-drift",
    about = "Daily buyback-before-earnings equity strategy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the strategy over a date range of file data
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [run] start_date
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Overrides [run] end_date
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Overrides [output] instructions
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print universe, longs and candidates for one date
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            start,
            end,
            output,
        } => run_strategy(&config, start, end, output.as_deref()),
        Command::Screen { config, date } => run_screen(&config, date),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn start_logging(adapter: &dyn ConfigPort) {
    let level = adapter
        .get_string("logging", "level")
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let format = adapter
        .get_string("logging", "format")
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string());
    init_logging(&level, &format);
}

fn count_param<T: TryFrom<i64>>(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    minimum: i64,
) -> Result<T, StrategyError> {
    let value = adapter.get_int(section, key, default);
    if value < minimum {
        return Err(StrategyError::config_invalid(
            section,
            key,
            format!("{key} must be at least {minimum}"),
        ));
    }
    T::try_from(value)
        .map_err(|_| StrategyError::config_invalid(section, key, format!("{key} is out of range")))
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, StrategyError> {
    let defaults = StrategyConfig::default();
    let screen_defaults = defaults.screen.clone();

    let mut config = StrategyConfig {
        name: adapter
            .get_string("strategy", "name")
            .unwrap_or(defaults.name),
        holding_period: count_param(
            adapter,
            "strategy",
            "holding_period",
            i64::from(defaults.holding_period),
            1,
        )?,
        liquidity_window: count_param(
            adapter,
            "universe",
            "liquidity_window",
            DEFAULT_LIQUIDITY_WINDOW as i64,
            1,
        )?,
        event_lookback: count_param(
            adapter,
            "signal",
            "event_lookback",
            DEFAULT_EVENT_LOOKBACK,
            1,
        )?,
        materiality_threshold: adapter.get_double(
            "signal",
            "materiality_threshold",
            defaults.materiality_threshold,
        ),
        screen: screen_defaults.clone(),
    };

    config.screen.min_dollar_volume = adapter.get_double(
        "universe",
        "min_dollar_volume",
        screen_defaults.min_dollar_volume,
    );
    config.screen.min_adjusted_dollar_volume = adapter.get_double(
        "universe",
        "min_adjusted_dollar_volume",
        screen_defaults.min_adjusted_dollar_volume,
    );
    config.screen.min_market_cap =
        adapter.get_double("universe", "min_market_cap", screen_defaults.min_market_cap);
    config.screen.max_liquidity_rank = count_param(
        adapter,
        "universe",
        "max_liquidity_rank",
        screen_defaults.max_liquidity_rank as i64,
        1,
    )?;
    if let Some(code) = adapter
        .get_string("universe", "common_stock_code")
        .filter(|s| !s.trim().is_empty())
    {
        config.screen.common_stock_code = code.trim().to_string();
    }
    config.screen.max_event_window = count_param(
        adapter,
        "signal",
        "max_event_window",
        screen_defaults.max_event_window,
        0,
    )?;

    Ok(config)
}

pub fn build_simulation_config(
    adapter: &dyn ConfigPort,
    start_override: Option<NaiveDate>,
    end_override: Option<NaiveDate>,
) -> Result<SimulationConfig, StrategyError> {
    let start_date = match start_override {
        Some(d) => d,
        None => parse_date(adapter.get_string("run", "start_date").as_deref(), "start_date")?,
    };
    let end_date = match end_override {
        Some(d) => d,
        None => parse_date(adapter.get_string("run", "end_date").as_deref(), "end_date")?,
    };
    if start_date > end_date {
        return Err(StrategyError::config_invalid(
            "run",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(SimulationConfig {
        start_date,
        end_date,
    })
}

pub fn load_market_data(adapter: &dyn ConfigPort) -> Result<CsvMarketData, StrategyError> {
    let snapshots = PathBuf::from(adapter.require_string("data", "snapshots")?);
    let events = adapter
        .get_string("data", "events")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    CsvMarketData::load(&snapshots, events.as_deref())
}

fn run_strategy(
    config_path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match execute_run(&adapter, start, end, output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// The `run` pipeline against an already loaded config.
pub fn execute_run(
    adapter: &dyn ConfigPort,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<SimulationSummary, StrategyError> {
    validate_strategy_config(adapter)?;
    validate_logging_config(adapter)?;
    start_logging(adapter);

    let strategy_config = build_strategy_config(adapter)?;
    let sim = build_simulation_config(adapter, start, end)?;
    let instructions_path = match output {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(adapter.require_string("output", "instructions")?),
    };
    let telemetry_path = adapter
        .get_string("output", "telemetry")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let data = load_market_data(adapter)?;

    eprintln!(
        "Running {}: {} to {}",
        strategy_config.name, sim.start_date, sim.end_date
    );

    let mut broker = SimBroker::new();
    let summary = match telemetry_path {
        Some(path) => {
            let mut writer = CsvTelemetryWriter::create(&path)?;
            let (_, summary) =
                run_simulation(&data, &mut broker, &mut writer, strategy_config, &sim)?;
            writer.finish()?;
            eprintln!("Telemetry written to: {}", path.display());
            summary
        }
        None => {
            let (_, summary) =
                run_simulation(&data, &mut broker, &mut NullTelemetry, strategy_config, &sim)?;
            summary
        }
    };

    write_instructions(&instructions_path, broker.instructions())?;

    eprintln!("\n=== Run Summary ===");
    eprintln!("Warm-up days:     {}", summary.warmup_days);
    eprintln!("Trading days:     {}", summary.trading_days);
    eprintln!("Entries:          {}", summary.entries);
    eprintln!("Exits:            {}", summary.exits);
    eprintln!("Retried exits:    {}", summary.retried_liquidations);
    eprintln!("Max positions:    {}", summary.max_positions);
    eprintln!("Final positions:  {}", summary.final_positions);
    eprintln!("\nInstructions written to: {}", instructions_path.display());
    Ok(summary)
}

fn run_screen(config_path: &Path, date: NaiveDate) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = validate_strategy_config(&adapter)
        .and_then(|()| validate_logging_config(&adapter))
        .and_then(|()| {
            start_logging(&adapter);
            let config = build_strategy_config(&adapter)?;
            let data = load_market_data(&adapter)?;
            screen_date(&data, config, date)
        });

    let selection = match result {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Screen for {date}: {} securities", selection.screened);
    for (predicate, count) in &selection.rejections {
        eprintln!("  rejected by {predicate}: {count}");
    }

    for sid in &selection.universe {
        let tag = if selection.candidates.contains(sid) {
            "candidate"
        } else if selection.longs.contains(sid) {
            "long"
        } else {
            "universe"
        };
        println!("{sid}\t{tag}");
    }
    eprintln!(
        "{} in universe, {} longs, {} candidates",
        selection.universe.len(),
        selection.longs.len(),
        selection.candidates.len()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = validate_strategy_config(&adapter)
        .and_then(|()| validate_run_config(&adapter))
        .and_then(|()| build_strategy_config(&adapter));

    match result {
        Ok(config) => {
            eprintln!("\nStrategy:        {}", config.name);
            eprintln!("Holding period:  {} days", config.holding_period);
            eprintln!(
                "Liquidity:       {} day window, top {}",
                config.liquidity_window, config.screen.max_liquidity_rank
            );
            eprintln!("Event window:    {} days", config.screen.max_event_window);
            eprintln!("Materiality:     {}", config.materiality_threshold);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
