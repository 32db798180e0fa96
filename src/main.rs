//! Intraday Fetcher CLI
//!
//! Fetches OHLC candles from Binance, CoinGecko or CoinMarketCap, prints a
//! summary and candle table, and optionally exports chart-feed JSON or CSV.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use intraday_fetcher::charts::binance::{self, DEFAULT_INTERVAL, DEFAULT_LIMIT, DEFAULT_QUOTE_ASSET};
use intraday_fetcher::charts::coinmarketcap::day_window;
use intraday_fetcher::charts::{
    source_for, BinanceClient, CandleQuery, CoinGeckoDays, DateRange, MetricsCalculator, PriceRange, SourceKind,
};
use intraday_fetcher::config::AppConfig;
use intraday_fetcher::output::report::{average_lines, rule, summary_lines};
use intraday_fetcher::output::table::{candle_table, daily_table};
use intraday_fetcher::output::{format, to_chart_feed, write_chart_feed, write_csv};
use intraday_fetcher::pipeline::{self, Filters, PipelineRequest, Report};
use intraday_fetcher::utils::logging;
use intraday_fetcher::{log_info, FetchError};

#[derive(Parser)]
#[command(name = "intraday-fetcher", version)]
#[command(about = "Fetch intraday OHLC data from Binance, CoinGecko or CoinMarketCap", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Output options shared by every source
#[derive(clap::Args)]
struct OutputArgs {
    /// Number of candles to display
    #[arg(short, long, default_value_t = 20)]
    rows: usize,

    /// Export chart-feed JSON to FILE
    #[arg(short, long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Export the full table as CSV to FILE
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Intraday klines from Binance
    Binance {
        /// Trading pair (e.g., BTCUSDT)
        symbol: Option<String>,

        /// Kline interval (1m, 5m, 15m, 1h, 4h, 1d, ...)
        #[arg(short, long, default_value = DEFAULT_INTERVAL)]
        interval: String,

        /// Number of candles to fetch (max 1000)
        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,

        /// List USDT trading pairs and exit
        #[arg(long)]
        list_symbols: bool,

        /// Also aggregate candles into daily moves
        #[arg(long)]
        daily: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// OHLC candles from CoinGecko
    Coingecko {
        /// Coin symbol or pair (e.g., BTC, ETHUSDT, bitcoin)
        symbol: Option<String>,

        /// Days of history (1, 7, 14, 30, 90, 180, 365 or max)
        #[arg(short, long, default_value = "1")]
        days: CoinGeckoDays,

        /// CoinGecko coin id, skipping symbol resolution
        #[arg(long)]
        coin_id: Option<String>,

        /// Keep candles on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// Keep candles on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Keep candles whose high reached at least this price
        #[arg(long)]
        min_price: Option<f64>,

        /// Keep candles whose low reached at most this price
        #[arg(long)]
        max_price: Option<f64>,

        /// Resolve symbols offline only
        #[arg(long)]
        no_search: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Daily quotes from CoinMarketCap
    Cmc {
        /// Coin symbol (e.g., BTC)
        symbol: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,

        /// API key (defaults to $CMC_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init("warn", cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let config = AppConfig::from_env()?;

    match command {
        Commands::Binance {
            symbol,
            interval,
            limit,
            list_symbols,
            daily,
            output,
        } => {
            if list_symbols {
                let client = BinanceClient::new(&config.binance_url)?;
                let symbols = client.fetch_symbols(DEFAULT_QUOTE_ASSET, limit as usize)?;
                println!("Available {} pairs ({}):", DEFAULT_QUOTE_ASSET, symbols.len());
                for symbol in symbols {
                    println!("  {symbol}");
                }
                return Ok(());
            }
            let Some(symbol) = symbol else {
                return print_subcommand_help("binance");
            };
            binance::validate_interval(&interval)?;

            let query = CandleQuery {
                interval: Some(interval.clone()),
                limit: Some(limit),
                ..CandleQuery::default()
            };
            let mut request = PipelineRequest::new(symbol, query);
            request.daily = daily;

            let title = format!("BINANCE INTRADAY DATA ({interval})");
            execute(SourceKind::Binance, &config, &request, &title, &output)
        }

        Commands::Coingecko {
            symbol,
            days,
            coin_id,
            start_date,
            end_date,
            min_price,
            max_price,
            no_search,
            output,
        } => {
            let dates = DateRange::from_dates(start_date.as_deref(), end_date.as_deref())?;
            let prices = PriceRange { min: min_price, max: max_price };

            let (input, resolve) = match (coin_id, symbol) {
                (Some(id), _) => (id, false),
                (None, Some(symbol)) => (symbol, true),
                (None, None) => return print_subcommand_help("coingecko"),
            };

            let mut config = config;
            config.coingecko_search = config.coingecko_search && !no_search;

            let query = CandleQuery {
                days: Some(days),
                ..CandleQuery::default()
            };
            let filters = Filters { dates, prices };
            let mut request = PipelineRequest::new(input, query);
            request.resolve = resolve;
            request.daily = days.spans_multiple_days() || !filters.is_empty();
            request.filters = filters;

            let title = format!("COINGECKO OHLC DATA ({} days)", days);
            execute(SourceKind::CoinGecko, &config, &request, &title, &output)
        }

        Commands::Cmc {
            symbol,
            start_date,
            end_date,
            api_key,
            output,
        } => {
            let range = DateRange::from_dates(Some(&start_date), Some(&end_date))?;
            let (start, end) = day_window(&range)
                .ok_or_else(|| FetchError::invalid_input("Both --start-date and --end-date are required"))?;
            let config = config.with_api_key(api_key);

            let query = CandleQuery {
                start: Some(start),
                end: Some(end),
                ..CandleQuery::default()
            };
            let mut request = PipelineRequest::new(symbol, query);
            request.daily = true;

            let title = format!("COINMARKETCAP DAILY DATA ({start_date} to {end_date})");
            execute(SourceKind::CoinMarketCap, &config, &request, &title, &output)
        }
    }
}

fn print_subcommand_help(name: &str) -> Result<()> {
    let mut command = Cli::command();
    if let Some(sub) = command.find_subcommand_mut(name) {
        sub.print_help()?;
    }
    Ok(())
}

fn execute(
    kind: SourceKind,
    config: &AppConfig,
    request: &PipelineRequest,
    title: &str,
    output: &OutputArgs,
) -> Result<()> {
    let source = source_for(kind, config)?;
    log_info!("cli", "Fetching", source = kind, input = request.input);

    let report = pipeline::run(source.as_ref(), request)?;
    print_report(&report, title, output.rows);

    if let Some(path) = &output.export {
        let feed = to_chart_feed(&report.candles);
        write_chart_feed(path, &feed)?;
        println!("\nExported {} records to {}", feed.len(), path.display());
    }
    if let Some(path) = &output.csv {
        write_csv(path, &report.candles)?;
        println!("\nSaved {} rows to {}", report.candles.len(), path.display());
    }
    Ok(())
}

fn print_report(report: &Report, title: &str, rows: usize) {
    println!("{}", rule('='));
    println!("{title}");
    println!("{}", rule('='));
    for line in summary_lines(report) {
        println!("{line}");
    }
    if report.summary_degraded {
        println!("(live quote unavailable; current price is the last close)");
    }

    println!();
    println!("Last {} candles:", rows.min(report.candles.len()));
    println!("{}", candle_table(&report.candles, rows));

    if let Some(days) = &report.daily {
        println!();
        println!("{}", rule('-'));
        println!("DAILY MOVES");
        println!("{}", rule('-'));
        if !days.is_empty() {
            println!("{}", daily_table(days));
        }
        println!();
        let decimals = format::price_decimals(MetricsCalculator::mean_close(&report.candles));
        for line in average_lines(report.averages.as_ref(), decimals) {
            println!("{line}");
        }
    }
}
