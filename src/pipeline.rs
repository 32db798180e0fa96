//! Resolve, fetch, enrich, filter and summarize one symbol
//!
//! The run is strictly linear and stops at the first failing stage.

use chrono::{DateTime, Utc};

use crate::charts::{
    CandleQuery, DailyMove, DateRange, EnrichedCandle, MarketSource, MarketSummary, MetricsCalculator,
    MoveSummary, PeriodChange, PriceRange, SourceKind,
};
use crate::error::{FetchError, FetchResult};
use crate::{log_debug, log_warn};

/// Post-fetch row filters
#[derive(Debug, Clone, Copy, Default)]
pub struct Filters {
    pub dates: DateRange,
    pub prices: PriceRange,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.prices.is_empty()
    }
}

/// What to fetch and how to post-process it
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    /// Symbol, pair or coin id as typed by the user
    pub input: String,
    pub query: CandleQuery,
    pub filters: Filters,
    /// Compute the daily breakdown and its averages
    pub daily: bool,
    /// Run the source's resolver; when false `input` is used verbatim
    pub resolve: bool,
}

impl PipelineRequest {
    pub fn new(input: impl Into<String>, query: CandleQuery) -> Self {
        Self {
            input: input.into(),
            query,
            filters: Filters::default(),
            daily: false,
            resolve: true,
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct Report {
    pub source: SourceKind,
    pub input: String,
    /// Source-native identifier the data was fetched for
    pub identifier: String,
    /// Enriched and filtered candles, ascending
    pub candles: Vec<EnrichedCandle>,
    pub summary: MarketSummary,
    /// Set when the quote call failed and `summary` was built from the candles
    pub summary_degraded: bool,
    pub daily: Option<Vec<DailyMove>>,
    pub averages: Option<MoveSummary>,
}

impl Report {
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|r| r.candle.close)
    }

    pub fn period_change(&self) -> Option<PeriodChange> {
        MetricsCalculator::period_change(&self.candles)
    }

    pub fn mean_close(&self) -> f64 {
        MetricsCalculator::mean_close(&self.candles)
    }

    /// First and last candle timestamps
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.candles.first()?;
        let last = self.candles.last()?;
        Some((first.candle.timestamp, last.candle.timestamp))
    }
}

/// Run the whole pipeline against `source`
pub fn run(source: &dyn MarketSource, request: &PipelineRequest) -> FetchResult<Report> {
    let kind = source.kind();

    let identifier = if request.resolve {
        source.resolve_identifier(&request.input)?
    } else {
        request.input.trim().to_string()
    };
    log_debug!("pipeline", "Resolved identifier", source = kind, input = request.input, identifier = identifier);

    let candles = source.fetch_candles(&identifier, &request.query)?;
    if candles.is_empty() {
        return Err(FetchError::no_data(format!("No data returned from {}", kind)));
    }

    let mut rows = MetricsCalculator::enrich(candles);

    if !request.filters.dates.is_empty() {
        rows = MetricsCalculator::filter_date_range(rows, &request.filters.dates);
        if rows.is_empty() {
            return Err(FetchError::no_data("No data found in the specified date range"));
        }
    }

    if !request.filters.prices.is_empty() {
        rows = MetricsCalculator::filter_price_range(rows, &request.filters.prices);
        if rows.is_empty() {
            return Err(FetchError::no_data("No data found in the specified price range"));
        }
    }

    let (summary, summary_degraded) = match source.fetch_summary_stats(&identifier) {
        Ok(summary) => (summary, false),
        Err(e) if source.summary_is_optional() => {
            log_warn!("pipeline", "Quote unavailable, using last close", source = kind, error = e);
            let last_close = rows.last().map(|r| r.candle.close).unwrap_or(f64::NAN);
            (MarketSummary::from_last_close(&identifier, last_close), true)
        }
        Err(e) => return Err(e),
    };

    let (daily, averages) = if request.daily {
        let days = MetricsCalculator::daily_moves(&rows);
        let averages = MetricsCalculator::average_moves(&days);
        (Some(days), averages)
    } else {
        (None, None)
    };

    Ok(Report {
        source: kind,
        input: request.input.clone(),
        identifier,
        candles: rows,
        summary,
        summary_degraded,
        daily,
        averages,
    })
}
