//! One-shot aggregation from the command line.
//!
//! hub_dump [REGISTRY_URL] [--type T] [--keys a,b] [--limit N]
//!          [--points [--mode close|volume|rsi] [--auto] [--from D] [--to D]
//!                    [--resample weekly|monthly] [--max-points N]]
//!
//! Without `--points` the aggregation payload is printed as JSON; with it,
//! each loaded series is projected to chart points. `--auto` charts the
//! densest numeric column of non-equity series instead of the first listed
//! value column.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use sheetshub::{
    aggregate::Aggregator,
    fetch::Fetcher,
    projection::{
        auto_value_col, equity_view, parse_date, project, rsi_companions, DateRange, EquityMode,
        ProjectionOptions, Resample, Point, DEFAULT_MAX_POINTS,
    },
    telemetry::init_tracing,
    AggregationResult, Config, Filters,
};
use std::env;
use tracing::info;

#[derive(Debug, Default)]
struct Args {
    registry: Option<String>,
    type_filter: Option<String>,
    keys: Option<String>,
    limit: Option<String>,
    points: bool,
    mode: EquityMode,
    auto: bool,
    from: Option<String>,
    to: Option<String>,
    resample: Resample,
    max_points: Option<usize>,
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().with_context(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--type" => args.type_filter = Some(value("--type")?),
            "--keys" => args.keys = Some(value("--keys")?),
            "--limit" => args.limit = Some(value("--limit")?),
            "--points" => args.points = true,
            "--auto" => args.auto = true,
            "--mode" => args.mode = value("--mode")?.parse()?,
            "--from" => args.from = Some(value("--from")?),
            "--to" => args.to = Some(value("--to")?),
            "--resample" => args.resample = value("--resample")?.parse()?,
            "--max-points" => {
                args.max_points = Some(value("--max-points")?.parse().context("--max-points")?)
            }
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            _ if args.registry.is_none() => args.registry = Some(arg),
            _ => bail!("unexpected argument {}", arg),
        }
    }
    Ok(args)
}

fn parse_bound(raw: Option<&str>, flag: &str) -> Result<Option<chrono::NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .with_context(|| format!("{} is not a date: {:?}", flag, s)),
    }
}

#[derive(Serialize)]
struct Chart<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    key: &'a str,
    label: String,
    points: Vec<Point>,
}

fn charts<'a>(result: &'a AggregationResult, args: &Args) -> Result<Vec<Chart<'a>>> {
    let opts = ProjectionOptions {
        range: DateRange::new(
            parse_bound(args.from.as_deref(), "--from")?,
            parse_bound(args.to.as_deref(), "--to")?,
        ),
        resample: args.resample,
        max_points: args.max_points.unwrap_or(DEFAULT_MAX_POINTS),
    };
    let companions = rsi_companions(result.loaded());

    Ok(result
        .loaded()
        .map(|s| {
            let (label, points) = if s.kind == "equity" {
                let v = equity_view(s, args.mode, &companions, &opts);
                (v.label, v.points)
            } else {
                let value_col = args.auto.then(|| auto_value_col(s));
                (s.label().to_string(), project(s, value_col, &opts))
            };
            Chart {
                kind: &s.kind,
                key: &s.key,
                label,
                points,
            }
        })
        .collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    let args = parse_args(env::args().skip(1))?;
    let registry = args.registry.clone().or_else(|| config.index_csv.clone());

    let aggregator = Aggregator::new(Fetcher::from_config(&config)?, config.fetch_concurrency);
    let filters = Filters::new(
        args.type_filter.as_deref(),
        args.keys.as_deref(),
        args.limit.as_deref(),
    );
    let result = aggregator.aggregate(registry.as_deref(), &filters).await?;
    info!(
        items = result.items.len(),
        failed = result.failures(),
        "aggregated"
    );

    let out = if args.points {
        serde_json::to_string_pretty(&charts(&result, &args)?)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", out);
    Ok(())
}
