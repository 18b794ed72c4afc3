//! Runs the grid strategy over generated candles and prints the report.
//!
//! With the `serde` feature, a JSON candle series can be given as the first argument:
//! `cargo run --example grid --features serde -- kline.json`

use kline_backtest::prelude::*;

/// Generates deterministic daily candles around `base_price`.
fn generate_sample_candles(max: i64, seed: i64, base_price: f64) -> Vec<Candle> {
    let start = 1_577_836_800; // 2020-01-01
    let mut open = base_price;

    (0..=max)
        .map(|i| {
            // slow swing with a faster ripple on top
            let swing = 0.25 * base_price * (i as f64 * 0.02 + seed as f64).sin();
            let ripple = 0.04 * base_price * (i as f64 * 0.45 + seed as f64).sin();
            let close = (base_price + swing + ripple).max(0.1);
            let spread = 0.015 * close * ((i as f64 * 0.7).cos().abs() + 0.2);
            let high = open.max(close) + spread;
            let low = (open.min(close) - spread).max(0.01);
            let volume = 1_000_000.0 + 400_000.0 * (i as f64 * 0.2).sin().abs();

            let candle = CandleBuilder::builder()
                .timestamp(start + i * 86_400)
                .open(open)
                .close(close)
                .high(high)
                .low(low)
                .volume(volume)
                .amount(volume * (open + close) / 2.0)
                .change(close - open)
                .change_pct(open.change_percent(close))
                .build()
                .unwrap();

            open = close;
            candle
        })
        .collect()
}

fn load_series() -> Result<CandleSeries> {
    #[cfg(feature = "serde")]
    if let Some(path) = std::env::args().nth(1) {
        return read_series_from_file(path);
    }

    let series = CandleSeries::new("DEMO", "Generated ladder data", generate_sample_candles(1000, 7, 20.0))
        .with_update_time(chrono::Utc::now().timestamp());
    series.validate()?;
    Ok(series)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let series = load_series()?;
    let mut grid = GridStrategy::new(GridConfig {
        flow_step_up: 11.0,
        flow_step_down: -1.0,
        first_volume: 3000,
        max_cost: 100_000.0,
        min_retain: 100,
        volume: 200,
        expire_days: 120,
        ..GridConfig::default()
    })?;

    let account = Account::new("demo", 200_000.0)
        .with_note("grid ladder demo")
        .with_target(series.code());
    let mut sim = Simulation::new(account, series.to_data())?;
    if let Err(err) = sim.run(&mut grid) {
        eprintln!("{err}");
    }

    println!("{}", Report::new(sim.account(), &grid).with_series(&series));
    Ok(())
}
