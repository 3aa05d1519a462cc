use std::env;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use adaptive_grid::{GridState, Tile};

pub const USAGE: &str = "\
Usage: adaptive-grid --bench [options]

Simulates an infinite-scroll session against the grid engine.

Options:
  --items N       Total items available upstream (default: 2000)
  --page N        Items delivered per page (default: 100)
  --width W       Container width in px (default: 1920)
  --height H      Container height in px (default: 1080)
  --min-width M   Minimum item width in px (default: 220)
  --padding P     Gap between items and rows in px (default: 8)
  --buffer B      Rows from the end that trigger loading (default: 2)
  --step S        Scroll distance per frame in px (default: 120)";

#[derive(Debug, Clone)]
pub struct BenchmarkArgs {
    pub items: usize,
    pub page: usize,
    pub width: f64,
    pub height: f64,
    pub min_width: f64,
    pub padding: f64,
    pub buffer: usize,
    pub step: f64,
}

#[derive(Debug, Default)]
struct BenchmarkReport {
    rows: usize,
    delivered: usize,
    pages_loaded: usize,
    frames: usize,
    frame_p50_us: f64,
    frame_p95_us: f64,
    frame_max_us: f64,
    insert_avg_ms: f64,
    repack_ms: f64,
    resize_round_trip_ms: f64,
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("Missing value for {flag} in benchmark mode"))
}

fn parse_count(value: &str, flag: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .with_context(|| format!("Failed to parse {flag} as a non-negative integer"))
}

fn parse_px(value: &str, flag: &str) -> Result<f64> {
    let px = value
        .parse::<f64>()
        .with_context(|| format!("Failed to parse {flag} as a number"))?;
    if !px.is_finite() || px < 0.0 {
        bail!("{flag} must be a finite, non-negative number");
    }
    Ok(px)
}

pub fn maybe_parse_args() -> Result<Option<BenchmarkArgs>> {
    parse_args(env::args().skip(1))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<BenchmarkArgs>> {
    let mut benchmark = false;
    let mut parsed = BenchmarkArgs {
        items: 2000,
        page: 100,
        width: 1920.0,
        height: 1080.0,
        min_width: 220.0,
        padding: 8.0,
        buffer: 2,
        step: 120.0,
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bench" => benchmark = true,
            "--items" => parsed.items = parse_count(&next_value(&mut args, "--items")?, "--items")?,
            "--page" => parsed.page = parse_count(&next_value(&mut args, "--page")?, "--page")?,
            "--buffer" => {
                parsed.buffer = parse_count(&next_value(&mut args, "--buffer")?, "--buffer")?
            }
            "--width" => parsed.width = parse_px(&next_value(&mut args, "--width")?, "--width")?,
            "--height" => {
                parsed.height = parse_px(&next_value(&mut args, "--height")?, "--height")?
            }
            "--min-width" => {
                parsed.min_width =
                    parse_px(&next_value(&mut args, "--min-width")?, "--min-width")?
            }
            "--padding" => {
                parsed.padding = parse_px(&next_value(&mut args, "--padding")?, "--padding")?
            }
            "--step" => parsed.step = parse_px(&next_value(&mut args, "--step")?, "--step")?,
            other => bail!("Unknown argument: {other}"),
        }
    }

    if !benchmark {
        return Ok(None);
    }
    if parsed.page == 0 {
        bail!("--page must be greater than 0");
    }
    if parsed.step <= 0.0 {
        bail!("--step must be greater than 0");
    }
    if parsed.height <= 0.0 {
        bail!("--height must be greater than 0");
    }

    Ok(Some(parsed))
}

/// Deterministic mix of common photo and video shapes.
fn make_items(count: usize) -> Vec<Tile> {
    const SHAPES: [(f64, f64); 8] = [
        (1920.0, 1080.0),
        (1000.0, 1000.0),
        (1080.0, 1920.0),
        (2560.0, 1080.0),
        (4000.0, 3000.0),
        (3000.0, 4000.0),
        (6000.0, 2000.0),
        (1200.0, 1600.0),
    ];
    (0..count)
        .map(|i| {
            let (w, h) = SHAPES[(i * 7 + i / 3) % SHAPES.len()];
            Tile::new(w, h)
        })
        .collect()
}

pub fn run_benchmark(args: BenchmarkArgs) -> Result<i32> {
    let report = simulate_scroll(&args)?;
    println!("{}", render_report(&report));
    Ok(0)
}

/// Scrolls a fresh grid from top to bottom, loading pages as the engine asks.
fn simulate_scroll(args: &BenchmarkArgs) -> Result<BenchmarkReport> {
    let items = make_items(args.items);
    let mut state = GridState::builder()
        .min_width(args.min_width)
        .padding(args.padding)
        .buffer(args.buffer)
        .build()
        .context("Invalid grid configuration")?;

    info!(
        items = args.items,
        page = args.page,
        width = args.width,
        height = args.height,
        "Starting scroll benchmark"
    );

    let mut report = BenchmarkReport::default();
    let mut delivered = args.page.min(items.len());

    let repack_start = Instant::now();
    state.update_grid(
        &items[..delivered],
        args.width,
        args.height,
        0.0,
        delivered < items.len(),
    );
    report.repack_ms = repack_start.elapsed().as_secs_f64() * 1000.0;

    let mut frame_times_us = Vec::new();
    let mut insert_times_ms = Vec::new();
    let mut resized = false;
    let mut offset = 0.0f64;

    loop {
        state.update_offset(offset);
        let frame_start = Instant::now();
        let snapshot = state.get_state();
        frame_times_us.push(frame_start.elapsed().as_secs_f64() * 1_000_000.0);

        if snapshot.load_more_allowed && delivered < items.len() {
            let end = (delivered + args.page).min(items.len());
            let insert_start = Instant::now();
            state.insert_items(&items[delivered..end], end < items.len());
            insert_times_ms.push(insert_start.elapsed().as_secs_f64() * 1000.0);
            debug!(delivered = end, rows = state.grid().len(), "Page loaded");
            delivered = end;
            report.pages_loaded += 1;
            continue;
        }

        // Halfway through, shrink the window and restore it to exercise the layout cache.
        if !resized && delivered * 2 >= items.len() {
            resized = true;
            let resize_start = Instant::now();
            let more = delivered < items.len();
            state.update_grid(&items[..delivered], args.width * 0.75, args.height, offset, more);
            state.update_grid(&items[..delivered], args.width, args.height, offset, more);
            report.resize_round_trip_ms = resize_start.elapsed().as_secs_f64() * 1000.0;
        }

        // Scroll containers clamp at the bottom edge of the content.
        let max_offset = (snapshot.height - args.height).max(0.0);
        if offset >= max_offset {
            break;
        }
        offset = (offset + args.step).min(max_offset);
    }

    report.rows = state.grid().len();
    report.delivered = delivered;
    report.frames = frame_times_us.len();
    report.frame_p50_us = percentile(&frame_times_us, 0.50);
    report.frame_p95_us = percentile(&frame_times_us, 0.95);
    report.frame_max_us = frame_times_us.iter().copied().fold(0.0, f64::max);
    report.insert_avg_ms = average(&insert_times_ms);
    Ok(report)
}

fn render_report(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("rows:                 {}\n", report.rows));
    out.push_str(&format!("items delivered:      {}\n", report.delivered));
    out.push_str(&format!("pages loaded:         {}\n", report.pages_loaded));
    out.push_str(&format!("frames:               {}\n", report.frames));
    out.push_str(&format!("frame p50:            {:.2} us\n", report.frame_p50_us));
    out.push_str(&format!("frame p95:            {:.2} us\n", report.frame_p95_us));
    out.push_str(&format!("frame max:            {:.2} us\n", report.frame_max_us));
    out.push_str(&format!("insert avg:           {:.3} ms\n", report.insert_avg_ms));
    out.push_str(&format!("initial pack:         {:.3} ms\n", report.repack_ms));
    out.push_str(&format!(
        "resize round trip:    {:.3} ms",
        report.resize_round_trip_ms
    ));
    out
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let clamped = p.clamp(0.0, 1.0);
    let idx = ((sorted.len() - 1) as f64 * clamped).round() as usize;
    sorted[idx]
}
