//! `monthgrid` command line: inspect a bucket file's flattened layout and
//! resolve scroll offsets and months against it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::layout::{GalleryLayout, LayoutBuilder, SyncMode};
use crate::models::{DateBucketMap, GallerySlot, YearMonth};
use crate::position::MonthResolver;
use crate::ui::widget::{FixedCellGrid, GridGeometry, GridWidget};

const DEFAULT_COLUMNS: usize = 4;

pub const USAGE: &str = "\
usage:
  monthgrid inspect <buckets.json> [--columns N] [--sync <other.json>]
  monthgrid locate <buckets.json> --columns N --row-height PX (--scroll-top PX | --month YYYY-MM)
                   [--viewport-height PX]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Inspect(InspectArgs),
    Locate(LocateArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectArgs {
    pub path: PathBuf,
    pub columns: usize,
    pub sync: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocateArgs {
    pub path: PathBuf,
    pub columns: usize,
    pub row_height: f64,
    pub viewport_height: f64,
    pub target: LocateTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocateTarget {
    ScrollTop(f64),
    Month(YearMonth),
}

/// Parses arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(subcommand) = args.next() else {
        return Ok(Command::Help);
    };

    let mut path: Option<PathBuf> = None;
    let mut columns: Option<usize> = None;
    let mut sync: Option<PathBuf> = None;
    let mut row_height: Option<f64> = None;
    let mut viewport_height: f64 = 0.0;
    let mut scroll_top: Option<f64> = None;
    let mut month: Option<YearMonth> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--columns" => {
                let value = args.next().context("Missing value for --columns")?;
                columns = Some(
                    value
                        .parse::<usize>()
                        .context("Failed to parse --columns as a positive integer")?,
                );
            }
            "--sync" => {
                let value = args.next().context("Missing value for --sync")?;
                sync = Some(PathBuf::from(value));
            }
            "--row-height" => {
                let value = args.next().context("Missing value for --row-height")?;
                row_height = Some(
                    value
                        .parse::<f64>()
                        .context("Failed to parse --row-height as a number")?,
                );
            }
            "--viewport-height" => {
                let value = args.next().context("Missing value for --viewport-height")?;
                viewport_height = value
                    .parse::<f64>()
                    .context("Failed to parse --viewport-height as a number")?;
            }
            "--scroll-top" => {
                let value = args.next().context("Missing value for --scroll-top")?;
                scroll_top = Some(
                    value
                        .parse::<f64>()
                        .context("Failed to parse --scroll-top as a number")?,
                );
            }
            "--month" => {
                let value = args.next().context("Missing value for --month")?;
                month = Some(
                    value
                        .parse::<YearMonth>()
                        .with_context(|| format!("Failed to parse --month {value:?} as YYYY-MM"))?,
                );
            }
            "-h" | "--help" => return Ok(Command::Help),
            _ if arg.starts_with('-') => bail!("Unknown option {arg}"),
            _ => {
                if path.is_some() {
                    bail!("Unexpected argument {arg}");
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    if columns == Some(0) {
        bail!("--columns must be greater than 0");
    }

    match subcommand.as_str() {
        "inspect" => Ok(Command::Inspect(InspectArgs {
            path: path.context("inspect requires a bucket file")?,
            columns: columns.unwrap_or(DEFAULT_COLUMNS),
            sync,
        })),
        "locate" => {
            let path = path.context("locate requires a bucket file")?;
            let columns = columns.context("locate requires --columns")?;
            let row_height = row_height.context("locate requires --row-height")?;
            if row_height <= 0.0 {
                bail!("--row-height must be greater than 0");
            }
            let target = match (scroll_top, month) {
                (Some(top), None) => LocateTarget::ScrollTop(top),
                (None, Some(ym)) => LocateTarget::Month(ym),
                _ => bail!("locate requires exactly one of --scroll-top or --month"),
            };
            Ok(Command::Locate(LocateArgs {
                path,
                columns,
                row_height,
                viewport_height,
                target,
            }))
        }
        "help" | "-h" | "--help" => Ok(Command::Help),
        other => bail!("Unknown command {other:?}\n{USAGE}"),
    }
}

/// Reads a JSON object of `YYYY-MM-DD` to arrays of media ids.
pub fn load_buckets(path: &Path) -> Result<DateBucketMap> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bucket file {}", path.display()))?;
    let buckets: DateBucketMap = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse bucket file {}", path.display()))?;
    info!(path = %path.display(), dates = buckets.len(), "Loaded buckets");
    Ok(buckets)
}

/// Runs a command, printing `key=value` lines. Returns the exit code.
pub fn run(command: Command) -> Result<i32> {
    match command {
        Command::Help => {
            println!("{USAGE}");
            Ok(0)
        }
        Command::Inspect(args) => inspect(&args),
        Command::Locate(args) => locate(&args),
    }
}

fn inspect(args: &InspectArgs) -> Result<i32> {
    let buckets = load_buckets(&args.path)?;
    let other = args.sync.as_deref().map(load_buckets).transpose()?;
    let sync = match &other {
        Some(other) => SyncMode::Union(other),
        None => SyncMode::Off,
    };
    let layout = LayoutBuilder::new().build(&buckets, args.columns, sync);

    for line in summarize(&layout) {
        println!("{line}");
    }
    Ok(0)
}

/// Report lines for a layout: one summary line, then one line per month.
pub fn summarize(layout: &GalleryLayout) -> Vec<String> {
    let (mut media, mut missing, mut padding) = (0usize, 0usize, 0usize);
    for slot in &layout.slots {
        match slot {
            GallerySlot::Media { .. } => media += 1,
            GallerySlot::Missing { .. } => missing += 1,
            GallerySlot::Padding { .. } => padding += 1,
            GallerySlot::Separator { .. } => {}
        }
    }

    let mut lines = vec![format!(
        "columns={} slots={} rows={} months={} media={} missing={} padding={}",
        layout.columns,
        layout.len(),
        layout.row_count(),
        layout.index.month_count(),
        media,
        missing,
        padding
    )];
    for slot in &layout.slots {
        if let GallerySlot::Separator {
            year_month,
            label,
            flat_index,
        } = slot
        {
            lines.push(format!(
                "month={} label={:?} flat_index={} row={}",
                year_month,
                label,
                flat_index,
                layout.row_of(*flat_index)
            ));
        }
    }
    lines
}

fn locate(args: &LocateArgs) -> Result<i32> {
    let buckets = load_buckets(&args.path)?;
    let layout = LayoutBuilder::new().build(&buckets, args.columns, SyncMode::Off);
    match resolve(&layout, args) {
        Some(line) => {
            println!("{line}");
            Ok(0)
        }
        None => {
            println!("month=none");
            Ok(1)
        }
    }
}

/// Resolves the locate target against a layout through a headless grid.
pub fn resolve(layout: &GalleryLayout, args: &LocateArgs) -> Option<String> {
    let resolver = MonthResolver::default();
    let width = args.columns as f64 * args.row_height;
    let mut grid = FixedCellGrid::new(
        0,
        GridGeometry::new(width, args.viewport_height, args.row_height, args.columns),
    );
    grid.set_row_count(layout.row_count());

    match args.target {
        LocateTarget::ScrollTop(top) => {
            grid.scroll_to_offset(top);
            let month = resolver.current_month(&grid, layout)?;
            Some(format!(
                "scroll_top={} row={} month={}",
                grid.scroll_top(),
                grid.first_visible_row(),
                month
            ))
        }
        LocateTarget::Month(ym) => {
            let row = resolver.scroll_to_month(Some(&mut grid), layout, ym).ok()?;
            Some(format!(
                "month={} flat_index={} row={} scroll_top={}",
                ym,
                layout.index.flat_index_of(ym)?,
                row,
                grid.scroll_top()
            ))
        }
    }
}
