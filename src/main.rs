//! GraphCalibrate - digitize chart images through a calibration box
//!
//! Command line front end: converts single coordinates, and turns CSV/JSON
//! point files into placed points or persisted curve records, using the
//! calibration stored in the configuration file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use graphcalibrate::config::Config;
use graphcalibrate::export::{self, CurveRecord};
use graphcalibrate::import;
use graphcalibrate::{CalibrationRegion, CoordinateTransform, LogRepresentation, PointSet};

/// GraphCalibrate - pixel/graph coordinate conversion for chart digitizing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "graphcalibrate.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the calibration and show the normalized box
    Check,

    /// Convert a pixel position to graph coordinates
    ToGraph {
        #[arg(allow_hyphen_values = true)]
        px: f64,
        #[arg(allow_hyphen_values = true)]
        py: f64,
    },

    /// Convert graph coordinates to a pixel position
    ToPixel {
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,

        /// Read logarithmic-axis values as exponents
        #[arg(long)]
        exponent: bool,
    },

    /// Place the points of a CSV/JSON file on the image
    Import {
        file: PathBuf,
    },

    /// Convert a CSV/JSON file into a curve record (JSON) or CSV
    Export {
        file: PathBuf,

        /// Output path; `.csv` writes CSV, anything else JSON. Stdout if omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Curve name stored in the record
        #[arg(short, long, default_value = "curve")]
        name: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("GraphCalibrate v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_create(&args.config)?;
    let calibration = config.calibration.to_region();

    match args.command {
        Command::Check => check(&calibration),
        Command::ToGraph { px, py } => to_graph(&calibration, px, py),
        Command::ToPixel { x, y, exponent } => {
            let repr = if exponent {
                LogRepresentation::Exponent
            } else {
                LogRepresentation::Actual
            };
            to_pixel(&calibration, x, y, repr)
        }
        Command::Import { file } => import_points(&config, &calibration, &file),
        Command::Export { file, out, name } => {
            export_points(&config, &calibration, &file, out.as_deref(), &name)
        }
    }
}

fn check(calibration: &CalibrationRegion) -> Result<()> {
    calibration
        .validate()
        .context("Calibration box is not usable, redraw it")?;

    let r = calibration.normalized();
    println!(
        "box: x={} y={} width={} height={}",
        r.x, r.y, r.width, r.height
    );
    for (name, axis) in [("x", &calibration.x_axis), ("y", &calibration.y_axis)] {
        let range = axis.resolve();
        println!("{} axis: {} [{}, {}]", name, range.scale, range.min, range.max);
    }
    Ok(())
}

fn to_graph(calibration: &CalibrationRegion, px: f64, py: f64) -> Result<()> {
    let coords = graphcalibrate::to_graph(px, py, calibration)?;
    let actual = coords.stored(LogRepresentation::Actual)?;
    println!("x={} y={}", actual.x, actual.y);

    if coords.x_scale.is_logarithmic() || coords.y_scale.is_logarithmic() {
        let exp = coords.to_exponent();
        println!("exponent form: x={} y={}", exp.x, exp.y);
    }
    Ok(())
}

fn to_pixel(calibration: &CalibrationRegion, x: f64, y: f64, repr: LogRepresentation) -> Result<()> {
    let transform = CoordinateTransform::from_calibration(calibration)?;
    let pixel = transform.to_pixel_as(x, y, repr)?;
    println!("px={} py={}", pixel.x, pixel.y);
    Ok(())
}

fn load_points(config: &Config, calibration: &CalibrationRegion, file: &Path) -> Result<PointSet> {
    let values = import::parse_file(file)
        .with_context(|| format!("Failed to import points from {:?}", file))?;

    let mut points = PointSet::new(config.export.log_representation);
    points
        .import(&values, calibration)
        .context("Failed to place imported points")?;
    Ok(points)
}

fn import_points(config: &Config, calibration: &CalibrationRegion, file: &Path) -> Result<()> {
    let points = load_points(config, calibration, file)?;

    for (row, p) in points.iter().enumerate() {
        match p.pixel {
            Some(pix) => println!("{}\t{}\t{}\t{:.2}\t{:.2}", row + 1, p.graph.x, p.graph.y, pix.x, pix.y),
            None => println!("{}\t{}\t{}\t-\t-", row + 1, p.graph.x, p.graph.y),
        }
    }
    Ok(())
}

fn export_points(
    config: &Config,
    calibration: &CalibrationRegion,
    file: &Path,
    out: Option<&Path>,
    name: &str,
) -> Result<()> {
    let points = load_points(config, calibration, file)?;

    let as_csv = out
        .and_then(|p| p.extension())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let content = if as_csv {
        export::to_csv(&points.graph_values(), config.export.precision)
    } else {
        let record = CurveRecord::from_points(
            name,
            &config.calibration,
            &points,
            config.export.log_representation,
        );
        record.to_json().context("Failed to serialize curve record")?
    };

    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            info!("Exported {} points to {:?}", points.len(), path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
