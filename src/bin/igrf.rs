use clap::Parser;
use igrfield::error::IgrfError;
use igrfield::igrf::coefficients::CoefficientTable;
use igrfield::igrf::model::FieldModel;
use igrfield::utils::coordinates::{GeodeticPosition, Position, PositionInput};
use igrfield::utils::epoch::{current_decimal_year, parse_epoch};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

/// Evaluates the International Geomagnetic Reference Field at one position, given as exactly
/// one of (--r, --theta, --phi), (--height, --latitude, --longitude) or (--x, --y, --z), or
/// at every geodetic position listed in a file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Epoch as a decimal year, YYYYMMDD or "YYYYMMDD HH:MM". Defaults to now
    #[arg(long, visible_alias = "yr")]
    year: Option<String>,

    /// Truncation degree of the expansion
    #[arg(short = 'n', long)]
    degree: Option<usize>,

    /// Also report the magnetic scalar potential
    #[arg(short = 'p', long)]
    potential: bool,

    /// Coefficient table in the NGDC igrfNNcoeffs.txt layout, instead of the built-in IGRF-12
    #[arg(long)]
    coefficients: Option<PathBuf>,

    /// File with one "height latitude longitude" position per line (m, deg, deg)
    #[arg(long, conflicts_with_all = ["r", "theta", "phi", "height", "latitude", "longitude", "x", "y", "z"])]
    batch: Option<PathBuf>,

    /// Geocentric radius in metres
    #[arg(long, allow_hyphen_values = true)]
    r: Option<f64>,

    /// Geocentric colatitude in radians
    #[arg(long, allow_hyphen_values = true)]
    theta: Option<f64>,

    /// East longitude in radians
    #[arg(long, allow_hyphen_values = true)]
    phi: Option<f64>,

    /// Height above the WGS-84 ellipsoid in metres
    #[arg(long, allow_hyphen_values = true)]
    height: Option<f64>,

    /// Geodetic latitude in degrees
    #[arg(long, visible_alias = "lat", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Longitude in degrees
    #[arg(long, visible_alias = "lon", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Earth-centred x coordinate in metres
    #[arg(short = 'x', long, allow_hyphen_values = true)]
    x: Option<f64>,

    /// Earth-centred y coordinate in metres
    #[arg(short = 'y', long, allow_hyphen_values = true)]
    y: Option<f64>,

    /// Earth-centred z coordinate in metres
    #[arg(short = 'z', long, allow_hyphen_values = true)]
    z: Option<f64>,
}

impl Args {
    fn position_input(&self) -> PositionInput {
        PositionInput {
            r: self.r,
            theta: self.theta,
            phi: self.phi,
            height: self.height,
            latitude: self.latitude,
            longitude: self.longitude,
            x: self.x,
            y: self.y,
            z: self.z,
            unknown: vec![],
        }
    }
}

/// Reads whitespace separated "height latitude longitude" rows, skipping blank and `#` lines.
fn read_positions(path: &Path) -> BinResult<Vec<GeodeticPosition>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Unable to read positions from {}: {e}", path.display()))?;
    let mut positions = vec![];
    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (height, latitude, longitude) = line
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect_tuple()
            .ok_or_else(|| format!("Expected 3 values on line {}", line_num + 1))?;
        positions.push(GeodeticPosition {
            height: height?,
            latitude: latitude?,
            longitude: longitude?,
        });
    }
    Ok(positions)
}

fn bin_main() -> BinResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let table = match &args.coefficients {
        Some(path) => CoefficientTable::from_file(path)?,
        None => CoefficientTable::embedded()?,
    };
    let mut model = FieldModel::with_table(Arc::new(table));
    if let Some(degree) = args.degree {
        model = model.with_degree(degree);
    }
    let epoch = match &args.year {
        Some(year) => parse_epoch(year)?,
        None => current_decimal_year(),
    };
    model.configure(epoch);
    let epoch = model.epoch().ok_or(IgrfError::Unconfigured)?;
    info!(epoch, degree = model.degree(), "evaluating field");

    if let Some(path) = &args.batch {
        let positions = read_positions(path)?;
        let fields = model.geographic_batch(&positions, args.potential)?;
        let Some(first) = fields.first() else {
            return Ok(());
        };
        println!("height latitude longitude {}", first.components().keys().join(" "));
        for (p, field) in positions.iter().zip(&fields) {
            println!(
                "{} {} {} {}",
                p.height,
                p.latitude,
                p.longitude,
                field.components().values().map(|v| format!("{v:.3}")).join(" ")
            );
        }
        return Ok(());
    }

    let position = Position::try_from(args.position_input())?;
    let result = model.field_at(&position, args.potential)?;
    println!("epoch: {epoch:.4}");
    println!("degree: {}", result.degree());
    for (name, value) in result.components() {
        println!("{name}: {value:.3}");
    }
    Ok(())
}
