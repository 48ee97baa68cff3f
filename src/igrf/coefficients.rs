use crate::error::IgrfError;
use itertools::Itertools;
use ndarray::Array2;
use rust_embed::RustEmbed;
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, IgrfError>;

/// File name of the IGRF-12 table embedded in the crate
pub const EMBEDDED_TABLE: &str = "igrf12coeffs.txt";

#[derive(RustEmbed)]
#[folder = "data/"]
struct CoefficientFiles;

/// Gauss coefficients of one epoch, indexed `[[n, m]]`.
///
/// Both matrices are `(N+1) x (N+1)`. Entries with `m > n`, the unused `n = 0` row and
/// `h[[n, 0]]` are always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet {
    pub g: Array2<f64>,
    pub h: Array2<f64>,
}

impl CoefficientSet {
    pub fn zeros(degree: usize) -> CoefficientSet {
        CoefficientSet {
            g: Array2::zeros((degree + 1, degree + 1)),
            h: Array2::zeros((degree + 1, degree + 1)),
        }
    }

    pub fn degree(&self) -> usize {
        self.g.nrows() - 1
    }
}

/// Rate of change of the coefficients (nT/year), valid from the last tabulated epoch
/// (`start`) until `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecularVariation {
    pub start: f64,
    pub end: f64,
    pub rate: CoefficientSet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CoefficientKind {
    G,
    H,
}

#[derive(Debug)]
struct CoefficientRow {
    kind: CoefficientKind,
    degree: usize,
    order: usize,
    values: Vec<f64>,
}

impl CoefficientRow {
    fn parse(line: &str, line_num: usize, num_columns: usize) -> Result<CoefficientRow> {
        let bad_row = |what: &str| {
            IgrfError::CoefficientTable(format!(
                "Unable to read {what} from coefficient table line {}",
                line_num + 1
            ))
        };
        let mut tokens = line.split_whitespace();
        let (kind, degree, order) = tokens
            .by_ref()
            .take(3)
            .collect_tuple()
            .ok_or_else(|| bad_row("g/h, degree and order"))?;

        let kind = match kind {
            "g" => CoefficientKind::G,
            "h" => CoefficientKind::H,
            _ => Err(bad_row("coefficient type"))?,
        };
        let degree = degree.parse::<usize>().map_err(|_| bad_row("degree"))?;
        let order = order.parse::<usize>().map_err(|_| bad_row("order"))?;
        if degree == 0 || order > degree {
            Err(IgrfError::CoefficientTable(format!(
                "Degree/order ({degree}, {order}) out of range on coefficient table line {}",
                line_num + 1
            )))?
        }
        if kind == CoefficientKind::H && order == 0 {
            Err(IgrfError::CoefficientTable(format!(
                "h coefficient with order 0 on coefficient table line {}",
                line_num + 1
            )))?
        }

        let values = tokens
            .map(|v| {
                v.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| bad_row("coefficient value"))
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != num_columns {
            Err(IgrfError::CoefficientTable(format!(
                "Expected {num_columns} values but found {} on coefficient table line {}",
                values.len(),
                line_num + 1
            )))?
        }

        Ok(CoefficientRow {
            kind,
            degree,
            order,
            values,
        })
    }
}

/// Longest secular variation span, in years, a table header may declare.
const MAX_SV_SPAN: u32 = 10;

/// Parses a secular variation column label such as `2015-20` into `(2015.0, 2020.0)`.
/// Spans longer than [`MAX_SV_SPAN`] years are rejected.
fn parse_sv_span(label: &str) -> Option<(f64, f64)> {
    let (start, end) = label.split_once('-')?;
    let start = start.parse::<u32>().ok()?;
    let end_digits = end.parse::<u32>().ok()?;
    let modulus = 10_u32.checked_pow(end.len() as u32)?;
    let mut end = start - start % modulus + end_digits;
    if end <= start {
        end += modulus;
    }
    if end - start > MAX_SV_SPAN {
        return None;
    }
    Some((start as f64, end as f64))
}

/// Parses the `g/h n m <epochs...> <sv span>` header into the epochs and the SV span.
fn parse_header(line: &str, line_num: usize) -> Result<(Vec<f64>, (f64, f64))> {
    let labels: Vec<&str> = line.split_whitespace().skip(3).collect();
    let (sv_label, epoch_labels) = labels.split_last().ok_or_else(|| {
        IgrfError::CoefficientTable(format!(
            "No epochs in coefficient table header on line {}",
            line_num + 1
        ))
    })?;
    if epoch_labels.is_empty() {
        Err(IgrfError::CoefficientTable(
            "Coefficient table header needs at least one epoch before the secular variation column"
                .to_string(),
        ))?
    }

    let epochs = epoch_labels
        .iter()
        .map(|e| {
            e.parse::<f64>()
                .ok()
                .filter(|e| e.is_finite())
                .ok_or_else(|| {
                    IgrfError::CoefficientTable(format!(
                        "Unable to read epoch {e} from table header"
                    ))
                })
        })
        .collect::<Result<Vec<f64>>>()?;
    if epochs.windows(2).any(|w| w[1] <= w[0]) {
        Err(IgrfError::CoefficientTable(
            "Coefficient table epochs are not strictly increasing".to_string(),
        ))?
    }

    let sv_span = parse_sv_span(sv_label).ok_or_else(|| {
        IgrfError::CoefficientTable(format!(
            "Unable to read secular variation span {sv_label} from table header"
        ))
    })?;
    let last_epoch = epochs[epochs.len() - 1];
    if sv_span.0 != last_epoch {
        Err(IgrfError::CoefficientTable(format!(
            "Secular variation starts at {} but the last epoch is {last_epoch}",
            sv_span.0
        )))?
    }

    Ok((epochs, sv_span))
}

/// Tabulated Gauss coefficients for every reference epoch of one IGRF generation, plus the
/// secular variation used beyond the last epoch.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    epochs: Vec<f64>,
    sets: Vec<CoefficientSet>,
    secular_variation: SecularVariation,
    max_degree: usize,
}

impl CoefficientTable {
    /// Parses the table embedded in the crate (IGRF-12, epochs 1900-2015, SV to 2020).
    ///
    /// # Errors
    /// Will return `Err` if the embedded file is missing or malformed.
    pub fn embedded() -> Result<CoefficientTable> {
        let file = CoefficientFiles::get(EMBEDDED_TABLE).ok_or_else(|| {
            IgrfError::CoefficientTable(format!("Embedded table {EMBEDDED_TABLE} not found"))
        })?;
        let text = std::str::from_utf8(file.data.as_ref()).map_err(|_| {
            IgrfError::CoefficientTable(format!("Embedded table {EMBEDDED_TABLE} is not UTF-8"))
        })?;
        CoefficientTable::parse(text)
    }

    /// Reads a coefficient table in the NGDC `igrfNNcoeffs.txt` layout from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<CoefficientTable> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IgrfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CoefficientTable::parse(&text)
    }

    /// Parses a table in the NGDC layout: one row per (g/h, n, m), one column per epoch, and
    /// a trailing secular variation column labelled `YYYY-YY`.
    ///
    /// # Errors
    /// Will return `Err` if the header is missing, a row is malformed, a degree/order is out
    /// of range, or a coefficient is duplicated or missing.
    pub fn parse(text: &str) -> Result<CoefficientTable> {
        let mut header: Option<(Vec<f64>, (f64, f64))> = None;
        let mut rows: Vec<CoefficientRow> = vec![];

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("c/s") {
                continue;
            }
            if line.starts_with("g/h") {
                if header.is_some() {
                    Err(IgrfError::CoefficientTable(format!(
                        "Second table header on line {}",
                        line_num + 1
                    )))?
                }
                header = Some(parse_header(line, line_num)?);
                continue;
            }
            let (epochs, _) = header.as_ref().ok_or_else(|| {
                IgrfError::CoefficientTable(format!(
                    "Coefficient row on line {} precedes the g/h header",
                    line_num + 1
                ))
            })?;
            rows.push(CoefficientRow::parse(line, line_num, epochs.len() + 1)?);
        }

        let (epochs, (sv_start, sv_end)) = header.ok_or_else(|| {
            IgrfError::CoefficientTable("Coefficient table has no g/h header".to_string())
        })?;
        let max_degree = rows
            .iter()
            .map(|r| r.degree)
            .max()
            .ok_or_else(|| IgrfError::CoefficientTable("Coefficient table is empty".to_string()))?;

        let mut sets = vec![CoefficientSet::zeros(max_degree); epochs.len()];
        let mut rate = CoefficientSet::zeros(max_degree);
        let mut seen_g = Array2::<bool>::from_elem((max_degree + 1, max_degree + 1), false);
        let mut seen_h = seen_g.clone();

        for row in rows {
            let idx = [row.degree, row.order];
            let seen = match row.kind {
                CoefficientKind::G => &mut seen_g[idx],
                CoefficientKind::H => &mut seen_h[idx],
            };
            if *seen {
                Err(IgrfError::CoefficientTable(format!(
                    "Duplicate {:?} coefficient for degree {} order {}",
                    row.kind, row.degree, row.order
                )))?
            }
            *seen = true;

            let (sv_value, values) = row
                .values
                .split_last()
                .ok_or_else(|| IgrfError::CoefficientTable("Empty coefficient row".to_string()))?;
            for (set, &value) in sets.iter_mut().zip(values) {
                match row.kind {
                    CoefficientKind::G => set.g[idx] = value,
                    CoefficientKind::H => set.h[idx] = value,
                }
            }
            match row.kind {
                CoefficientKind::G => rate.g[idx] = *sv_value,
                CoefficientKind::H => rate.h[idx] = *sv_value,
            }
        }

        // Every degree up to the maximum needs a full set of g (m = 0..n) and h (m = 1..n)
        for n in 1..=max_degree {
            for m in 0..=n {
                if !seen_g[[n, m]] || (m > 0 && !seen_h[[n, m]]) {
                    Err(IgrfError::CoefficientTable(format!(
                        "Coefficient table is missing degree {n} order {m}"
                    )))?
                }
            }
        }

        debug!(
            epochs = epochs.len(),
            first = epochs[0],
            last = sv_start,
            sv_end,
            max_degree,
            "parsed coefficient table"
        );

        Ok(CoefficientTable {
            epochs,
            sets,
            secular_variation: SecularVariation {
                start: sv_start,
                end: sv_end,
                rate,
            },
            max_degree,
        })
    }

    /// Tabulated reference epochs in increasing order. The secular variation end is not one.
    pub fn epochs_available(&self) -> &[f64] {
        &self.epochs
    }

    /// The exact tabulated coefficient set of `epoch`.
    ///
    /// # Errors
    /// Will return `Err` if `epoch` is not exactly one of the tabulated epochs.
    pub fn coefficients_at(&self, epoch: f64) -> Result<&CoefficientSet> {
        self.epochs
            .iter()
            .position(|&e| e == epoch)
            .map(|i| &self.sets[i])
            .ok_or(IgrfError::UnknownEpoch(epoch))
    }

    pub(crate) fn set(&self, index: usize) -> &CoefficientSet {
        &self.sets[index]
    }

    pub fn secular_variation(&self) -> &SecularVariation {
        &self.secular_variation
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    pub fn min_epoch(&self) -> f64 {
        self.epochs[0]
    }

    /// Last epoch with absolute coefficients.
    pub fn last_epoch(&self) -> f64 {
        self.epochs[self.epochs.len() - 1]
    }

    /// Latest epoch the table can describe, the end of the secular variation span.
    pub fn max_epoch(&self) -> f64 {
        self.secular_variation.end
    }
}
