//! Writers for extraction results.

use crate::RunnerError;
use meander_reach::{FittedCurve, ReachChain, ReachExtraction, SegmentId, StitchedProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// File format for saved results.
///
/// Config files and the command line both parse through [`FromStr`], so an
/// unknown name fails with [`RunnerError::Format`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SaveFormat {
    /// Column-oriented JSON object.
    Json,
    /// One row per point with a header.
    #[default]
    Csv,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Csv => "csv",
        }
    }
}

impl FromStr for SaveFormat {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SaveFormat::Json),
            "csv" => Ok(SaveFormat::Csv),
            _ => Err(RunnerError::Format(s.to_string())),
        }
    }
}

impl TryFrom<String> for SaveFormat {
    type Error = RunnerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Serialize)]
struct CurveRow {
    s: f64,
    x: f64,
    y: f64,
    z: f64,
    segment: SegmentId,
}

#[derive(Serialize)]
struct ProfileRow {
    s: f64,
    x: f64,
    y: f64,
    z: f64,
    stream_order: u32,
    segment: SegmentId,
}

#[derive(Serialize)]
struct ProfileColumns {
    s: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    stream_order: Vec<u32>,
    segment: Vec<SegmentId>,
}

/// Write a fitted curve.
pub fn write_curve<W: Write>(
    curve: &FittedCurve,
    format: SaveFormat,
    writer: W,
) -> Result<(), RunnerError> {
    match format {
        SaveFormat::Json => serde_json::to_writer_pretty(writer, curve)?,
        SaveFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for i in 0..curve.len() {
                csv_writer.serialize(CurveRow {
                    s: curve.s[i],
                    x: curve.x[i],
                    y: curve.y[i],
                    z: curve.z[i],
                    segment: curve.segment[i],
                })?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

/// Write a stitched profile.
pub fn write_profile<W: Write>(
    profile: &StitchedProfile,
    format: SaveFormat,
    writer: W,
) -> Result<(), RunnerError> {
    let points = profile.points();
    match format {
        SaveFormat::Json => {
            let columns = ProfileColumns {
                s: profile.s(),
                x: profile.x(),
                y: profile.y(),
                z: profile.z(),
                stream_order: points.iter().map(|p| p.stream_order).collect(),
                segment: profile.segments(),
            };
            serde_json::to_writer_pretty(writer, &columns)?;
        }
        SaveFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for p in points {
                csv_writer.serialize(ProfileRow {
                    s: p.s,
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    stream_order: p.stream_order,
                    segment: p.segment,
                })?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

/// Write a segment chain.
pub fn write_chain<W: Write>(
    chain: &ReachChain,
    format: SaveFormat,
    mut writer: W,
) -> Result<(), RunnerError> {
    match format {
        SaveFormat::Json => serde_json::to_writer(&mut writer, chain)?,
        SaveFormat::Csv => {
            writeln!(writer, "segment")?;
            for id in chain.iter() {
                writeln!(writer, "{}", id)?;
            }
        }
    }
    Ok(())
}

/// Output file for one artifact of the reach starting at `start`.
pub fn output_path(dir: &Path, start: SegmentId, artifact: &str, format: SaveFormat) -> PathBuf {
    dir.join(format!("reach_{}_{}.{}", start, artifact, format.extension()))
}

/// Save chain, profile and fitted curve of one reach into `dir`.
///
/// Returns the written paths.
pub fn save_extraction(
    dir: &Path,
    start: SegmentId,
    extraction: &ReachExtraction,
    format: SaveFormat,
) -> Result<Vec<PathBuf>, RunnerError> {
    std::fs::create_dir_all(dir)?;

    let chain_path = output_path(dir, start, "chain", format);
    write_chain(&extraction.chain, format, BufWriter::new(File::create(&chain_path)?))?;

    let profile_path = output_path(dir, start, "profile", format);
    let profile_file = BufWriter::new(File::create(&profile_path)?);
    write_profile(&extraction.profile, format, profile_file)?;

    let curve_path = output_path(dir, start, "fitted", format);
    write_curve(&extraction.curve, format, BufWriter::new(File::create(&curve_path)?))?;

    debug!(start = %start, dir = %dir.display(), "saved reach");
    Ok(vec![chain_path, profile_path, curve_path])
}
