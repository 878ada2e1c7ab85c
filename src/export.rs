//! Writers for finished runs: CSV field maps and serialized run records.

use anyhow::{Context, Result};
use bioheat_common::{OutputConfig, ScalarField, SimulationResult};
use log::{error, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serialization format for the run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    /// Resolves the `[output] format` setting. Missing means JSON; unknown
    /// names fall back to JSON with an error log.
    pub fn from_setting(setting: Option<&str>) -> Self {
        match setting.map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("json") => OutputFormat::Json,
            Some("bincode") => OutputFormat::Bincode,
            Some("messagepack") | Some("msgpack") => OutputFormat::MessagePack,
            Some(other) => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                OutputFormat::Json
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }
}

/// Writes `field` as comma-separated rows, one grid row per line.
///
/// Values use Rust's shortest round-trip formatting. With `header`, a first
/// line of column indices `0,1,...,N-1` is written.
pub fn write_field_csv<W: Write>(writer: W, field: &ScalarField, header: bool) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    if header {
        csv_writer.write_record((0..field.size()).map(|j| j.to_string()))?;
    }
    for row in field.rows() {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_field_csv(path: &Path, field: &ScalarField, header: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
    write_field_csv(BufWriter::new(file), field, header)
        .with_context(|| format!("Failed to write CSV file '{}'", path.display()))
}

/// Serializes the whole run record (metadata, snapshots, final fields).
pub fn write_result<W: Write>(mut writer: W, result: &SimulationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, result)
            .context("Error serializing run record to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, result)
            .context("Error serializing run record to bincode")?,
        OutputFormat::MessagePack => rmp_serde::encode::write(&mut writer, result)
            .context("Error serializing run record to MessagePack")?,
    }
    writer.flush()?;
    Ok(())
}

/// Writes every output enabled in `output` and returns the paths written.
pub fn export_run(result: &SimulationResult, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    let dir = PathBuf::from(&output.directory);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    let mut written = Vec::new();

    if output.save_result {
        let format = OutputFormat::from_setting(output.format.as_deref());
        let path = dir.join(format!("{}_result.{}", output.base_filename, format.extension()));
        let file = File::create(&path).with_context(|| format!("Failed to create '{}'", path.display()))?;
        write_result(BufWriter::new(file), result, format)?;
        info!("Run record with {} snapshots saved to {}", result.snapshots.len(), path.display());
        written.push(path);
    } else {
        info!("Skipping run record as per config (save_result is false).");
    }

    if output.save_final_csv {
        let maps = [
            ("temperature_map", &result.final_temperature),
            ("damage_map", &result.final_damage_fraction),
        ];
        for (name, field) in maps {
            let path = dir.join(format!("{}_{}.csv", output.base_filename, name));
            save_field_csv(&path, field, output.csv_header)?;
            info!("Final {} saved to {}", name.replace('_', " "), path.display());
            written.push(path);
        }
    } else {
        info!("Skipping final CSV maps as per config.");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run;
    use bioheat_common::SimulationConfig;

    fn csv_string(field: &ScalarField, header: bool) -> String {
        let mut buffer = Vec::new();
        write_field_csv(&mut buffer, field, header).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn csv_rows_follow_grid_rows() {
        let field = ScalarField::from_vec(2, vec![37.0, 37.5, 38.25, 40.0]).unwrap();
        assert_eq!(csv_string(&field, false), "37,37.5\n38.25,40\n");
        assert_eq!(csv_string(&field, true), "0,1\n37,37.5\n38.25,40\n");
    }

    #[test]
    fn csv_values_round_trip() {
        let field = ScalarField::from_vec(1, vec![37.013227513227513]).unwrap();
        let text = csv_string(&field, false);
        let parsed: f64 = text.trim().parse().unwrap();
        assert_eq!(parsed, field.get(0, 0));
    }

    #[test]
    fn format_setting_resolution() {
        assert_eq!(OutputFormat::from_setting(None), OutputFormat::Json);
        assert_eq!(OutputFormat::from_setting(Some("Bincode")), OutputFormat::Bincode);
        assert_eq!(OutputFormat::from_setting(Some("messagepack")), OutputFormat::MessagePack);
        assert_eq!(OutputFormat::from_setting(Some("yaml")), OutputFormat::Json);
    }

    #[test]
    fn export_writes_named_files_per_flags() {
        let dir = std::env::temp_dir().join(format!("bioheat-export-{}", std::process::id()));
        let result = run(SimulationConfig::new("skin", 3.0, 1.0, 2, 1.0e5).with_grid(6, 0.006)).unwrap();
        let mut output = OutputConfig {
            directory: dir.join("nested").display().to_string(),
            base_filename: "case".to_string(),
            format: Some("msgpack".to_string()),
            ..OutputConfig::default()
        };

        let written = export_run(&result, &output).unwrap();
        let nested = dir.join("nested");
        assert_eq!(
            written,
            vec![
                nested.join("case_result.msgpack"),
                nested.join("case_temperature_map.csv"),
                nested.join("case_damage_map.csv"),
            ]
        );
        let record: SimulationResult = rmp_serde::from_slice(&fs::read(&written[0]).unwrap()).unwrap();
        assert_eq!(record.final_temperature, result.final_temperature);

        let csv_text = fs::read_to_string(&written[1]).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|line| line.split(',').count() == 6));

        fs::remove_dir_all(&dir).unwrap();
        output.save_result = false;
        let written = export_run(&result, &output).unwrap();
        assert_eq!(written, vec![nested.join("case_temperature_map.csv"), nested.join("case_damage_map.csv")]);
        assert!(!nested.join("case_result.msgpack").exists());

        output.save_final_csv = false;
        assert!(export_run(&result, &output).unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn run_record_survives_each_format() {
        let config = SimulationConfig::new("fat", 6.0, 1.0, 4, 2.0e5).with_grid(8, 0.008);
        let result = run(config).unwrap();

        let mut json = Vec::new();
        write_result(&mut json, &result, OutputFormat::Json).unwrap();
        let from_json: SimulationResult = serde_json::from_slice(&json).unwrap();
        assert_eq!(from_json.snapshots.len(), result.snapshots.len());

        let mut bin = Vec::new();
        write_result(&mut bin, &result, OutputFormat::Bincode).unwrap();
        let from_bin: SimulationResult = bincode::deserialize(&bin).unwrap();
        assert_eq!(from_bin.final_temperature, result.final_temperature);

        let mut msgpack = Vec::new();
        write_result(&mut msgpack, &result, OutputFormat::MessagePack).unwrap();
        let from_msgpack: SimulationResult = rmp_serde::from_slice(&msgpack).unwrap();
        assert_eq!(from_msgpack.final_damage_fraction, result.final_damage_fraction);
    }
}
