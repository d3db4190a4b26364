//! File-level stage runners
//!
//! Each stage reads its inputs from the files written by the stages before it and
//! persists its own result:
//!
//! | Stage             | Reads                       | Writes                        |
//! |-------------------|-----------------------------|-------------------------------|
//! | `climatology`     | daily files                 | climatology file              |
//! | `box-climatology` | climatology file            | box climatology file          |
//! | `spring`          | daily files, climatology    | spring file                   |
//! | `summer`          | daily files, climatology    | summer file                   |
//! | `box-statistics`  | daily files, box climatology| one file per year             |
//!
//! The `run_*` functions build a [`DirectorySource`] from the configuration; the
//! `*_with` variants accept any [`DailyFieldSource`].

use crate::source::{DailyFieldSource, DirectorySource};
use crate::stages::box_average::{box_climatology, box_climatology_dataset, box_statistics};
use crate::stages::climatology::{compute_climatology, Climatology};
use crate::stages::spring::compute_spring;
use crate::stages::summer::compute_summer;
use crate::stages::turning_point::turning_days;
use ndarray::Ix3;
use rsphen_core::config::PhenologyConfig;
use rsphen_core::dataset::{Dataset, DatasetFormat};
use rsphen_core::errors::{PhenologyError, PhenologyResult};
use rsphen_core::grid::box_layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A step of the processing chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Climatology,
    BoxClimatology,
    Spring,
    Summer,
    BoxStatistics,
}

impl Stage {
    /// All stages in dependency order
    pub const ALL: [Stage; 5] = [
        Stage::Climatology,
        Stage::BoxClimatology,
        Stage::Spring,
        Stage::Summer,
        Stage::BoxStatistics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Climatology => "climatology",
            Stage::BoxClimatology => "box-climatology",
            Stage::Spring => "spring",
            Stage::Summer => "summer",
            Stage::BoxStatistics => "box-statistics",
        }
    }

    /// Stages whose files this stage reads
    pub fn requires(&self) -> &'static [Stage] {
        match self {
            Stage::Climatology => &[],
            Stage::BoxClimatology | Stage::Spring | Stage::Summer => &[Stage::Climatology],
            Stage::BoxStatistics => &[Stage::BoxClimatology],
        }
    }

    /// Variables written by the stage
    pub fn outputs(&self) -> &'static [&'static str] {
        match self {
            Stage::Climatology => &[
                "sst_climatology",
                "chlor_climatology",
                "diff_sst_climatology",
                "diff_chlor_climatology",
                "data_rate",
                "chlor_num_days",
            ],
            Stage::BoxClimatology => &["sst_box_average", "chlor_box_average"],
            Stage::Spring => &[
                "day_min",
                "day_max",
                "data_min",
                "data_max",
                "day_spring1",
                "day_spring2",
                "day_spring_trend1",
                "day_spring_trend2",
            ],
            Stage::Summer => &[
                "day_min",
                "day_max",
                "data_min",
                "data_max",
                "day_summer_start",
                "day_summer_end",
                "day_summer_start_trend",
                "day_summer_end_trend",
                "data_summer_baseline",
                "year_summer_baseline",
            ],
            Stage::BoxStatistics => &[
                "sst_box_average",
                "chlor_box_average",
                "sst_box_anomaly",
                "chlor_box_anomaly",
                "sst_box_std",
                "chlor_box_std",
            ],
        }
    }

    /// Run the stage against `source`, returning the files written
    pub fn run(
        &self,
        config: &PhenologyConfig,
        source: &dyn DailyFieldSource,
    ) -> PhenologyResult<Vec<PathBuf>> {
        log::info!("Running stage {self}");
        match self {
            Stage::Climatology => run_climatology_with(config, source).map(|p| vec![p]),
            Stage::BoxClimatology => run_box_climatology(config).map(|p| vec![p]),
            Stage::Spring => run_spring_metric_with(config, source).map(|p| vec![p]),
            Stage::Summer => run_summer_metric_with(config, source).map(|p| vec![p]),
            Stage::BoxStatistics => run_box_statistics_with(config, source),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PhenologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s.trim().to_ascii_lowercase().replace('_', "-"))
            .ok_or_else(|| PhenologyError::InvalidConfig(format!("Unknown stage '{s}'")))
    }
}

fn tag(ds: &mut Dataset, config: &PhenologyConfig) {
    ds.set_attribute("dataset", config.dataset.name.as_str());
    ds.set_attribute("start_year", config.dataset.start_year);
    ds.set_attribute("end_year", config.dataset.end_year);
    ds.set_attribute("source", concat!("rsphen ", env!("CARGO_PKG_VERSION")));
}

fn write(mut ds: Dataset, config: &PhenologyConfig, path: PathBuf) -> PhenologyResult<PathBuf> {
    tag(&mut ds, config);
    ds.write(&path)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

fn read_climatology(config: &PhenologyConfig) -> PhenologyResult<(Dataset, Climatology)> {
    let path = config.dataset.climatology_path();
    let ds = Dataset::read(&path)?;
    let climatology = Climatology::from_dataset(&ds, config.kind()?)?;
    Ok((ds, climatology))
}

/// Accumulate the climatology of the configured years and write it
pub fn run_climatology(config: &PhenologyConfig) -> PhenologyResult<PathBuf> {
    let source = DirectorySource::from_config(config)?;
    run_climatology_with(config, &source)
}

pub fn run_climatology_with(
    config: &PhenologyConfig,
    source: &dyn DailyFieldSource,
) -> PhenologyResult<PathBuf> {
    config.validate()?;
    let kind = config.kind()?;
    let grid = source.grid()?;
    let climatology = compute_climatology(source, kind, config.dataset.years())?;
    let ds = climatology.to_dataset(&grid, kind, config.dataset.years())?;
    write(ds, config, config.dataset.climatology_path())
}

/// Average the climatology over the boxes of the configured region
pub fn run_box_climatology(config: &PhenologyConfig) -> PhenologyResult<PathBuf> {
    config.validate()?;
    let kind = config.kind()?;
    let (ds, climatology) = read_climatology(config)?;
    let layout = box_layout(&config.region, &ds.grid()?)?;
    log::info!("Averaging over {} x {} boxes", layout.nx(), layout.ny());
    let averages = box_climatology(&climatology.mean, &layout, kind);
    let out = box_climatology_dataset(&averages, kind, &config.region, &layout)?;
    write(out, config, config.dataset.climatology_box_path())
}

/// Spring start days and their trends
pub fn run_spring_metric(config: &PhenologyConfig) -> PhenologyResult<PathBuf> {
    let source = DirectorySource::from_config(config)?;
    run_spring_metric_with(config, &source)
}

pub fn run_spring_metric_with(
    config: &PhenologyConfig,
    source: &dyn DailyFieldSource,
) -> PhenologyResult<PathBuf> {
    config.validate()?;
    let kind = config.kind()?;
    let (ds, climatology) = read_climatology(config)?;
    let grid = ds.grid()?;
    let turning = turning_days(&climatology);
    let years: Vec<i32> = config.dataset.years().collect();
    let metric = compute_spring(source, kind, &years, &turning, &config.thresholds);
    write(metric.to_dataset(&grid)?, config, config.dataset.spring_path())
}

/// Summer start and end days, their trends and the summer baseline
pub fn run_summer_metric(config: &PhenologyConfig) -> PhenologyResult<PathBuf> {
    let source = DirectorySource::from_config(config)?;
    run_summer_metric_with(config, &source)
}

pub fn run_summer_metric_with(
    config: &PhenologyConfig,
    source: &dyn DailyFieldSource,
) -> PhenologyResult<PathBuf> {
    config.validate()?;
    let kind = config.kind()?;
    let (ds, climatology) = read_climatology(config)?;
    let grid = ds.grid()?;
    let turning = turning_days(&climatology);
    let years: Vec<i32> = config.dataset.years().collect();
    let metric = compute_summer(source, kind, &years, &turning, config.thresholds.summer_offset);
    write(metric.to_dataset(&grid)?, config, config.dataset.summer_path())
}

/// Per-year box statistics file, `<dir>/YYYY/<prefix>_box_statistics_YYYY.<ext>`
pub fn box_statistics_path(config: &PhenologyConfig, year: i32) -> PhenologyResult<PathBuf> {
    let format = DatasetFormat::from_path(Path::new(&config.dataset.climatology_file))?;
    let prefix = config.kind()?.prefix();
    Ok(config
        .dataset
        .box_statistics_dir()
        .join(format!("{year:04}"))
        .join(format!("{prefix}_box_statistics_{year:04}.{}", format.extension())))
}

/// Daily box statistics for every configured year
pub fn run_box_statistics(config: &PhenologyConfig) -> PhenologyResult<Vec<PathBuf>> {
    let source = DirectorySource::from_config(config)?;
    run_box_statistics_with(config, &source)
}

pub fn run_box_statistics_with(
    config: &PhenologyConfig,
    source: &dyn DailyFieldSource,
) -> PhenologyResult<Vec<PathBuf>> {
    config.validate()?;
    let kind = config.kind()?;
    let box_ds = Dataset::read(config.dataset.climatology_box_path())?;
    let averages = box_ds.float_array::<Ix3>(&kind.box_average_variable())?;
    let layout = box_layout(&config.region, &source.grid()?)?;

    config
        .dataset
        .years()
        .map(|year| {
            log::info!("Processing year {year}");
            let stats = box_statistics(source, kind, year, &layout, &averages)?;
            let ds = stats.to_dataset(kind, &config.region, &layout)?;
            write(ds, config, box_statistics_path(config, year)?)
        })
        .collect()
}

/// Run `stages` in order against the configured daily files
pub fn run_stages(config: &PhenologyConfig, stages: &[Stage]) -> PhenologyResult<Vec<PathBuf>> {
    let source = DirectorySource::from_config(config)?;
    let mut written = Vec::new();
    for stage in stages {
        written.extend(stage.run(config, &source)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
        assert_eq!("Box_Statistics".parse::<Stage>().unwrap(), Stage::BoxStatistics);
        assert!("plot".parse::<Stage>().is_err());
    }

    #[test]
    fn dependencies_come_first() {
        for (position, stage) in Stage::ALL.iter().enumerate() {
            for required in stage.requires() {
                let required_position = Stage::ALL.iter().position(|s| s == required).unwrap();
                assert!(required_position < position, "{stage} needs {required}");
            }
        }
    }

    #[test]
    fn outputs_are_registered() {
        for stage in Stage::ALL {
            for name in stage.outputs() {
                assert!(
                    rsphen_core::variable::lookup(name).is_some(),
                    "{name} of {stage} is not registered"
                );
            }
        }
    }

    #[test]
    fn box_statistics_layout() {
        let config = PhenologyConfig::from_toml_str(
            "[dataset]\nname = \"MUR\"\nroot = \"/data\"\noutput_dir = \"/out\"\n",
        )
        .unwrap();
        assert_eq!(
            box_statistics_path(&config, 2005).unwrap(),
            PathBuf::from("/out/boxes/2005/sst_box_statistics_2005.json")
        );
    }

    #[test]
    fn missing_climatology_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PhenologyConfig::default();
        config.resolve_kind().unwrap();
        config.dataset.root = dir.path().to_path_buf();
        let err = run_box_climatology(&config).unwrap_err();
        assert!(matches!(err, PhenologyError::MissingFile(_)));
        assert!(!config.dataset.climatology_box_path().exists());
    }
}
