//! Run configuration
//!
//! A [`PhenologyConfig`] is read from TOML. Every section has defaults, so a minimal
//! file only names the dataset and its years:
//!
//! ```rust
//! use rsphen_core::config::{DatasetKind, PhenologyConfig};
//!
//! let config = PhenologyConfig::from_toml_str(
//!     r#"
//!     [dataset]
//!     name = "MUR"
//!     root = "/data/mur"
//!     start_year = 2003
//!     end_year = 2020
//!
//!     [thresholds]
//!     spring1 = 282.0
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(matches!(config.dataset.kind, Some(DatasetKind::SeaSurfaceTemperature { .. })));
//! assert_eq!(config.thresholds.spring1, 282.0);
//! assert_eq!(config.region.lat_boxsize, 5.0);
//! ```

use crate::errors::{PhenologyError, PhenologyResult};
use crate::grid::Region;
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Valid sea surface temperatures for accumulation are strictly inside this range (kelvin)
const SST_VALID_RANGE: (FloatValue, FloatValue) = (-250.0, 350.0);
/// Climatology values kept by the box average (kelvin)
const SST_BOX_RANGE: (FloatValue, FloatValue) = (-100.0, 350.0);
/// Mask flag of open water
const MASK_WATER: FloatValue = 1.0;

fn default_sst_variable() -> String {
    "analysed_sst".to_string()
}

fn default_chlor_variable() -> String {
    "chlor_a".to_string()
}

/// Physical quantity of a daily dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DatasetKind {
    /// GHRSST level 4 analyses (MUR, CMC, NCEI OI)
    SeaSurfaceTemperature {
        #[serde(default = "default_sst_variable")]
        variable: String,
        #[serde(default)]
        error_variable: Option<String>,
    },
    /// Ocean colour chlorophyll-a concentration (MODIS, SeaWiFS)
    Chlorophyll {
        #[serde(default = "default_chlor_variable")]
        variable: String,
    },
}

impl Default for DatasetKind {
    fn default() -> Self {
        Self::sea_surface_temperature()
    }
}

impl DatasetKind {
    pub fn sea_surface_temperature() -> Self {
        DatasetKind::SeaSurfaceTemperature {
            variable: default_sst_variable(),
            error_variable: Some("analysis_error".to_string()),
        }
    }

    pub fn chlorophyll() -> Self {
        DatasetKind::Chlorophyll {
            variable: default_chlor_variable(),
        }
    }

    /// Kind of a dataset from its conventional name (`MUR`, `CMC`, `NCEI`, `MODIS`, `SeaWiFS`)
    pub fn from_legacy_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        if ["MUR", "CMC", "NCEI"].iter().any(|n| upper.contains(n)) {
            Some(Self::sea_surface_temperature())
        } else if ["MODIS", "SEAWIFS"].iter().any(|n| upper.contains(n)) {
            Some(Self::chlorophyll())
        } else {
            None
        }
    }

    /// Name of the data variable in daily files
    pub fn variable(&self) -> &str {
        match self {
            DatasetKind::SeaSurfaceTemperature { variable, .. } => variable,
            DatasetKind::Chlorophyll { variable } => variable,
        }
    }

    pub fn error_variable(&self) -> Option<&str> {
        match self {
            DatasetKind::SeaSurfaceTemperature { error_variable, .. } => error_variable.as_deref(),
            DatasetKind::Chlorophyll { .. } => None,
        }
    }

    /// Prefix of persisted variable names
    pub fn prefix(&self) -> &'static str {
        match self {
            DatasetKind::SeaSurfaceTemperature { .. } => "sst",
            DatasetKind::Chlorophyll { .. } => "chlor",
        }
    }

    pub fn climatology_variable(&self) -> String {
        format!("{}_climatology", self.prefix())
    }

    pub fn diff_climatology_variable(&self) -> String {
        format!("diff_{}_climatology", self.prefix())
    }

    pub fn box_average_variable(&self) -> String {
        format!("{}_box_average", self.prefix())
    }

    pub fn box_anomaly_variable(&self) -> String {
        format!("{}_box_anomaly", self.prefix())
    }

    pub fn box_std_variable(&self) -> String {
        format!("{}_box_std", self.prefix())
    }

    pub fn is_chlorophyll(&self) -> bool {
        matches!(self, DatasetKind::Chlorophyll { .. })
    }

    /// Whether a daily observation enters the climatology and the annual series
    ///
    /// Sea surface temperatures must lie strictly inside (-250, 350) over open water;
    /// a field without a mask counts as water. Chlorophyll must be positive.
    pub fn accepts(&self, value: FloatValue, mask: Option<FloatValue>) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            DatasetKind::SeaSurfaceTemperature { .. } => {
                value > SST_VALID_RANGE.0
                    && value < SST_VALID_RANGE.1
                    && mask.map_or(true, |m| m == MASK_WATER)
            }
            DatasetKind::Chlorophyll { .. } => value > 0.0,
        }
    }

    /// Whether a daily observation enters the per-box statistics
    ///
    /// Looser than [`DatasetKind::accepts`]: range ends are inclusive and any mask
    /// value up to water is kept.
    pub fn accepts_for_box_statistics(&self, value: FloatValue, mask: Option<FloatValue>) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            DatasetKind::SeaSurfaceTemperature { .. } => {
                (SST_VALID_RANGE.0..=SST_VALID_RANGE.1).contains(&value)
                    && mask.map_or(true, |m| m <= MASK_WATER)
            }
            DatasetKind::Chlorophyll { .. } => value > 0.0,
        }
    }

    /// Whether a climatology value enters the box average
    pub fn in_box_range(&self, value: FloatValue) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            DatasetKind::SeaSurfaceTemperature { .. } => {
                (SST_BOX_RANGE.0..=SST_BOX_RANGE.1).contains(&value)
            }
            DatasetKind::Chlorophyll { .. } => value >= 0.0,
        }
    }

    /// Number of day directories scanned in `year`
    pub fn days_scanned(&self, year: i32) -> u16 {
        match self {
            DatasetKind::SeaSurfaceTemperature { .. } => 366,
            DatasetKind::Chlorophyll { .. } => crate::calendar::days_in_year(year),
        }
    }
}

/// PO.DAAC short name of a conventional dataset name
pub fn podaac_short_name(name: &str) -> Option<&'static str> {
    let upper = name.to_ascii_uppercase();
    if upper.contains("MUR") {
        Some("MUR-JPL-L4-GLOB-v4.1")
    } else if upper.contains("CMC") {
        Some("CMC0.2deg-CMC-L4-GLOB-v2.0")
    } else if upper.contains("NCEI") {
        Some("AVHRR_OI-NCEI-L4-GLOB-v2.0")
    } else if upper.contains("MODIS") {
        Some("MODIS_Aqua_L3_CHLA_Daily_4km_V2014.0_R")
    } else {
        None
    }
}

/// Thresholds of the spring and summer metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// First spring threshold, in data units
    /// Default: 281.0
    pub spring1: FloatValue,
    /// Second spring threshold, in data units
    /// Default: 283.0
    pub spring2: FloatValue,
    /// Offset added to the summer baseline
    /// Default: 1.0
    pub summer_offset: FloatValue,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            spring1: 281.0,
            spring2: 283.0,
            summer_offset: 1.0,
        }
    }
}

/// Location, extent and artifact names of one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Conventional dataset name, used to resolve [`DatasetConfig::kind`] when absent
    pub name: String,
    /// Explicit dataset kind
    pub kind: Option<DatasetKind>,
    /// Directory holding the `YYYY/DDD/` tree of daily files
    pub root: PathBuf,
    pub start_year: i32,
    pub end_year: i32,
    /// File providing `lat`/`lon`. Default: `<root>/<short name>_info.nc`, or the
    /// first daily file of `start_year` when there is no short name
    pub grid_file: Option<PathBuf>,
    /// Template for daily file names, `{year}` and `{day}` are substituted (e.g. `S{year}{day}`)
    pub file_prefix: Option<String>,
    /// Flip input rows north/south at read time
    pub flip_latitude: bool,
    /// Directory for outputs. Default: `root`
    pub output_dir: Option<PathBuf>,
    pub climatology_file: String,
    pub climatology_box_file: String,
    pub metric_dir: String,
    pub spring_file: String,
    pub summer_file: String,
    pub box_statistics_dir: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: "MUR".to_string(),
            kind: None,
            root: PathBuf::from("."),
            start_year: 2003,
            end_year: 2020,
            grid_file: None,
            file_prefix: None,
            flip_latitude: false,
            output_dir: None,
            climatology_file: "climatology.json".to_string(),
            climatology_box_file: "climatology_box.json".to_string(),
            metric_dir: "metrics".to_string(),
            spring_file: "spring.json".to_string(),
            summer_file: "summer.json".to_string(),
            box_statistics_dir: "boxes".to_string(),
        }
    }
}

impl DatasetConfig {
    fn output_root(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.root)
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_root().join(path)
        }
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn n_years(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }

    pub fn climatology_path(&self) -> PathBuf {
        self.resolve(&self.climatology_file)
    }

    pub fn climatology_box_path(&self) -> PathBuf {
        self.resolve(&self.climatology_box_file)
    }

    pub fn spring_path(&self) -> PathBuf {
        self.resolve(&self.metric_dir).join(&self.spring_file)
    }

    pub fn summer_path(&self) -> PathBuf {
        self.resolve(&self.metric_dir).join(&self.summer_file)
    }

    pub fn box_statistics_dir(&self) -> PathBuf {
        self.resolve(&self.box_statistics_dir)
    }

    /// Explicit grid file, or the `<short name>_info.nc` file of the dataset root
    pub fn grid_path(&self) -> Option<PathBuf> {
        self.grid_file.clone().or_else(|| {
            podaac_short_name(&self.name).map(|short| self.root.join(format!("{short}_info.nc")))
        })
    }

    /// File name prefix for daily files of `year`/`day`
    pub fn prefix_for(&self, year: i32, day: u16) -> Option<String> {
        self.file_prefix.as_ref().map(|template| {
            template
                .replace("{year}", &format!("{year:04}"))
                .replace("{day}", &format!("{day:03}"))
        })
    }
}

/// Complete configuration of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenologyConfig {
    pub region: Region,
    pub thresholds: Thresholds,
    pub dataset: DatasetConfig,
}

impl PhenologyConfig {
    /// Parse, resolve the dataset kind and validate
    pub fn from_toml_str(text: &str) -> PhenologyResult<Self> {
        let mut config: PhenologyConfig = toml::from_str(text)?;
        config.resolve_kind()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PhenologyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PhenologyError::MissingFile(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> PhenologyResult<String> {
        toml::to_string(self).map_err(|e| PhenologyError::InvalidConfig(e.to_string()))
    }

    /// Fill in [`DatasetConfig::kind`] from the dataset name when it is not explicit
    pub fn resolve_kind(&mut self) -> PhenologyResult<()> {
        if self.dataset.kind.is_none() {
            let kind = DatasetKind::from_legacy_name(&self.dataset.name).ok_or_else(|| {
                PhenologyError::InvalidConfig(format!(
                    "Unknown dataset '{}'; set dataset.kind explicitly",
                    self.dataset.name
                ))
            })?;
            self.dataset.kind = Some(kind);
        }
        Ok(())
    }

    /// Resolved dataset kind
    pub fn kind(&self) -> PhenologyResult<&DatasetKind> {
        self.dataset.kind.as_ref().ok_or_else(|| {
            PhenologyError::InvalidConfig(format!(
                "Dataset kind of '{}' has not been resolved",
                self.dataset.name
            ))
        })
    }

    pub fn validate(&self) -> PhenologyResult<()> {
        self.region.validate()?;
        if self.dataset.start_year > self.dataset.end_year {
            return Err(PhenologyError::InvalidConfig(format!(
                "start_year ({}) is after end_year ({})",
                self.dataset.start_year, self.dataset.end_year
            )));
        }
        let t = &self.thresholds;
        if ![t.spring1, t.spring2, t.summer_offset].iter().all(|v| v.is_finite()) {
            return Err(PhenologyError::InvalidConfig(
                "thresholds must be finite".to_string(),
            ));
        }
        self.kind()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_names() {
        assert_eq!(
            DatasetKind::from_legacy_name("MUR"),
            Some(DatasetKind::sea_surface_temperature())
        );
        assert!(DatasetKind::from_legacy_name("cmc0.2deg").is_some());
        assert_eq!(
            DatasetKind::from_legacy_name("SeaWiFS"),
            Some(DatasetKind::chlorophyll())
        );
        assert!(DatasetKind::from_legacy_name("ERA5").is_none());
        assert_eq!(podaac_short_name("NCEI"), Some("AVHRR_OI-NCEI-L4-GLOB-v2.0"));
        assert_eq!(podaac_short_name("SeaWiFS"), None);
    }

    #[test]
    fn explicit_kind() {
        let config = PhenologyConfig::from_toml_str(
            r#"
            [dataset]
            name = "custom"
            start_year = 2000
            end_year = 2001
            kind = { type = "Chlorophyll", variable = "chl" }
            "#,
        )
        .unwrap();
        let kind = config.kind().unwrap();
        assert_eq!(kind.variable(), "chl");
        assert_eq!(kind.climatology_variable(), "chlor_climatology");
    }

    #[test]
    fn unknown_dataset_is_rejected() {
        let err = PhenologyConfig::from_toml_str("[dataset]\nname = \"ERA5\"\n").unwrap_err();
        assert!(matches!(err, PhenologyError::InvalidConfig(_)));
    }

    #[test]
    fn inverted_years_are_rejected() {
        let err = PhenologyConfig::from_toml_str(
            "[dataset]\nname = \"MUR\"\nstart_year = 2010\nend_year = 2000\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("start_year"));
    }

    #[test]
    fn invalid_region_is_rejected() {
        let err = PhenologyConfig::from_toml_str("[region]\nlat_boxsize = 0.0\n").unwrap_err();
        assert!(matches!(err, PhenologyError::InvalidRegion(_)));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = PhenologyConfig::default();
        config.resolve_kind().unwrap();
        config.thresholds.summer_offset = 0.5;
        let text = config.to_toml_string().unwrap();
        let parsed = PhenologyConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn paths() {
        let config = PhenologyConfig::from_toml_str(
            r#"
            [dataset]
            name = "MUR"
            root = "/data/mur"
            output_dir = "/out"
            file_prefix = "S{year}{day}"
            "#,
        )
        .unwrap();
        let ds = &config.dataset;
        assert_eq!(ds.climatology_path(), PathBuf::from("/out/climatology.json"));
        assert_eq!(ds.spring_path(), PathBuf::from("/out/metrics/spring.json"));
        assert_eq!(
            ds.grid_path(),
            Some(PathBuf::from("/data/mur/MUR-JPL-L4-GLOB-v4.1_info.nc"))
        );
        assert_eq!(ds.prefix_for(2003, 7).as_deref(), Some("S2003007"));
        assert_eq!(ds.n_years(), 18);
    }

    #[test]
    fn validity_rules() {
        let sst = DatasetKind::sea_surface_temperature();
        assert!(sst.accepts(280.0, Some(1.0)));
        assert!(!sst.accepts(280.0, Some(2.0)));
        assert!(!sst.accepts(350.0, Some(1.0)));
        assert!(sst.accepts(280.0, None));
        assert!(sst.accepts_for_box_statistics(350.0, Some(0.0)));
        assert!(!sst.accepts_for_box_statistics(280.0, Some(2.0)));
        assert!(sst.in_box_range(-100.0));
        assert!(!sst.in_box_range(-100.5));

        let chlor = DatasetKind::chlorophyll();
        assert!(!chlor.accepts(0.0, None));
        assert!(chlor.accepts(0.3, Some(2.0)));
        assert!(chlor.in_box_range(0.0));
        assert_eq!(chlor.days_scanned(2003), 365);
        assert_eq!(sst.days_scanned(2003), 366);
    }
}
