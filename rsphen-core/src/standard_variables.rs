//! Definitions of every variable persisted by the pipeline
//!
//! These are registered at compile time with [`define_output_variable!`] and are
//! available through [`lookup`](crate::variable::lookup).
//!
//! ```rust
//! use rsphen_core::standard_variables::VAR_DAY_SUMMER_START;
//! use rsphen_core::variable::lookup;
//!
//! assert_eq!(VAR_DAY_SUMMER_START.name, "day_summer_start");
//! assert_eq!(lookup("data_rate").unwrap().unit, "kelvin/yr");
//! ```
//!
//! # Available Variables
//!
//! ## Coordinates
//! `lat`, `lon`, `time`, `daynumber`, `year`, `month`
//!
//! ## Climatology
//! `sst_climatology`, `chlor_climatology`, `diff_sst_climatology`,
//! `diff_chlor_climatology`, `data_rate`, `chlor_num_days`
//!
//! ## Phenology
//! `day_min`, `day_max`, `data_min`, `data_max`, `day_spring1`, `day_spring2`,
//! `day_spring_trend1`, `day_spring_trend2`, `day_summer_start`, `day_summer_end`,
//! `day_summer_start_trend`, `day_summer_end_trend`, `data_summer_baseline`,
//! `year_summer_baseline`
//!
//! ## Boxes
//! `sst_box_average`, `chlor_box_average`, `sst_box_anomaly`, `chlor_box_anomaly`,
//! `sst_box_std`, `chlor_box_std`

use crate::define_output_variable;
use crate::variable::StorageType;

// ============================================================================
// Coordinates
// ============================================================================

define_output_variable!(
    VAR_LAT,
    name = "lat",
    unit = "degrees_north",
    description = "Latitude",
    storage = StorageType::Float,
    fill = false,
);

define_output_variable!(
    VAR_LON,
    name = "lon",
    unit = "degrees_east",
    description = "Longitude",
    storage = StorageType::Float,
    fill = false,
);

define_output_variable!(
    VAR_TIME,
    name = "time",
    unit = "day of year",
    description = "Day of year",
    storage = StorageType::Integer,
    fill = false,
);

define_output_variable!(
    VAR_DAYNUMBER,
    name = "daynumber",
    unit = "day of year",
    description = "Day of year",
    storage = StorageType::Integer,
    fill = false,
);

define_output_variable!(
    VAR_YEAR,
    name = "year",
    unit = "year",
    description = "Calendar year",
    storage = StorageType::Integer,
    fill = false,
);

define_output_variable!(
    VAR_MONTH,
    name = "month",
    unit = "month",
    description = "Calendar month",
    storage = StorageType::Integer,
    fill = false,
);

// ============================================================================
// Climatology
// ============================================================================

define_output_variable!(
    VAR_SST_CLIMATOLOGY,
    name = "sst_climatology",
    unit = "kelvin",
    description = "Mean sea surface temperature per day of year",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_CHLOR_CLIMATOLOGY,
    name = "chlor_climatology",
    unit = "mg m-3",
    description = "Mean chlorophyll-a concentration per day of year",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DIFF_SST_CLIMATOLOGY,
    name = "diff_sst_climatology",
    unit = "kelvin/day",
    description = "Day-to-day difference of the sea surface temperature climatology",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DIFF_CHLOR_CLIMATOLOGY,
    name = "diff_chlor_climatology",
    unit = "mg m-3/day",
    description = "Day-to-day difference of the chlorophyll-a climatology",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DATA_RATE,
    name = "data_rate",
    unit = "kelvin/yr",
    description = "Rate of change of the monthly mean sea surface temperature",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_CHLOR_NUM_DAYS,
    name = "chlor_num_days",
    unit = "1",
    description = "Number of valid chlorophyll-a observations per day of year",
    storage = StorageType::Integer,
    fill = false,
);

// ============================================================================
// Annual extrema
// ============================================================================

define_output_variable!(
    VAR_DAY_MIN,
    name = "day_min",
    unit = "day of year",
    description = "Day of the annual minimum of the smoothed series",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DAY_MAX,
    name = "day_max",
    unit = "day of year",
    description = "Day of the annual maximum of the smoothed series",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DATA_MIN,
    name = "data_min",
    unit = "kelvin",
    description = "Annual minimum of the smoothed series",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DATA_MAX,
    name = "data_max",
    unit = "kelvin",
    description = "Annual maximum of the smoothed series",
    storage = StorageType::Float,
    fill = true,
);

// ============================================================================
// Spring
// ============================================================================

define_output_variable!(
    VAR_DAY_SPRING1,
    name = "day_spring1",
    unit = "day of year",
    description = "First day after the turning day exceeding the first spring threshold",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SPRING2,
    name = "day_spring2",
    unit = "day of year",
    description = "First day after the turning day exceeding the second spring threshold",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SPRING_TREND1,
    name = "day_spring_trend1",
    unit = "days/yr",
    description = "Trend of the first spring start day",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SPRING_TREND2,
    name = "day_spring_trend2",
    unit = "days/yr",
    description = "Trend of the second spring start day",
    storage = StorageType::Float,
    fill = true,
);

// ============================================================================
// Summer
// ============================================================================

define_output_variable!(
    VAR_DAY_SUMMER_START,
    name = "day_summer_start",
    unit = "day of year",
    description = "First day reaching the summer baseline plus offset",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SUMMER_END,
    name = "day_summer_end",
    unit = "day of year",
    description = "First day after the annual maximum falling to the summer baseline plus offset",
    storage = StorageType::Integer,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SUMMER_START_TREND,
    name = "day_summer_start_trend",
    unit = "days/yr",
    description = "Trend of the summer start day",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DAY_SUMMER_END_TREND,
    name = "day_summer_end_trend",
    unit = "days/yr",
    description = "Trend of the summer end day",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_DATA_SUMMER_BASELINE,
    name = "data_summer_baseline",
    unit = "kelvin",
    description = "Minimum across years of the smoothed summer maximum",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_YEAR_SUMMER_BASELINE,
    name = "year_summer_baseline",
    unit = "year",
    description = "Year in which the summer baseline was observed",
    storage = StorageType::Integer,
    fill = true,
);

// ============================================================================
// Boxes
// ============================================================================

define_output_variable!(
    VAR_SST_BOX_AVERAGE,
    name = "sst_box_average",
    unit = "kelvin",
    description = "Box mean sea surface temperature",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_CHLOR_BOX_AVERAGE,
    name = "chlor_box_average",
    unit = "mg m-3",
    description = "Box mean chlorophyll-a concentration",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_SST_BOX_ANOMALY,
    name = "sst_box_anomaly",
    unit = "kelvin",
    description = "Box mean sea surface temperature minus the box climatology",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_CHLOR_BOX_ANOMALY,
    name = "chlor_box_anomaly",
    unit = "mg m-3",
    description = "Box mean chlorophyll-a concentration minus the box climatology",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_SST_BOX_STD,
    name = "sst_box_std",
    unit = "kelvin",
    description = "Standard deviation of sea surface temperature within the box",
    storage = StorageType::Float,
    fill = true,
);

define_output_variable!(
    VAR_CHLOR_BOX_STD,
    name = "chlor_box_std",
    unit = "mg m-3",
    description = "Standard deviation of chlorophyll-a concentration within the box",
    storage = StorageType::Float,
    fill = true,
);
