mod annual;
pub mod box_average;
pub mod climatology;
pub mod extrema;
pub mod spring;
pub mod summer;
pub mod turning_point;

pub use annual::{load_year, pixel_year};
pub use box_average::{box_climatology, box_statistics, BoxStatistics};
pub use climatology::{
    compute_climatology, Climatology, ClimatologyAccumulator, MonthlyRateAccumulator,
};
pub use extrema::{annual_extrema, AnnualExtrema, ExtremaGrid};
pub use spring::{compute_spring, spring_start, SpringMetric, SpringStart};
pub use summer::{compute_summer, summer_baseline, summer_start_end, SummerEvents, SummerMetric};
pub use turning_point::{detect_turning_day, turning_days};
