//! Spatial averages over the boxes of a region
//!
//! [`box_climatology`] averages the day-of-year climatology over every box.
//! [`box_statistics`] summarises each daily field of a year per box and compares the
//! box mean with the box climatology of the same day.

use crate::source::{DailyField, DailyFieldSource};
use ndarray::{s, Array3, ArrayView3, Axis};
use rsphen_core::calendar::{day_index, DayOfYear, DAYS_PER_CLIMATOLOGY};
use rsphen_core::config::DatasetKind;
use rsphen_core::dataset::Dataset;
use rsphen_core::errors::{PhenologyError, PhenologyResult};
use rsphen_core::grid::{BoxLayout, GeoBox, Region};
use rsphen_core::maybe_rayon::*;
use rsphen_core::FloatValue;

/// Last climatology day used for the anomaly; day 366 borrows day 365
pub const LAST_ANOMALY_DAY: DayOfYear = 365;

/// Mean of the values of `mean[lat_range, lon_range, day]` kept by `kind`, for every day
fn box_day_means(mean: &ArrayView3<FloatValue>, geo: &GeoBox, kind: &DatasetKind) -> Vec<FloatValue> {
    let block = mean.slice(s![geo.lat_range(), geo.lon_range(), ..]);
    block
        .axis_iter(Axis(2))
        .map(|day| {
            let (sum, n) = day
                .iter()
                .filter(|v| kind.in_box_range(**v))
                .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
            if n == 0 {
                FloatValue::NAN
            } else {
                sum / n as FloatValue
            }
        })
        .collect()
}

/// Box averages of a `(nlat, nlon, ndays)` climatology, shaped `(ndays, nx, ny)`
pub fn box_climatology(
    mean: &Array3<FloatValue>,
    layout: &BoxLayout,
    kind: &DatasetKind,
) -> Array3<FloatValue> {
    let ndays = mean.len_of(Axis(2));
    let view = mean.view();
    let boxes: Vec<GeoBox> = layout.boxes().collect();
    let per_box: Vec<Vec<FloatValue>> = boxes
        .clone()
        .into_par_iter()
        .map(|geo| box_day_means(&view, &geo, kind))
        .collect();

    let mut out = Array3::from_elem((ndays, layout.nx(), layout.ny()), FloatValue::NAN);
    for (geo, values) in boxes.iter().zip(per_box) {
        for (d, v) in values.into_iter().enumerate() {
            out[[d, geo.row, geo.col]] = v;
        }
    }
    out
}

fn add_layout(ds: &mut Dataset, region: &Region, layout: &BoxLayout) -> PhenologyResult<()> {
    ds.add_dimension("nx", layout.nx())?;
    ds.add_dimension("ny", layout.ny())?;
    ds.set_attribute("lat_min", region.lat_min);
    ds.set_attribute("lat_max", region.lat_max);
    ds.set_attribute("lon_min", region.lon_min);
    ds.set_attribute("lon_max", region.lon_max);
    ds.set_attribute("lat_boxsize", region.lat_boxsize);
    ds.set_attribute("lon_boxsize", region.lon_boxsize);
    Ok(())
}

/// Box climatology file contents, `(daynumber, nx, ny)`
pub fn box_climatology_dataset(
    averages: &Array3<FloatValue>,
    kind: &DatasetKind,
    region: &Region,
    layout: &BoxLayout,
) -> PhenologyResult<Dataset> {
    let mut ds = Dataset::new();
    let ndays = averages.len_of(Axis(0));
    ds.add_integer_coordinate("daynumber", (1..=ndays as i32).collect())?;
    add_layout(&mut ds, region, layout)?;
    ds.add_float(
        &kind.box_average_variable(),
        &["daynumber", "nx", "ny"],
        averages.clone().into_dyn(),
    )?;
    Ok(ds)
}

/// Mean and population standard deviation of a set of values, `NaN` when empty
pub fn mean_std(values: &[FloatValue]) -> (FloatValue, FloatValue) {
    if values.is_empty() {
        return (FloatValue::NAN, FloatValue::NAN);
    }
    let n = values.len() as FloatValue;
    let mean = values.iter().sum::<FloatValue>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<FloatValue>() / n;
    (mean, var.sqrt())
}

/// Values of the fields inside `geo` accepted for box statistics
fn box_values(fields: &[DailyField], geo: &GeoBox, kind: &DatasetKind) -> Vec<FloatValue> {
    let mut values = Vec::with_capacity(geo.n_pixels() * fields.len());
    for field in fields {
        for i in geo.lat_range() {
            for j in geo.lon_range() {
                let v = field.values[[i, j]];
                if kind.accepts_for_box_statistics(v, field.mask_at(i, j)) {
                    values.push(v);
                }
            }
        }
    }
    values
}

/// Per-box daily statistics of one year
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStatistics {
    pub year: i32,
    /// Days with at least one field, the `time` coordinate
    pub days: Vec<DayOfYear>,
    /// `(n_days, nx, ny)`
    pub average: Array3<FloatValue>,
    pub anomaly: Array3<FloatValue>,
    pub std: Array3<FloatValue>,
}

impl BoxStatistics {
    pub fn to_dataset(
        &self,
        kind: &DatasetKind,
        region: &Region,
        layout: &BoxLayout,
    ) -> PhenologyResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_integer_coordinate("time", self.days.iter().map(|&d| i32::from(d)).collect())?;
        add_layout(&mut ds, region, layout)?;
        ds.set_attribute("year", self.year);
        let dims = ["time", "nx", "ny"];
        ds.add_float(&kind.box_average_variable(), &dims, self.average.clone().into_dyn())?;
        ds.add_float(&kind.box_anomaly_variable(), &dims, self.anomaly.clone().into_dyn())?;
        ds.add_float(&kind.box_std_variable(), &dims, self.std.clone().into_dyn())?;
        Ok(ds)
    }
}

/// Box mean, anomaly and standard deviation of every day of `year`
///
/// `climatology` is the `(366, nx, ny)` output of [`box_climatology`].
pub fn box_statistics(
    source: &dyn DailyFieldSource,
    kind: &DatasetKind,
    year: i32,
    layout: &BoxLayout,
    climatology: &Array3<FloatValue>,
) -> PhenologyResult<BoxStatistics> {
    let expected = (DAYS_PER_CLIMATOLOGY, layout.nx(), layout.ny());
    if climatology.dim() != expected {
        return Err(PhenologyError::ShapeMismatch {
            name: "box climatology".to_string(),
            expected: vec![expected.0, expected.1, expected.2],
            actual: climatology.shape().to_vec(),
        });
    }
    let shape = source.grid()?.shape();
    let boxes: Vec<GeoBox> = layout.boxes().collect();
    let mut days = Vec::new();
    let mut rows: Vec<Vec<(FloatValue, FloatValue)>> = Vec::new();

    for day in 1..=kind.days_scanned(year) {
        let fields: Vec<DailyField> = source
            .read_day(year, day)
            .into_iter()
            .filter(|field| {
                let matches = field.shape() == shape;
                if !matches {
                    log::warn!(
                        "Skipping field {year}/{day:03}: shape {:?} does not match the grid {shape:?}",
                        field.shape()
                    );
                }
                matches
            })
            .collect();
        if fields.is_empty() {
            continue;
        }
        let stats: Vec<(FloatValue, FloatValue)> = boxes
            .clone()
            .into_par_iter()
            .map(|geo| mean_std(&box_values(&fields, &geo, kind)))
            .collect();
        days.push(day);
        rows.push(stats);
    }

    let out_shape = (days.len(), layout.nx(), layout.ny());
    let mut average = Array3::from_elem(out_shape, FloatValue::NAN);
    let mut anomaly = Array3::from_elem(out_shape, FloatValue::NAN);
    let mut std = Array3::from_elem(out_shape, FloatValue::NAN);
    for (t, (day, stats)) in days.iter().zip(rows).enumerate() {
        let clim_index = day_index((*day).min(LAST_ANOMALY_DAY));
        for (geo, (mean, sd)) in boxes.iter().zip(stats) {
            average[[t, geo.row, geo.col]] = mean;
            std[[t, geo.row, geo.col]] = sd;
            anomaly[[t, geo.row, geo.col]] = mean - climatology[[clim_index, geo.row, geo.col]];
        }
    }
    log::info!("Box statistics of {year}: {} days", days.len());

    Ok(BoxStatistics {
        year,
        days,
        average,
        anomaly,
        std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DirectorySource, MemorySource};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use rsphen_core::grid::{box_layout, Grid};

    fn grid() -> Grid {
        Grid::new(vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 11.0, 12.0, 13.0]).unwrap()
    }

    fn region() -> Region {
        Region::new(0.0, 3.0, 10.0, 13.0, 1.5, 3.0)
    }

    #[test]
    fn box_means_with_range_rejection() {
        let layout = box_layout(&region(), &grid()).unwrap();
        assert_eq!((layout.nx(), layout.ny()), (2, 1));

        let mut mean = Array3::from_elem((4, 4, 2), 280.0);
        mean[[0, 0, 0]] = 400.0;
        mean[[1, 1, 0]] = f64::NAN;
        mean[[3, 3, 1]] = 290.0;
        let kind = DatasetKind::sea_surface_temperature();
        let averages = box_climatology(&mean, &layout, &kind);
        assert_eq!(averages.dim(), (2, 2, 1));
        assert_relative_eq!(averages[[0, 0, 0]], 280.0);
        let (lo, hi) = layout.lat_bounds()[1];
        let n = ((hi - lo + 1) * 4) as f64;
        assert_relative_eq!(averages[[1, 1, 0]], (280.0 * (n - 1.0) + 290.0) / n);
    }

    #[test]
    fn empty_box_is_nan() {
        let layout = box_layout(&region(), &grid()).unwrap();
        let mean = Array3::from_elem((4, 4, 1), -0.5);
        let averages = box_climatology(&mean, &layout, &DatasetKind::chlorophyll());
        assert!(averages.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn population_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std, 2.0);
        let (mean, std) = mean_std(&[]);
        assert!(mean.is_nan() && std.is_nan());
    }

    #[test]
    fn yearly_statistics_and_anomaly() {
        let layout = box_layout(&region(), &grid()).unwrap();
        let kind = DatasetKind::sea_surface_temperature();
        let mut source = MemorySource::new(grid());
        let field = |v: f64| DailyField::new(Array2::from_elem((4, 4), v));
        source.insert(2004, 10, field(282.0)).unwrap();
        source.insert(2004, 366, field(284.0)).unwrap();
        source
            .insert(
                2004,
                20,
                field(285.0).with_mask(Array2::from_elem((4, 4), 2.0)),
            )
            .unwrap();

        let mut clim = Array3::from_elem((366, 2, 1), 280.0);
        clim[[364, 0, 0]] = 283.0;
        clim[[365, 0, 0]] = 0.0;

        let stats = box_statistics(&source, &kind, 2004, &layout, &clim).unwrap();
        assert_eq!(stats.days, vec![10, 20, 366]);
        assert_relative_eq!(stats.average[[0, 0, 0]], 282.0);
        assert_relative_eq!(stats.std[[0, 0, 0]], 0.0);
        assert_relative_eq!(stats.anomaly[[0, 1, 0]], 2.0);
        // land only
        assert!(stats.average[[1, 0, 0]].is_nan());
        // day 366 is compared with day 365
        assert_relative_eq!(stats.anomaly[[2, 0, 0]], 1.0);

        let ds = stats.to_dataset(&kind, &region(), &layout).unwrap();
        assert_eq!(ds.dimension("time"), Some(3));
        assert!(ds.has_variable("sst_box_anomaly"));
    }

    #[test]
    fn mis_shaped_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let kind = DatasetKind::sea_surface_temperature();
        let good = DailyField::new(Array2::from_elem((4, 4), 282.0));
        good.to_dataset(&grid(), &kind)
            .unwrap()
            .write(dir.path().join("2004/010/a.json"))
            .unwrap();
        let small = Grid::new(vec![0.0, 1.0], vec![10.0, 11.0]).unwrap();
        DailyField::new(Array2::from_elem((2, 2), 300.0))
            .to_dataset(&small, &kind)
            .unwrap()
            .write(dir.path().join("2004/010/b.json"))
            .unwrap();
        DailyField::new(Array2::from_elem((2, 2), 300.0))
            .to_dataset(&small, &kind)
            .unwrap()
            .write(dir.path().join("2004/011/a.json"))
            .unwrap();

        let source = DirectorySource::new(dir.path(), kind.clone())
            .with_grid_file(dir.path().join("2004/010/a.json"));
        let layout = box_layout(&region(), &grid()).unwrap();
        let clim = Array3::from_elem((366, 2, 1), 280.0);
        let stats = box_statistics(&source, &kind, 2004, &layout, &clim).unwrap();

        assert_eq!(stats.days, vec![10]);
        assert_relative_eq!(stats.average[[0, 0, 0]], 282.0);
        assert_relative_eq!(stats.anomaly[[0, 1, 0]], 2.0);
    }

    #[test]
    fn climatology_shape_is_checked() {
        let layout = box_layout(&region(), &grid()).unwrap();
        let source = MemorySource::new(grid());
        let clim = Array3::from_elem((365, 2, 1), 280.0);
        let err = box_statistics(&source, &DatasetKind::chlorophyll(), 2003, &layout, &clim);
        assert!(err.is_err());
    }
}
