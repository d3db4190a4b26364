//! One year of daily fields as a `(nlat, nlon, 366)` cube

use crate::source::DailyFieldSource;
use ndarray::{s, Array2, Array3, Axis, Zip};
use rsphen_core::calendar::{day_index, DAYS_PER_CLIMATOLOGY};
use rsphen_core::config::DatasetKind;
use rsphen_core::FloatValue;

/// Daily values of one year, position `d - 1` holding day `d`
///
/// Pixel-days without a valid observation are `NaN`. When a day has several fields
/// the valid values are averaged.
pub fn load_year(
    source: &dyn DailyFieldSource,
    kind: &DatasetKind,
    year: i32,
    shape: (usize, usize),
) -> Array3<FloatValue> {
    let (nlat, nlon) = shape;
    let mut cube = Array3::from_elem((nlat, nlon, DAYS_PER_CLIMATOLOGY), FloatValue::NAN);
    let mut sum = Array2::<FloatValue>::zeros(shape);
    let mut count = Array2::<u32>::zeros(shape);

    for day in 1..=kind.days_scanned(year) {
        let fields = source.read_day(year, day);
        if fields.is_empty() {
            continue;
        }
        sum.fill(0.0);
        count.fill(0);
        for field in &fields {
            if field.shape() != shape {
                log::warn!(
                    "Skipping field {year}/{day:03}: shape {:?} does not match the grid {shape:?}",
                    field.shape()
                );
                continue;
            }
            Zip::indexed(&mut sum)
                .and(&mut count)
                .and(&field.values)
                .for_each(|(i, j), s, c, &v| {
                    if kind.accepts(v, field.mask_at(i, j)) {
                        *s += v;
                        *c += 1;
                    }
                });
        }
        let mut slice = cube.index_axis_mut(Axis(2), day_index(day));
        Zip::from(&mut slice)
            .and(&sum)
            .and(&count)
            .for_each(|out, &s, &c| {
                if c > 0 {
                    *out = s / FloatValue::from(c);
                }
            });
    }
    cube
}

/// Raw daily series of pixel `(i, j)`
pub fn pixel_year(cube: &Array3<FloatValue>, i: usize, j: usize) -> Vec<FloatValue> {
    cube.slice(s![i, j, ..]).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DailyField, MemorySource};
    use ndarray::array;
    use rsphen_core::grid::Grid;

    #[test]
    fn days_are_placed_and_averaged() {
        let grid = Grid::new(vec![0.0, 1.0], vec![0.0]).unwrap();
        let mut source = MemorySource::new(grid);
        source.insert(2004, 1, DailyField::new(array![[280.0], [281.0]])).unwrap();
        source
            .insert(
                2004,
                366,
                DailyField::new(array![[284.0], [290.0]]).with_mask(array![[1.0], [2.0]]),
            )
            .unwrap();
        source.insert(2004, 366, DailyField::new(array![[286.0], [f64::NAN]])).unwrap();

        let kind = DatasetKind::sea_surface_temperature();
        let cube = load_year(&source, &kind, 2004, (2, 1));
        assert_eq!(cube[[0, 0, 0]], 280.0);
        assert_eq!(cube[[0, 0, 365]], 285.0);
        assert!(cube[[1, 0, 365]].is_nan());
        assert!(pixel_year(&cube, 1, 0)[1..365].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn chlorophyll_stops_at_year_end() {
        let grid = Grid::new(vec![0.0], vec![0.0]).unwrap();
        let mut source = MemorySource::new(grid);
        source.insert(2003, 366, DailyField::new(array![[0.4]])).unwrap();
        source.insert(2003, 365, DailyField::new(array![[0.3]])).unwrap();

        let cube = load_year(&source, &DatasetKind::chlorophyll(), 2003, (1, 1));
        assert_eq!(cube[[0, 0, 364]], 0.3);
        assert!(cube[[0, 0, 365]].is_nan());
    }
}
