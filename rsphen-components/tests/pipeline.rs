use approx::assert_relative_eq;
use ndarray::{array, Array2, Ix2, Ix3};
use rsphen_components::pipeline::{box_statistics_path, run_stages, Stage};
use rsphen_components::source::{DailyField, DailyFieldSource, DirectorySource};
use rsphen_core::calendar::FILL_VALUE;
use rsphen_core::config::{DatasetKind, PhenologyConfig};
use rsphen_core::dataset::Dataset;
use rsphen_core::grid::Grid;
use std::path::Path;

const YEARS: [i32; 3] = [2001, 2002, 2003];

/// Seasonal cycle with its minimum on day 20 and maximum on day 202
fn seasonal(day: u16, year: i32) -> f64 {
    let phase = 2.0 * std::f64::consts::PI * (f64::from(day) - 20.0) / 365.0;
    285.0 - 5.0 * phase.cos() + 1.5 * f64::from(year - YEARS[0])
}

/// Daily JSON files for a 2x2 grid whose last pixel is land
fn write_daily_files(root: &Path) -> Grid {
    let grid = Grid::new(vec![0.0, 1.0], vec![10.0, 11.0]).unwrap();
    let kind = DatasetKind::sea_surface_temperature();
    for year in YEARS {
        for day in 1..=365u16 {
            let v = seasonal(day, year);
            let values: Array2<f64> = array![[v, v + 0.2], [v - 0.2, f64::NAN]];
            let field = DailyField::new(values);
            let path = root
                .join(format!("{year:04}"))
                .join(format!("{day:03}"))
                .join(format!("{year}{day:03}-sst.json"));
            field.to_dataset(&grid, &kind).unwrap().write(path).unwrap();
        }
    }
    grid
}

fn config(root: &Path, out: &Path) -> PhenologyConfig {
    PhenologyConfig::from_toml_str(&format!(
        r#"
[region]
lat_min = 0.0
lat_max = 1.0
lon_min = 10.0
lon_max = 11.0
lat_boxsize = 1.0
lon_boxsize = 1.0

[dataset]
name = "CMC"
root = "{}"
output_dir = "{}"
start_year = 2001
end_year = 2003
"#,
        root.display(),
        out.display()
    ))
    .unwrap()
}

#[test]
fn directory_source_reads_written_fields() {
    let dir = tempfile::tempdir().unwrap();
    let grid = write_daily_files(dir.path());
    let source = DirectorySource::new(dir.path(), DatasetKind::sea_surface_temperature())
        .with_sample_year(2001);

    assert_eq!(source.grid().unwrap(), grid);
    let fields = source.read_day(2002, 100);
    assert_eq!(fields.len(), 1);
    assert_relative_eq!(fields[0].values[[0, 0]], seasonal(100, 2002), epsilon = 1e-12);
    assert!(source.read_day(2002, 366).is_empty());
}

#[test]
fn all_stages_end_to_end() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_daily_files(data.path());
    let config = config(data.path(), out.path());

    let written = run_stages(&config, &Stage::ALL).unwrap();
    // climatology, box climatology, spring, summer and one box file per year
    assert_eq!(written.len(), 4 + YEARS.len());
    for path in &written {
        assert!(path.exists(), "{} was not written", path.display());
    }

    let climatology = Dataset::read(config.dataset.climatology_path()).unwrap();
    let mean = climatology.float_array::<Ix3>("sst_climatology").unwrap();
    assert_eq!(mean.dim(), (2, 2, 366));
    let expected = (seasonal(50, 2001) + seasonal(50, 2002) + seasonal(50, 2003)) / 3.0;
    assert!((mean[[0, 0, 49]] - expected).abs() < 1e-9);
    assert!(mean[[1, 1, 49]].is_nan());
    assert!(mean[[0, 0, 365]].is_nan());

    let spring = Dataset::read(config.dataset.spring_path()).unwrap();
    let day1 = spring.integer_array::<Ix3>("day_spring1").unwrap();
    for y in 0..YEARS.len() {
        let day = day1[[0, 0, y]];
        assert!((1..120).contains(&day), "spring day {day} in year {y}");
        assert_eq!(day1[[1, 1, y]], FILL_VALUE);
    }
    // warmer years cross the fixed thresholds earlier
    assert!(day1[[0, 0, 2]] <= day1[[0, 0, 0]]);

    let summer = Dataset::read(config.dataset.summer_path()).unwrap();
    let start = summer.integer_array::<Ix3>("day_summer_start").unwrap();
    assert_ne!(start[[0, 0, 2]], FILL_VALUE);
    let baseline_year = summer.integer_array::<Ix2>("year_summer_baseline").unwrap();
    assert_eq!(baseline_year[[0, 0]], 2001);

    let boxes = Dataset::read(box_statistics_path(&config, 2002).unwrap()).unwrap();
    let average = boxes.float_array::<Ix3>("sst_box_average").unwrap();
    assert_eq!(average.dim(), (365, 1, 1));
    let anomaly = boxes.float_array::<Ix3>("sst_box_anomaly").unwrap();
    // 2002 sits at the middle of the three years, so its anomaly is near zero
    assert!(anomaly[[100, 0, 0]].abs() < 1e-6, "{}", anomaly[[100, 0, 0]]);
}

#[test]
fn downstream_stage_without_climatology_fails() {
    let data = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_daily_files(data.path());
    let config = config(data.path(), out.path());

    assert!(run_stages(&config, &[Stage::Spring]).is_err());
    assert!(!config.dataset.spring_path().exists());
}
