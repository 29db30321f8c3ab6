//! Station hydrographs from routed discharge output.
//!
//! The input is the tab separated point output of the routing model, one row per station per
//! output time. Column 0 holds seconds since the start of the run, column 3 the station id and
//! column 6 the discharge in cubic meters per second.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use crate::{errors::HydroGridErr, output::TextOutput};

pub use self::stations::{ReturnFlows, ReturnPeriod, Station, StationDb};

mod stations;

/// Hours after the start excluded as model spin up.
pub const SPIN_UP_HOURS: i64 = 6;
/// Last hour included in a hydrograph.
pub const LAST_HOUR: i64 = 48;

const TIME_COL: usize = 0;
const STATION_COL: usize = 3;
const DISCHARGE_COL: usize = 6;

/// One row of routed point output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowRecord {
    /// Seconds since the start of the run.
    pub seconds: i64,
    /// Station id.
    pub station_id: i64,
    /// Discharge, m^3/s.
    pub discharge: f64,
}

impl FlowRecord {
    /// Whole hours since the start of the run.
    pub fn hour(&self) -> i64 {
        self.seconds.div_euclid(3600)
    }
}

/// Parse tab separated point output.
pub fn read_records<R: Read>(rdr: R) -> Result<Vec<FlowRecord>, HydroGridErr> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut records = vec![];
    for record in csv_rdr.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line() as usize).unwrap_or(0);

        if record.len() == 1 && record.get(0).map(str::is_empty).unwrap_or(true) {
            continue;
        }

        let field = |col: usize| {
            record.get(col).ok_or_else(|| HydroGridErr::InvalidRecord {
                line,
                reason: format!("{} columns, need at least {}", record.len(), DISCHARGE_COL + 1),
            })
        };
        let bad_number = |col: usize, text: &str| HydroGridErr::InvalidRecord {
            line,
            reason: format!("column {} is not a number: '{}'", col, text),
        };

        let text = field(TIME_COL)?;
        let seconds = text.parse::<i64>().map_err(|_| bad_number(TIME_COL, text))?;
        let text = field(STATION_COL)?;
        let station_id = text
            .parse::<i64>()
            .map_err(|_| bad_number(STATION_COL, text))?;
        let text = field(DISCHARGE_COL)?;
        let discharge = text
            .parse::<f64>()
            .map_err(|_| bad_number(DISCHARGE_COL, text))?;

        records.push(FlowRecord {
            seconds,
            station_id,
            discharge,
        });
    }

    Ok(records)
}

/// Hourly discharge of one station inside the hydrograph window.
#[derive(Clone, Debug, PartialEq)]
pub struct StationSeries {
    /// Station id.
    pub station_id: i64,
    /// `(hour, discharge)` in input order, discharge rounded to whole m^3/s.
    pub points: Vec<(i64, f64)>,
}

impl StationSeries {
    /// Peak discharge, never below zero.
    pub fn max_discharge(&self) -> f64 {
        self.points.iter().map(|&(_, q)| q).fold(0.0, f64::max)
    }
}

/// Group records by station keeping hours in `(SPIN_UP_HOURS, LAST_HOUR]`.
///
/// Stations with nothing inside the window are left out. The result is ordered by station id.
pub fn collect_series(records: &[FlowRecord]) -> Vec<StationSeries> {
    let mut by_station: BTreeMap<i64, Vec<(i64, f64)>> = BTreeMap::new();

    for rec in records {
        let points = by_station.entry(rec.station_id).or_insert_with(Vec::new);

        let hour = rec.hour();
        if hour > SPIN_UP_HOURS && hour <= LAST_HOUR {
            points.push((hour, rec.discharge.round()));
        }
    }

    by_station
        .into_iter()
        .filter(|(station_id, points)| {
            if points.is_empty() {
                tracing::debug!("station id {} has no data in the window", station_id);
            }
            !points.is_empty()
        })
        .map(|(station_id, points)| StationSeries { station_id, points })
        .collect()
}

/// Write a series as `hour,discharge` CSV.
pub fn write_series<W: Write>(series: &StationSeries, out: W) -> Result<(), HydroGridErr> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(&["hour", "discharge"])?;
    for (hour, discharge) in &series.points {
        writer.write_record(&[hour.to_string(), discharge.to_string()])?;
    }
    writer.flush()?;

    Ok(())
}

/// The outcome for one station.
#[derive(Clone, Debug, PartialEq)]
pub struct StationReport {
    /// Station number from the database.
    pub station_num: String,
    /// Number of points in the hydrograph.
    pub points: usize,
    /// Peak discharge.
    pub max_discharge: f64,
    /// Bracket of the peak.
    pub return_period: ReturnPeriod,
    /// Where the series was saved, if it was.
    pub series_file: Option<PathBuf>,
}

/// Settings for a hydrograph run.
#[derive(Clone, Debug)]
pub struct HydrographConfig {
    /// Tab separated point output.
    pub input: PathBuf,
    /// Station database.
    pub database: PathBuf,
    /// Save each station series here when set.
    pub series_dir: Option<PathBuf>,
}

/// Build the hydrograph summary of every station found in both the input and the database.
pub fn run(config: &HydrographConfig) -> Result<Vec<StationReport>, HydroGridErr> {
    let stations = StationDb::connect(&config.database)?.stations()?;

    let records = read_records(open_input(&config.input)?)?;
    tracing::info!("read {} records from {}", records.len(), config.input.display());

    let mut reports = vec![];
    for series in collect_series(&records) {
        let station = match stations.get(&series.station_id) {
            Some(station) => station,
            None => {
                tracing::warn!("No station with id: {}", series.station_id);
                continue;
            }
        };

        let max_discharge = series.max_discharge();
        let return_period = ReturnPeriod::classify(max_discharge, &station.flows);
        tracing::info!(
            "Station num: {} has max discharge: {}",
            station.station_num,
            max_discharge
        );

        let series_file = match config.series_dir {
            Some(ref dir) => Some(save_series(dir, &station.station_num, &series)?),
            None => None,
        };

        reports.push(StationReport {
            station_num: station.station_num.clone(),
            points: series.points.len(),
            max_discharge,
            return_period,
            series_file,
        });
    }

    Ok(reports)
}

fn open_input(path: &Path) -> Result<File, HydroGridErr> {
    File::open(path).map_err(|err| HydroGridErr::ResourceUnavailable {
        path: PathBuf::from(path),
        reason: err.to_string(),
    })
}

fn save_series(
    dir: &Path,
    station_num: &str,
    series: &StationSeries,
) -> Result<PathBuf, HydroGridErr> {
    let path = dir.join(format!("hg_{}.csv", station_num));

    let mut out = TextOutput::create(&path, false)?;
    write_series(series, &mut out)?;
    out.finish()?;

    Ok(path)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use tempdir::TempDir;

    // seconds, station id and discharge in the columns the model writes them to.
    fn row(seconds: i64, station_id: i64, discharge: f64) -> String {
        format!(
            "{}\t2013-10-17_00:00:00\t{}\t{}\t34.9\t31.2\t{}\t0.5\n",
            seconds,
            seconds / 3600,
            station_id,
            discharge
        )
    }

    #[test]
    fn test_read_records() {
        let text = format!("{}{}\n", row(7 * 3600, 3, 12.4), row(8 * 3600 + 59, 4, 0.6));
        let records = read_records(text.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].station_id, 3);
        assert_eq!(records[0].discharge, 12.4);
        assert_eq!(records[1].hour(), 8);

        match read_records("3600\t\t1\t3\n".as_bytes()) {
            Err(HydroGridErr::InvalidRecord { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
        let text = format!("{}{}", row(3600, 3, 1.0), "x\ta\tb\t3\tc\td\t1.0\n");
        match read_records(text.as_bytes()) {
            Err(HydroGridErr::InvalidRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_series_window() {
        let flow = |hour: i64, station_id: i64, discharge: f64| FlowRecord {
            seconds: hour * 3600,
            station_id,
            discharge,
        };
        let records = vec![
            flow(6, 2, 100.0),
            flow(7, 2, 2.5),
            flow(48, 2, 3.4),
            flow(49, 2, 500.0),
            flow(1, 1, 9.0),
            flow(10, 0, 0.2),
        ];

        let series = collect_series(&records);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].station_id, 0);
        assert_eq!(series[1].station_id, 2);
        assert_eq!(series[1].points, vec![(7, 3.0), (48, 3.0)]);
        assert_eq!(series[1].max_discharge(), 3.0);
        assert_eq!(series[0].max_discharge(), 0.0);
    }

    #[test]
    fn test_run() {
        let tmp = TempDir::new("hydro-grid-hydrograph").unwrap();
        let input = tmp.path().join("frxst_pts_out.txt");
        let database = tmp.path().join("stations.db");
        let series_dir = tmp.path().join("graphs");
        std::fs::create_dir_all(&series_dir).unwrap();

        let text: String = vec![
            row(7 * 3600, 1, 30.2),
            row(7 * 3600, 2, 1.0),
            row(7 * 3600, 9, 1.0),
            row(8 * 3600, 1, 55.0),
            row(8 * 3600, 2, 1.0),
            row(8 * 3600, 9, 1.0),
        ]
        .concat();
        std::fs::write(&input, text).unwrap();

        let db = StationDb::create(&database).unwrap();
        db.add_station(&Station {
            id: 1,
            station_num: "17105".to_owned(),
            flows: ReturnFlows([Some(10.0), Some(20.0), Some(40.0), Some(80.0), Some(160.0)]),
        })
        .unwrap();
        db.add_station(&Station {
            id: 2,
            station_num: "21140".to_owned(),
            flows: ReturnFlows::default(),
        })
        .unwrap();
        drop(db);

        let config = HydrographConfig {
            input,
            database,
            series_dir: Some(series_dir.clone()),
        };
        let reports = run(&config).unwrap();

        // Station 9 is not in the database.
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].station_num, "17105");
        assert_eq!(reports[0].points, 2);
        assert_eq!(reports[0].max_discharge, 55.0);
        assert_eq!(reports[0].return_period, ReturnPeriod::From25To50);
        assert_eq!(reports[1].return_period, ReturnPeriod::NoData);

        let saved = series_dir.join("hg_17105.csv");
        assert_eq!(reports[0].series_file.as_ref(), Some(&saved));
        assert_eq!(
            std::fs::read_to_string(&saved).unwrap(),
            "hour,discharge\n7,30\n8,55\n"
        );
    }
}
