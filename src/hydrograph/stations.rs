//! Hydrometric stations and their return period flows.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::errors::HydroGridErr;

/// How rare a peak flow is, by the return period bracket it falls in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, AsStaticStr, EnumIter, Hash)]
pub enum ReturnPeriod {
    /// The station has no return period flows on record.
    #[strum(to_string = "no_data", serialize = "NODATA")]
    NoData,
    /// At or below the 5 year flow.
    #[strum(to_string = "lt5", serialize = "LT5")]
    Under5,
    /// Above the 5 year flow, at or below the 10 year flow.
    #[strum(to_string = "5-10")]
    From5To10,
    /// Above the 10 year flow, at or below the 25 year flow.
    #[strum(to_string = "10-25")]
    From10To25,
    /// Above the 25 year flow, at or below the 50 year flow.
    #[strum(to_string = "25-50")]
    From25To50,
    /// Above the 50 year flow, at or below the 100 year flow.
    #[strum(to_string = "50-100")]
    From50To100,
    /// Above the 100 year flow.
    #[strum(to_string = "gt100", serialize = "GT100")]
    Over100,
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ReturnPeriod::*;

        let text = match *self {
            NoData => "no return period data",
            Under5 => "less than 5 years",
            From5To10 => "5 to 10 years",
            From10To25 => "10 to 25 years",
            From25To50 => "25 to 50 years",
            From50To100 => "50 to 100 years",
            Over100 => "greater than 100 years",
        };

        write!(f, "{}", text)
    }
}

/// Flows for the 5, 10, 25, 50 and 100 year return periods, in that order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReturnFlows(pub [Option<f64>; 5]);

impl ReturnPeriod {
    /// Classify a peak flow.
    ///
    /// A station without a positive 5 year flow has no data. A missing upper threshold is never
    /// matched, so the peak falls through to the next bracket.
    pub fn classify(peak: f64, flows: &ReturnFlows) -> Self {
        use ReturnPeriod::*;

        match flows.0[0] {
            None => return NoData,
            Some(five) if five == 0.0 => return NoData,
            _ => {}
        }

        let brackets = [Under5, From5To10, From10To25, From25To50, From50To100];
        brackets
            .iter()
            .zip(flows.0.iter())
            .find(|(_, flow)| flow.map(|flow| peak <= flow).unwrap_or(false))
            .map(|(&period, _)| period)
            .unwrap_or(Over100)
    }
}

/// A station as listed in the database.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    /// Id used in the simulation output.
    pub id: i64,
    /// The agency station number.
    pub station_num: String,
    /// Return period flows.
    pub flows: ReturnFlows,
}

/// Read only handle on a station database.
#[derive(Debug)]
pub struct StationDb {
    db_conn: rusqlite::Connection,
}

impl StationDb {
    /// Open an existing database.
    pub fn connect(path: &Path) -> Result<Self, HydroGridErr> {
        if !path.is_file() {
            return Err(HydroGridErr::ResourceUnavailable {
                path: PathBuf::from(path),
                reason: "no such database".to_owned(),
            });
        }

        let db_conn = rusqlite::Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;

        Ok(StationDb { db_conn })
    }

    /// Create a database with an empty station table, or open it if it already exists.
    pub fn create(path: &Path) -> Result<Self, HydroGridErr> {
        let db_conn = rusqlite::Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )?;

        db_conn.execute_batch(include_str!("stations/create_stations.sql"))?;

        Ok(StationDb { db_conn })
    }

    /// Add or replace a station.
    pub fn add_station(&self, station: &Station) -> Result<(), HydroGridErr> {
        let flows = &station.flows.0;

        self.db_conn.execute(
            "INSERT OR REPLACE INTO hydro_stations
                (id, station_num, flow_5yr, flow_10yr, flow_25yr, flow_50yr, flow_100yr)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                station.id,
                station.station_num,
                flows[0],
                flows[1],
                flows[2],
                flows[3],
                flows[4],
            ],
        )?;

        Ok(())
    }

    /// All stations keyed by id.
    pub fn stations(&self) -> Result<HashMap<i64, Station>, HydroGridErr> {
        let mut stmt = self
            .db_conn
            .prepare(include_str!("stations/select_stations.sql"))?;

        let vals: Result<HashMap<i64, Station>, HydroGridErr> = stmt
            .query_and_then(rusqlite::NO_PARAMS, Self::parse_row_to_station)?
            .map(|res| res.map(|st| (st.id, st)).map_err(HydroGridErr::Database))
            .collect();

        let vals = vals?;
        tracing::info!("Found {} stations", vals.len());

        Ok(vals)
    }

    fn parse_row_to_station(row: &rusqlite::Row) -> Result<Station, rusqlite::Error> {
        let id: i64 = row.get(0)?;
        let station_num: String = row.get(1)?;

        let mut flows = [None; 5];
        for (i, flow) in flows.iter_mut().enumerate() {
            *flow = row.get::<_, Option<f64>>(i + 2)?;
        }

        Ok(Station {
            id,
            station_num,
            flows: ReturnFlows(flows),
        })
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
