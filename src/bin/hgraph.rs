//! hgraph - Summarize station hydrographs and the return period of their peaks.

use anyhow::{Context, Error};
use clap::Arg;

use hydro_grid::{
    cmd_line::{path_arg, CommonCmdLineArgs},
    hydrograph, HydrographConfig, SummaryTable,
};

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app(
        "hgraph",
        "Summarize station hydrographs and the return period of their peaks.",
    )
    .arg(
        Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("Tab separated point output of the routing model."),
    )
    .arg(
        Arg::with_name("database")
            .short("d")
            .long("database")
            .takes_value(true)
            .required(true)
            .help("SQLite database with the hydro_stations table."),
    )
    .arg(
        Arg::with_name("series-dir")
            .short("s")
            .long("series-dir")
            .takes_value(true)
            .help("Save an hour,discharge CSV per station in this directory."),
    )
    .after_help(concat!(
        "Only hours after 6 and up to 48 from the start of the run are used. ",
        "Stations missing from the database are skipped."
    ));

    let (_, matches) = CommonCmdLineArgs::matches(app);

    let series_dir = match matches.value_of_os("series-dir") {
        Some(dir) => {
            let dir = std::path::PathBuf::from(dir);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            Some(dir)
        }
        None => None,
    };

    let config = HydrographConfig {
        input: path_arg(&matches, "input")?,
        database: path_arg(&matches, "database")?,
        series_dir,
    };

    let reports = hydrograph::run(&config)?;

    let nums: Vec<&str> = reports.iter().map(|r| r.station_num.as_str()).collect();
    let points: Vec<usize> = reports.iter().map(|r| r.points).collect();
    let peaks: Vec<f64> = reports.iter().map(|r| r.max_discharge).collect();
    let periods: Vec<String> = reports
        .iter()
        .map(|r| r.return_period.to_string())
        .collect();

    SummaryTable::new()
        .with_title("Hydrographs")
        .with_column("Station", &nums)
        .with_column("Points", &points)
        .with_column("Max discharge", &peaks)
        .with_column("Return period", &periods)
        .print()?;

    Ok(())
}
