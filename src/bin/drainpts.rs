//! drainpts - List the forecast (drain) points of a high resolution routing grid.

use anyhow::Error;
use clap::Arg;

use hydro_grid::{
    cmd_line::{path_arg, CommonCmdLineArgs},
    drain_points, DrainPointConfig, SummaryTable,
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
        "drainpts",
        "List the forecast (drain) points of a high resolution routing grid.",
    )
    .arg(
        Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("Routing grid file, e.g. Fulldom_hires.nc."),
    )
    .arg(
        Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .default_value("drain_pts.txt")
            .help("CSV file to write the points to."),
    );

    let (_, matches) = CommonCmdLineArgs::matches(app);

    let config = DrainPointConfig::new(
        &path_arg(&matches, "input")?,
        &path_arg(&matches, "output")?,
    );

    let points = drain_points::run(&config)?;

    let ids: Vec<usize> = points.iter().map(|p| p.id).collect();
    let orders: Vec<f64> = points.iter().map(|p| p.stream_order).collect();
    let lons: Vec<f64> = points.iter().map(|p| p.lon).collect();
    let lats: Vec<f64> = points.iter().map(|p| p.lat).collect();
    let elevations: Vec<f64> = points.iter().map(|p| p.elevation).collect();

    SummaryTable::new()
        .with_title("Drain points")
        .with_column("ID", &ids)
        .with_column("Stream Order", &orders)
        .with_column("Longitude", &lons)
        .with_column("Latitude", &lats)
        .with_column("Elevation", &elevations)
        .with_footer(format!("Saved to {}", config.output.display()))
        .print()?;

    Ok(())
}
