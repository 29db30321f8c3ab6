//! aggbas - Aggregate a high resolution ASCII grid of basin ids onto a coarser grid.

use anyhow::{Context, Error};
use clap::Arg;

use hydro_grid::{
    ascii_grid,
    cmd_line::{path_arg, string_arg, CommonCmdLineArgs},
    AggregateConfig,
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
        "aggbas",
        "Aggregate a high resolution ASCII grid of basin ids onto a coarser grid.",
    )
    .arg(
        Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("ESRI ASCII grid of basin ids."),
    )
    .arg(
        Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .default_value("basins.txt")
            .help("Text file written with one value per line."),
    )
    .arg(
        Arg::with_name("factor")
            .short("f")
            .long("factor")
            .takes_value(true)
            .default_value("30")
            .help("High resolution cells per coarse cell along each axis."),
    );

    let (_, matches) = CommonCmdLineArgs::matches(app);

    let factor = string_arg(&matches, "factor")?;
    let factor: usize = factor
        .parse()
        .with_context(|| format!("invalid factor: {}", factor))?;

    let config = AggregateConfig {
        input: path_arg(&matches, "input")?,
        output: path_arg(&matches, "output")?,
        factor,
    };

    let lores = ascii_grid::run(&config)?;

    println!(
        "Wrote {} x {} basin grid to {}",
        lores.nrows(),
        lores.ncols(),
        config.output.display()
    );

    Ok(())
}
