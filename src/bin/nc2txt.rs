//! nc2txt - Export a gridded variable of WRF output files as lon,lat,value text rows.

use anyhow::Error;
use clap::Arg;

use hydro_grid::{
    cmd_line::{path_arg, str_arg, CommonCmdLineArgs},
    text_export, ExportConfig, SummaryTable,
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
    let defaults = ExportConfig::default();

    let app = CommonCmdLineArgs::new_app(
        "nc2txt",
        "Export a gridded variable of WRF output files as lon,lat,value text rows.",
    )
    .arg(
        Arg::with_name("input-dir")
            .short("i")
            .long("input-dir")
            .takes_value(true)
            .default_value(".")
            .help("Directory with the WRF output files."),
    )
    .arg(
        Arg::with_name("output-dir")
            .short("o")
            .long("output-dir")
            .takes_value(true)
            .default_value(".")
            .help("Directory to write the text files to."),
    )
    .arg(
        Arg::with_name("prefix")
            .short("p")
            .long("prefix")
            .takes_value(true)
            .help("Only export files whose names start with this. Default wrfout_d03_"),
    )
    .arg(
        Arg::with_name("value-var")
            .long("value-var")
            .takes_value(true)
            .help("Variable to export. Default RAINNC"),
    )
    .arg(
        Arg::with_name("lat-var")
            .long("lat-var")
            .takes_value(true)
            .help("Latitude variable. Default XLAT"),
    )
    .arg(
        Arg::with_name("lon-var")
            .long("lon-var")
            .takes_value(true)
            .help("Longitude variable. Default XLONG"),
    )
    .arg(
        Arg::with_name("out-prefix")
            .long("out-prefix")
            .takes_value(true)
            .help("Prefix of the output file names. Default precip_csv_"),
    )
    .arg(
        Arg::with_name("gzip")
            .short("z")
            .long("gzip")
            .help("Compress the outputs with gzip."),
    );

    let (_, matches) = CommonCmdLineArgs::matches(app);

    let config = ExportConfig {
        input_dir: path_arg(&matches, "input-dir")?,
        output_dir: path_arg(&matches, "output-dir")?,
        file_prefix: str_arg(&matches, "prefix", &defaults.file_prefix),
        value_var: str_arg(&matches, "value-var", &defaults.value_var),
        lat_var: str_arg(&matches, "lat-var", &defaults.lat_var),
        lon_var: str_arg(&matches, "lon-var", &defaults.lon_var),
        output_prefix: str_arg(&matches, "out-prefix", &defaults.output_prefix),
        gzip: matches.is_present("gzip"),
    };

    let exported = text_export::run(&config)?;

    let inputs: Vec<String> = exported
        .iter()
        .map(|ex| file_name(&ex.input))
        .collect();
    let outputs: Vec<String> = exported
        .iter()
        .map(|ex| file_name(&ex.output))
        .collect();
    let rows: Vec<usize> = exported.iter().map(|ex| ex.rows).collect();

    SummaryTable::new()
        .with_title(format!("Exported {}", config.value_var))
        .with_column("Input", &inputs)
        .with_column("Output", &outputs)
        .with_column("Rows", &rows)
        .with_footer(format!("{} files written", exported.len()))
        .print()?;

    Ok(())
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
