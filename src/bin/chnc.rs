//! chnc - Change the values of a grid variable wherever a mask variable matches a table of ids.

use anyhow::{Context, Error};
use clap::Arg;

use hydro_grid::{
    cmd_line::{path_arg, string_arg, CommonCmdLineArgs},
    rewrite, RewriteConfig,
};

fn main() {
    if let Err(ref e) = run() {
        println!("Change values failed");
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app(
        "chnc",
        "Change the values of a grid variable where a mask variable matches a table of ids.",
    )
    .arg(
        Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("NetCDF file holding the mask variable."),
    )
    .arg(
        Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .required(true)
            .help("NetCDF file to change, copied from the input if it does not exist."),
    )
    .arg(
        Arg::with_name("change-tbl")
            .short("c")
            .long("change-tbl")
            .takes_value(true)
            .required(true)
            .help("Comma separated table of mask ids and new values.")
            .long_help(concat!(
                "Comma separated table of mask ids and new values, one pair per line. ",
                "Lines starting with # are ignored. Mask cells are compared to the ids ",
                "after truncating both to integers."
            )),
    )
    .arg(
        Arg::with_name("mask-var")
            .short("m")
            .long("mask-var")
            .takes_value(true)
            .required(true)
            .help("Name of the mask variable, e.g. basn_mask."),
    )
    .arg(
        Arg::with_name("change-var")
            .short("v")
            .long("change-var")
            .takes_value(true)
            .required(true)
            .help("Name of the variable to change, e.g. LKSATFAC."),
    );

    let (_, matches) = CommonCmdLineArgs::matches(app);

    let config = RewriteConfig {
        source: path_arg(&matches, "input")?,
        target: path_arg(&matches, "output")?,
        table: path_arg(&matches, "change-tbl")?,
        mask_var: string_arg(&matches, "mask-var")?,
        target_var: string_arg(&matches, "change-var")?,
    };

    let summary = rewrite::run(&config).with_context(|| {
        format!(
            "changing {} in {}",
            config.target_var,
            config.target.display()
        )
    })?;

    println!("Completed");
    if summary.copied {
        println!(
            "Copied {} to {}",
            config.source.display(),
            config.target.display()
        );
    }
    println!(
        "{} of {} cells matched the table, {} changed value",
        summary.stats.matched, summary.stats.scanned, summary.stats.changed
    );

    Ok(())
}
