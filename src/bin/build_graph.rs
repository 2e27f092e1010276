use std::env;

use anyhow::{bail, Context};
use getopts::Options;

use session_graph::config::{parse_sample_num, AppConfig};
use session_graph::logging::init_logging;
use session_graph::pipeline::{run_build, BuildSettings};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("c", "config", "Configuration file (optional).", "PATH");
    opts.optopt("d", "dataset", "Dataset name under the dataset root (defaults to \
        diginetica).", "NAME");
    opts.optopt("n", "sample_num", "Maximum number of neighbors kept per item (defaults \
        to 12).", "NUMBER");
    opts.optopt("", "click-log", "Read sessions from a tab separated click log \
        (SessionId, ItemId, Time) instead of the dataset's session file.", "PATH");
    opts.optflag("", "export-tsv", "Also write the graph as a tab separated edge list.");
    opts.optflag("", "no-progress", "Do not show a progress bar.");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            print_usage(&program, &opts, Some(&failure.to_string()));
            bail!("invalid command line: {}", failure);
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts, None);
        return Ok(());
    }

    let mut config = AppConfig::new(matches.opt_str("c").as_deref())?;
    if let Some(dataset) = matches.opt_str("d") {
        config.data.dataset = dataset;
    }
    if let Some(sample_num) = matches.opt_str("n") {
        config.graph.sample_num = parse_sample_num(&sample_num)?;
    }
    if let Some(click_log_path) = matches.opt_str("click-log") {
        config.data.click_log_path = Some(click_log_path);
    }
    if matches.opt_present("export-tsv") {
        config.graph.export_tsv = true;
    }
    if matches.opt_present("no-progress") {
        config.graph.show_progress = false;
    }

    init_logging(&config.log.level);

    let settings = BuildSettings::from_config(&config);
    let report = run_build(&settings)
        .with_context(|| format!("building the global graph for {} failed", settings.dataset))?;

    println!("{}", report.summary());
    if let Some(tsv_path) = &report.tsv_path {
        println!("Exported edge list to {}", tsv_path.display());
    }
    Ok(())
}

fn print_usage(program: &str, opts: &Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}
