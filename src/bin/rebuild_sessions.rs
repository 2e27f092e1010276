use std::env;

use anyhow::{bail, Context};
use getopts::Options;

use session_graph::config::AppConfig;
use session_graph::logging::init_logging;
use session_graph::pipeline::{run_rebuild, RebuildSettings};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("c", "config", "Configuration file (optional).", "PATH");
    opts.optopt("d", "dataset", "Dataset name under the dataset root (required).", "NAME");
    opts.optopt("t", "train", "Train split file name inside the dataset directory \
        (defaults to train.bin).", "FILE");
    opts.optopt("o", "output", "Output file name inside the dataset directory (defaults \
        to all_train_seq.bin).", "FILE");
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

    let dataset = match matches.opt_str("d") {
        Some(dataset) => dataset,
        None => {
            print_usage(&program, &opts, Some("Please specify a dataset via --dataset."));
            bail!("no dataset given");
        }
    };

    let mut config = AppConfig::new(matches.opt_str("c").as_deref())?;
    config.data.dataset = dataset;
    if let Some(train_file) = matches.opt_str("t") {
        config.rebuild.train_file = train_file;
    }
    if let Some(output_file) = matches.opt_str("o") {
        config.rebuild.output_file = output_file;
    }

    init_logging(&config.log.level);

    let settings = RebuildSettings::from_config(&config);
    let report = run_rebuild(&settings)
        .with_context(|| format!("rebuilding sessions for {} failed", settings.dataset))?;

    println!("{}", report.summary());
    Ok(())
}

fn print_usage(program: &str, opts: &Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} --dataset NAME [options]", program);
    eprint!("{}", opts.usage(&brief));
}
