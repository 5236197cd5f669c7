use clap::Parser; // clap crate for CLI argument parsing
use optimizer::{Stats, Summary};
use std::fs;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "IR redundancy elimination tool", long_about = None)]
struct Args {
    /// Path to the textual IR input
    input_path: String,

    /// Path for the optimized IR output; counters go to <output>.stats
    output_path: String,

    /// Do not perform CSE optimization
    #[arg(long)]
    no_cse: bool,

    /// Also print the counters to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}: {}", args.input_path, message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let input = fs::read_to_string(&args.input_path)
        .map_err(|e| format!("cannot read input: {}", e))?;

    // A malformed module is the only fatal condition; nothing runs on it.
    let mut module = parser::parse_module(&input)?;

    let stats = if args.no_cse {
        Stats::default()
    } else {
        optimizer::run_cse(&mut module)
    };
    let summary = Summary::collect(&module);

    fs::write(&args.output_path, module.to_string())
        .map_err(|e| format!("cannot write {}: {}", args.output_path, e))?;

    let csv = render_csv(&summary, &stats);
    let stats_path = format!("{}.stats", args.output_path);
    fs::write(&stats_path, &csv).map_err(|e| format!("cannot write {}: {}", stats_path, e))?;

    if args.verbose {
        eprint!("{}", csv);
    }
    Ok(())
}

fn render_csv(summary: &Summary, stats: &Stats) -> String {
    let mut out = String::new();
    for (name, value) in summary.rows().iter().chain(stats.rows().iter()) {
        out.push_str(name);
        out.push(',');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}
