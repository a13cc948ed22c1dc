mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{HunterStrategy, LogicTester, SeedResult, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "fury-tester", version)]
#[command(about = "Automated hunts against the Dracula AI with invariant checking")]
struct Args {
    /// Seeds to run (comma-separated; decimal, 0x hex or @phrase)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of games per seed
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Hunter policy driving the automated games
    #[arg(long, value_enum, default_value_t = HunterStrategy::Greedy)]
    strategy: HunterStrategy,

    /// Dracula turns before a game is called unfinished
    #[arg(long, default_value_t = 300)]
    max_turns: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let seed_tokens = split_csv(&args.seeds);
    let seed_infos = resolve_seed_inputs(&seed_tokens)?;

    println!("{}", "🧛 Running Hunts".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());
    let tester = LogicTester::new(args.verbose);
    let results = tester.run_seeds(&seed_infos, args.strategy, args.games, args.max_turns);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🦇 Fury Automated Tester".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn write_reports(args: &Args, results: &[SeedResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Fury Hunt Test Results\n\n_No seeds executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No hunts executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            seeds: "1337".to_string(),
            games: 1,
            strategy: HunterStrategy::Greedy,
            max_turns: 20,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn sample_result() -> SeedResult {
        SeedResult {
            seed: "7".to_string(),
            strategy: HunterStrategy::Cautious,
            passed: true,
            games_run: 1,
            hunter_wins: 1,
            dracula_wins: 0,
            unfinished: 0,
            failures: Vec::new(),
            average_turns: 18.0,
            average_duration: Duration::from_millis(2),
            performance_data: vec![Duration::from_millis(2)],
        }
    }

    #[test]
    fn split_csv_trims_and_filters() {
        assert_eq!(split_csv(" 1, ,0x2,  @mina "), vec!["1", "0x2", "@mina"]);
    }

    #[test]
    fn args_parse_strategy_and_defaults() {
        let args = Args::try_parse_from(["fury-tester", "--strategy", "cautious"]).unwrap();
        assert_eq!(args.strategy, HunterStrategy::Cautious);
        assert_eq!(args.games, 10);
        assert_eq!(args.max_turns, 300);
        assert_eq!(args.report, "console");
        assert!(Args::try_parse_from(["fury-tester", "--report", "csv"]).is_err());
        assert!(Args::try_parse_from(["fury-tester", "--strategy", "brave"]).is_err());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = std::env::temp_dir().join("fury-test-report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result()], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["strategy"], "cautious");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = std::env::temp_dir().join("fury-report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("_No seeds executed._"));
    }

    #[test]
    fn write_reports_console_ends_with_total_time() {
        let temp = std::env::temp_dir().join("fury-report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result()], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("PASS"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_rejects_missing_directories() {
        let path = std::env::temp_dir().join("fury-missing-dir").join("nested").join("out.txt");
        assert!(OutputTarget::new(Some(path)).is_err());
    }
}
