use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SeedResult;

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[SeedResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Hunt Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=======================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let hunter_wins: usize = results.iter().map(|r| r.hunter_wins).sum();
    let dracula_wins: usize = results.iter().map(|r| r.dracula_wins).sum();
    let unfinished: usize = results.iter().map(|r| r.unfinished).sum();

    writeln!(out, "Seeds: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(
        out,
        "Victories: hunters {} / Dracula {} / unfinished {}",
        hunter_wins.to_string().green(),
        dracula_wins.to_string().red(),
        unfinished
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} seed {} ({} hunters)",
            result.seed.bold(),
            result.strategy
        )?;
        writeln!(
            out,
            "   Games: {} | hunters {} Dracula {} unfinished {}",
            result.games_run, result.hunter_wins, result.dracula_wins, result.unfinished
        )?;
        writeln!(
            out,
            "   Average: {:.1} turns in {:?}",
            result.average_turns, result.average_duration
        )?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.seed.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.seed.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, results: &[SeedResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[SeedResult],
) -> Result<()> {
    writeln!(out, "# Fury Hunt Test Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Seeds**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    #[allow(clippy::cast_precision_loss)]
    let success_rate = if total == 0 {
        0.0
    } else {
        (passed as f64 / total as f64) * 100.0
    };
    writeln!(out, "- **Success rate**: {success_rate:.1}%\n")?;

    writeln!(out, "## Detailed Results\n")?;
    writeln!(out, "| Seed | Strategy | Games | Hunters | Dracula | Unfinished | Avg turns |")?;
    writeln!(out, "|------|----------|-------|---------|---------|------------|-----------|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {status} {} | {} | {} | {} | {} | {} | {:.1} |",
            result.seed,
            result.strategy,
            result.games_run,
            result.hunter_wins,
            result.dracula_wins,
            result.unfinished,
            result.average_turns
        )?;
    }

    let failing: Vec<_> = results.iter().filter(|r| !r.failures.is_empty()).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failing {
            writeln!(out, "### Seed {}\n", result.seed)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::HunterStrategy;

    fn sample(passed: bool) -> SeedResult {
        SeedResult {
            seed: "42".to_string(),
            strategy: HunterStrategy::Greedy,
            passed,
            games_run: 3,
            hunter_wins: 1,
            dracula_wins: 1,
            unfinished: 1,
            failures: if passed {
                Vec::new()
            } else {
                vec!["Game 2: trail overflow".to_string()]
            },
            average_turns: 30.5,
            average_duration: Duration::from_millis(4),
            performance_data: vec![Duration::from_millis(4); 3],
        }
    }

    #[test]
    fn console_report_lists_failures() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &[sample(true), sample(false)], Duration::ZERO)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Hunt Results Summary"));
        assert!(text.contains("Victories: hunters 2 / Dracula 2 / unfinished 2"));
        assert!(text.contains("Game 2: trail overflow"));
        assert!(text.contains("Fastest: 42"));
    }

    #[test]
    fn json_report_is_an_array() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &[sample(true)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["hunter_wins"], 1);
    }

    #[test]
    fn markdown_report_has_a_table_row_per_seed() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &[sample(true), sample(false)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("- **Success rate**: 50.0%"));
        assert_eq!(text.matches("| Greedy | 3 |").count(), 2);
        assert!(text.contains("## Failures"));
    }

    #[test]
    fn markdown_report_handles_no_results() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("- **Success rate**: 0.0%"));
        assert!(!text.contains("## Failures"));
    }
}
