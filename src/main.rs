use clap::Parser;
use itertools::Itertools;
use regex_clippy::LintEngine;
use regex_clippy::cli::{Args, CheckArgs, Command, OutputFormat, PatternArgs};
use regex_clippy::config::{self, RegexClippyConfig};
use regex_clippy::diagnostics::Report;
use regex_clippy::lint::{LintSettings, RuleRegistry};
use regex_clippy::parser::parse_regex;
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    regex_clippy::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::ListRules) => {
            list_rules();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { rule }) => {
            explain_rule(&rule)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Check(check)) => check_command(check),
        Some(Command::Normalize(pattern)) => normalize_command(pattern),
        Some(Command::Fold(pattern)) => fold_command(pattern),
        Some(Command::Fix { rule, pattern }) => fix_command(&rule, pattern),
        None => check_command(args.check),
    }
}

fn list_rules() {
    let registry = RuleRegistry::default_rules();

    for (category, names) in registry.catalog() {
        for name in names {
            let Some(d) = registry.find_descriptor(name) else {
                continue;
            };
            let fix_status = if d.fix.available {
                format!(" [fix: {}]", d.fix.safety.as_str())
            } else {
                String::new()
            };
            println!(
                "{}\t{}\t{}\t{}{}",
                d.name,
                category.as_str(),
                d.group.as_str(),
                d.description,
                fix_status
            );
        }
    }
}

fn explain_rule(rule: &str) -> anyhow::Result<()> {
    let Some(d) = RuleRegistry::default_rules().find_descriptor(rule) else {
        anyhow::bail!("unknown rule: {rule}");
    };

    println!("name: {}", d.name);
    println!("category: {}", d.category.as_str());
    println!("group: {}", d.group.as_str());
    println!("description: {}", d.description);
    println!("problem key: {}", d.keys.problem);
    println!("solve key: {}", d.keys.solve);
    if d.fix.available {
        println!("fix: available ({})", d.fix.safety.as_str());
        if !d.fix.description.is_empty() {
            println!("fix description: {}", d.fix.description);
        }
    } else {
        println!("fix: not available");
    }
    if let Some(flag) = d.group.required_flag() {
        println!("enable with: {flag}");
    }
    Ok(())
}

fn check_command(args: CheckArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args.pattern)?;
    let (disabled, preview) = match cfg.as_ref() {
        // CLI flag takes precedence over config
        Some(cfg) => (cfg.rules.disabled.clone(), args.preview || cfg.rules.preview),
        None => (Vec::new(), args.preview),
    };

    let registry =
        RuleRegistry::default_rules_filtered(&args.only, &args.skip, &disabled, preview)?;
    let engine = LintEngine::new_with_settings(registry, settings(cfg.as_ref()));

    let source = read_pattern(&args.pattern)?;
    let report = engine.lint_source(&source)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => print_report(&report),
    }

    if report.has_errors() || (args.deny_warnings && !report.is_empty()) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &Report) {
    for (category, entry) in report.entries() {
        let nodes = entry.affected_node_ids.iter().join(",");
        println!(
            "{}: {} [{}..={}] nodes {}: {} ({})",
            category.as_str(),
            entry.problem_type,
            entry.span[0],
            entry.span[1],
            nodes,
            entry.problem,
            entry.solve
        );
    }
    println!("{} findings", report.len());
}

fn normalize_command(args: PatternArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args)?;
    let engine = LintEngine::new_with_settings(RuleRegistry::new(), settings(cfg.as_ref()));
    let normalized = engine.normalize_source(&read_pattern(&args)?)?;

    println!("{}", normalized.render());
    if !normalized.report.converged {
        eprintln!(
            "warning: no fixpoint after {} passes",
            normalized.report.passes
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn fold_command(args: PatternArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args)?;
    let engine = LintEngine::new_with_settings(RuleRegistry::new(), settings(cfg.as_ref()));

    match engine.fold_source(&read_pattern(&args)?)? {
        Some(folded) => println!("{folded}"),
        None => eprintln!("nothing to fold"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Apply the first finding of `rule` and print the rewritten pattern.
fn fix_command(rule: &str, args: PatternArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(&args)?;
    let engine = LintEngine::new_with_settings(RuleRegistry::default_rules(), settings(cfg.as_ref()));
    let Some(pattern_rule) = engine.registry().find(rule) else {
        anyhow::bail!("unknown rule: {rule}");
    };

    let tree = parse_regex(&read_pattern(&args)?)?;
    let Some(finding) = pattern_rule.detect(&tree) else {
        eprintln!("{rule}: no match");
        return Ok(ExitCode::SUCCESS);
    };

    match engine.apply_finding(&tree, rule, &finding)? {
        Some(rewritten) => println!("{rewritten}"),
        None => eprintln!("{rule}: no rewrite available"),
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(args: &PatternArgs) -> anyhow::Result<Option<RegexClippyConfig>> {
    let start_dir = std::env::current_dir()?;
    let loaded = config::load_config(args.config.as_deref(), &start_dir)?;
    Ok(loaded.map(|(_path, cfg)| cfg))
}

fn settings(cfg: Option<&RegexClippyConfig>) -> LintSettings {
    cfg.map(|cfg| cfg.engine.settings()).unwrap_or_default()
}

fn read_pattern(args: &PatternArgs) -> anyhow::Result<String> {
    if let Some(pattern) = &args.pattern {
        return Ok(pattern.clone());
    }
    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source)?;
    // A trailing newline from `echo` is not part of the pattern.
    Ok(source.trim_end_matches(['\r', '\n']).to_string())
}
