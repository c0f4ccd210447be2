use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use sitesnap_capture::Viewport;
use sitesnap_core::config::{StylesheetSource, SuiteConfig};
use sitesnap_core::report::{ReportFormat, save_report};
use sitesnap_core::sitemap::SitemapSource;
use sitesnap_core::suite::{SuiteOptions, http_client, load_suite, run_suite};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Expand a leading `~` in a user-supplied path.
fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Build a suite config from the arguments shared by `run` and `list`.
pub fn build_config_from_args(args: &ArgMatches) -> Result<SuiteConfig, String> {
    let base_url = args
        .get_one::<Url>("base-url")
        .cloned()
        .ok_or_else(|| "--base-url is required".to_string())?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(format!("Base URL must be http or https, got '{}'", base_url));
    }

    let sitemap = match args.get_one::<String>("sitemap") {
        Some(raw) => SitemapSource::parse(&shellexpand::tilde(raw)),
        None => SitemapSource::default(),
    };

    Ok(SuiteConfig {
        base_url,
        sitemap,
        grep: args.get_one::<String>("grep").cloned(),
        ..SuiteConfig::default()
    })
}

/// Build the full config for `run`, including browser and capture flags.
pub fn build_run_config_from_args(args: &ArgMatches) -> Result<SuiteConfig, String> {
    let mut config = build_config_from_args(args)?;

    if let Some(path) = args.get_one::<String>("stylesheet") {
        config.stylesheet = StylesheetSource::File(expand_path(path));
    }
    if let Some(dir) = args.get_one::<String>("output-dir") {
        config.output_dir = expand_path(dir);
    }

    let workers = *args.get_one::<usize>("workers").unwrap_or(&1);
    if workers == 0 {
        return Err("--workers must be at least 1".to_string());
    }
    config.workers = workers;

    config.readiness_timeout = Duration::from_secs(*args.get_one::<u64>("timeout").unwrap_or(&30));
    config.poll_interval =
        Duration::from_millis(*args.get_one::<u64>("poll-interval-ms").unwrap_or(&100));
    if config.poll_interval.is_zero() {
        return Err("--poll-interval-ms must be greater than zero".to_string());
    }
    config.navigation_timeout =
        Duration::from_secs(*args.get_one::<u64>("navigation-timeout").unwrap_or(&30));

    if let Some(attribute) = args.get_one::<String>("readiness-attribute") {
        config.readiness_attribute = attribute.clone();
    }

    config.viewport = Viewport {
        width: *args.get_one::<u32>("width").unwrap_or(&1280),
        height: *args.get_one::<u32>("height").unwrap_or(&720),
    };
    config.full_page = !args.get_flag("viewport-only");
    config.stabilize = !args.get_flag("no-stabilize");
    config.preflight = !args.get_flag("no-preflight");
    config.deny_name_collisions = args.get_flag("deny-collisions");
    config.chrome_executable = args.get_one::<String>("chrome").map(|p| expand_path(p));
    config.headless = !args.get_flag("headed");
    config.sandbox = !args.get_flag("no-sandbox");

    Ok(config)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn verbosity_filter(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "warn".to_string(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,sitesnap={level},sitesnap_core={level},sitesnap_capture={level}")
}

pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity)));
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Capture every sitemap page. Returns whether every case passed.
pub async fn handle_run(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<bool> {
    let config = build_run_config_from_args(sub_matches).map_err(anyhow::Error::msg)?;

    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .with_context(|| format!("Unknown report format '{}'", format_name))?;
    let output = sub_matches.get_one::<String>("output").map(|p| expand_path(p));

    if !quiet {
        println!("\n📸 Capturing {}", config.base_url_str().bright_white());
        println!("Sitemap: {}", config.sitemap);
        println!("Output: {}", config.output_dir.display());
        println!("Workers: {}", config.workers);
        println!(
            "Viewport: {}x{}{}\n",
            config.viewport.width,
            config.viewport.height,
            if config.full_page { " (full page)" } else { "" }
        );
    }

    let options = SuiteOptions {
        config,
        show_progress_bars: !quiet,
    };

    let progress_callback = Arc::new(move |msg: String| {
        if !quiet {
            println!("{}", msg);
        }
    });

    let outcome = run_suite(options, Some(progress_callback), None)
        .await
        .context("Screenshot suite failed")?;

    let report = format.render(&outcome)?;
    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    println!();
    print_divider();
    if outcome.is_success() {
        println!(
            "{} {} page(s) captured in {:.1}s",
            "✓".green().bold(),
            outcome.passed().to_string().bright_white(),
            outcome.duration().as_secs_f64()
        );
    } else {
        println!(
            "{} {} of {} page(s) failed",
            "✗".red().bold(),
            outcome.failed().to_string().bright_white(),
            outcome.results.len()
        );
        for result in outcome.results.iter().filter(|r| !r.is_passed()) {
            println!(
                "  {} {} {}",
                "•".red(),
                result.pathname.bright_white(),
                result.error.as_deref().unwrap_or("unknown error").dimmed()
            );
        }
    }
    if !outcome.collisions.is_empty() {
        println!(
            "{} {} screenshot name(s) shared by several paths",
            "⚠".yellow().bold(),
            outcome.collisions.len()
        );
    }
    print_divider();

    Ok(outcome.is_success())
}

/// Print the registered cases without launching a browser.
pub async fn handle_list(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let config = build_config_from_args(sub_matches).map_err(anyhow::Error::msg)?;
    let client = http_client(config.navigation_timeout)?;
    let suite = load_suite(&config, &client)
        .await
        .context("Failed to load the sitemap")?;

    println!("Pathnames to screenshot:");
    for case in &suite.cases {
        println!("  {} {} {}", case.pathname, "→".blue(), case.name.bright_white());
    }

    if suite.cases.len() != suite.total_pathnames {
        println!(
            "\n{} of {} path(s) match '{}'",
            suite.cases.len(),
            suite.total_pathnames,
            config.grep.as_deref().unwrap_or_default()
        );
    }

    for collision in &suite.collisions {
        println!(
            "{} '{}' is shared by {}",
            "⚠".yellow().bold(),
            collision.name,
            collision.pathnames.join(", ")
        );
    }

    Ok(())
}
