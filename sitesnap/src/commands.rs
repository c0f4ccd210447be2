use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitesnap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitesnap")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (repeat for more)")
                .required(false)
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("run")
                .about(
                    "Screenshot every page listed in the sitemap once the site reports it has \
                hydrated. Writes PNGs for `argos upload`.",
                )
                .args(suite_args())
                .arg(
                    arg!(--"stylesheet" <PATH>)
                        .required(false)
                        .help("CSS injected before each capture (default: bundled screenshot.css)")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"output-dir" <PATH>)
                        .required(false)
                        .help("Directory screenshots are written to")
                        .default_value("screenshots/argos"),
                )
                .arg(
                    arg!(-t --"workers" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of pages captured concurrently.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("How long to wait for a page to hydrate")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"poll-interval-ms" <MILLIS>)
                        .required(false)
                        .help("How often the readiness condition is re-evaluated")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("100"),
                )
                .arg(
                    arg!(--"navigation-timeout" <SECONDS>)
                        .required(false)
                        .help("Timeout for browser commands and the preflight request")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"readiness-attribute" <NAME>)
                        .required(false)
                        .help("<html> attribute the site sets to \"true\" once hydrated")
                        .default_value("data-has-hydrated"),
                )
                .arg(
                    arg!(--"width" <PIXELS>)
                        .required(false)
                        .help("Viewport width")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .default_value("1280"),
                )
                .arg(
                    arg!(--"height" <PIXELS>)
                        .required(false)
                        .help("Viewport height")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .default_value("720"),
                )
                .arg(
                    arg!(--"viewport-only")
                        .required(false)
                        .help("Capture only the viewport instead of the full page")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-stabilize")
                        .required(false)
                        .help("Skip waiting for fonts, images and aria-busy before capturing")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-preflight")
                        .required(false)
                        .help("Do not check that the base URL answers before starting")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"deny-collisions")
                        .required(false)
                        .help("Fail when two sitemap paths map to the same screenshot name")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"chrome" <PATH>)
                        .required(false)
                        .help("Chrome/Chromium executable (default: auto-detect)")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"headed")
                        .required(false)
                        .help("Show the browser window")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-sandbox")
                        .required(false)
                        .help("Launch Chromium without its sandbox (needed in some containers)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("list")
                .about("List the sitemap paths and the screenshot names they map to")
                .args(suite_args()),
        )
}

/// Arguments shared by `run` and `list`.
fn suite_args() -> Vec<clap::Arg> {
    vec![
        arg!(-u --"base-url" <URL>)
            .required(false)
            .help("The URL every sitemap path is appended to")
            .value_parser(clap::value_parser!(Url))
            .default_value("http://localhost:3000"),
        arg!(-s --"sitemap" <PATH_OR_URL>)
            .required(false)
            .help("Sitemap file or http(s) URL")
            .default_value("build/sitemap.xml"),
        arg!(-g --"grep" <PATTERN>)
            .required(false)
            .help("Only include pages whose title contains PATTERN"),
    ]
}
