use colored::Colorize;
use sitesnap::command_argument_builder;
use sitesnap::handlers::{handle_list, handle_run, init_tracing};
use sitesnap_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbosity = chosen_command.get_count("verbose");

    init_tracing(verbosity);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(primary_command, quiet).await,
        Some(("list", primary_command)) => handle_list(primary_command).await.map(|_| true),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
