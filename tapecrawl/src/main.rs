use colored::Colorize;
use tapecrawl::command_argument_builder;
use tapecrawl::handlers::{build_config, handle_links, handle_products, handle_status, init_logging};

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_logging(quiet);

    let result = match build_config(&chosen_command) {
        Ok(config) => match chosen_command.subcommand() {
            Some(("links", sub_matches)) => handle_links(&config, sub_matches, quiet).await,
            Some(("products", sub_matches)) => handle_products(&config, sub_matches, quiet).await,
            Some(("status", sub_matches)) => handle_status(&config, sub_matches),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
