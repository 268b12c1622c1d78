use crate::CLAP_STYLING;
use clap::{arg, command};
use tapecrawl_core::config::{DEFAULT_BASE_URL, DEFAULT_LINKS_FILE, DEFAULT_PRODUCTS_FILE};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("tapecrawl")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("tapecrawl")
        .about("Resumable two-phase product catalog harvester")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Only log warnings and errors")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"base-url" <URL>)
                .required(false)
                .help("Origin of the catalog site")
                .default_value(DEFAULT_BASE_URL)
                .global(true),
        )
        .arg(
            arg!(--"links-file" <PATH>)
                .required(false)
                .help("JSON file holding discovered product links per category")
                .default_value(DEFAULT_LINKS_FILE)
                .global(true),
        )
        .arg(
            arg!(--"products-file" <PATH>)
                .required(false)
                .help("JSON file holding extracted product records")
                .default_value(DEFAULT_PRODUCTS_FILE)
                .global(true),
        )
        .arg(
            arg!(--"delay-ms" <MILLIS>)
                .required(false)
                .help("Pause between consecutive requests to the site")
                .value_parser(clap::value_parser!(u64))
                .default_value("1000")
                .global(true),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout")
                .value_parser(clap::value_parser!(u64).range(1..))
                .default_value("20")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("links")
                .about(
                    "Phase 1: discover product links for every category not yet harvested. \
                Falls back to a headless browser when the static page has no links.",
                )
                .arg(
                    arg!(-r --"refresh" <CATEGORY>)
                        .required(false)
                        .help("Clear a category's stored links so it is harvested again")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            command!("products")
                .about("Phase 2: extract a record for every discovered link not yet extracted")
                .arg(
                    arg!(-c --"category" <CATEGORY>)
                        .required(false)
                        .help("Only extract products from this category"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress bar")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("status")
                .about("Summarize crawl progress from the state files without touching the network")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}
