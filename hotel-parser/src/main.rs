use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use hotel_parser::{parse_details, parse_listing, HotelDetails, DEFAULT_ORIGIN};

const USAGE: &str = "\
Usage: hotel_parser <listing|detail> [HTML_FILE|-] [--url URL]

Parse a saved hotel listing page or hotel article and print JSON.
Without HTML_FILE (or with `-`) the page is read from stdin.

Options:
  --url URL       Site origin (listing) or article URL (detail) for resolving links
                  [default: https://en.wikipedia.org]
  -h, --help      Show this message
  -V, --version   Print the hotel-parser version";

enum Command {
    Help,
    Version,
    Parse(Invocation),
}

enum Mode {
    Listing,
    Detail,
}

struct Invocation {
    mode: Mode,
    page: Option<String>,
    url: String,
}

fn main() -> ExitCode {
    let command = match parse_args(env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("hotel_parser: {err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    match command {
        Command::Help => println!("{USAGE}"),
        Command::Version => println!("hotel-parser {}", env!("CARGO_PKG_VERSION")),
        Command::Parse(invocation) => {
            if let Err(err) = parse_page(invocation) {
                eprintln!("hotel_parser: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mode = match args.next().as_deref() {
        Some("-h" | "--help") => return Ok(Command::Help),
        Some("-V" | "--version") => return Ok(Command::Version),
        Some("listing") => Mode::Listing,
        Some("detail") => Mode::Detail,
        Some(other) => return Err(format!("unknown mode: {other} (expected listing or detail)")),
        None => return Err("missing mode: listing or detail".to_string()),
    };

    let mut page = None;
    let mut url = DEFAULT_ORIGIN.to_string();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => url = args.next().ok_or("--url expects a URL")?,
            "-" => page = None,
            path if !path.starts_with('-') => page = Some(path.to_string()),
            flag => return Err(format!("unexpected argument: {flag}")),
        }
    }
    Ok(Command::Parse(Invocation { mode, page, url }))
}

fn parse_page(invocation: Invocation) -> Result<(), String> {
    let html = match &invocation.page {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("cannot read hotel page {path}: {err}"))?,
        None => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .map_err(|err| format!("cannot read hotel page from stdin: {err}"))?;
            html
        }
    };

    let json = match invocation.mode {
        Mode::Listing => serde_json::to_string_pretty(&parse_listing(&html, &invocation.url)),
        Mode::Detail => {
            let details = parse_details(&html, &invocation.url).unwrap_or_else(|| {
                eprintln!("no infobox found");
                HotelDetails::default()
            });
            serde_json::to_string_pretty(&details)
        }
    }
    .map_err(|err| format!("cannot encode hotels as JSON: {err}"))?;
    println!("{json}");
    Ok(())
}
