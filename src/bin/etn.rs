//! etn - classify domains by public suffix
//!
//! Prints the eTLD, eTLD+1 and manager of each domain, or converts names
//! between Unicode and their ASCII-Compatible Encoding.
//!
//! # Example
//!
//! ```bash
//! etn -d public_suffix_compiled.dat www.books.amazon.co.uk foo.blogspot.co.uk
//! etn --json 中文字.com
//! etn idna to-ascii 中文字.com
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use etn_r::{idna, PublicSuffixList, RuleFileLoader, DEFAULT_RULE_FILE};

/// Domains shown when none are given; empty entries print a blank line
const DEMO_DOMAINS: &[&str] = &[
    "amazon.co.uk",
    "books.amazon.co.uk",
    "www.books.amazon.co.uk",
    "amazon.com",
    "",
    "example0.debian.net",
    "example1.debian.org",
    "",
    "golang.dev",
    "golang.net",
    "play.golang.org",
    "gophers.in.space.museum",
    "",
    "0emm.com",
    "a.0emm.com",
    "b.c.d.0emm.com",
    "",
    "there.is.no.such-tld",
    "",
    "foo.org",
    "foo.co.uk",
    "foo.dyndns.org",
    "foo.blogspot.co.uk",
    "cromulent",
];

/// Effective TLD lookup
#[derive(Parser, Debug)]
#[command(name = "etn")]
#[command(about = "Look up public suffixes and registrable domains", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Compiled public suffix rule file
    #[arg(short, long, default_value = DEFAULT_RULE_FILE, env = "ETN_DATA")]
    data: PathBuf,

    /// Print one JSON object per domain instead of a table
    #[arg(long)]
    json: bool,

    /// Domains to classify (defaults to a built-in demo list)
    domains: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert domain names with IDNA
    Idna {
        #[command(subcommand)]
        direction: IdnaCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IdnaCommand {
    /// Unicode to ASCII-Compatible Encoding
    ToAscii {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// ASCII-Compatible Encoding to Unicode
    ToUnicode {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["etn_r=info", "etn=info"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Some(Command::Idna { direction }) => run_idna(direction),
        None => run_lookup(&args.data, &args.domains, args.json),
    }
}

fn run_idna(direction: IdnaCommand) -> ExitCode {
    let (names, convert): (Vec<String>, fn(&str) -> etn_r::Result<String>) = match direction {
        IdnaCommand::ToAscii { names } => (names, idna::to_ascii),
        IdnaCommand::ToUnicode { names } => (names, idna::to_unicode),
    };

    let mut status = ExitCode::SUCCESS;
    for name in &names {
        match convert(name) {
            Ok(converted) => println!("{}", converted),
            Err(e) => {
                eprintln!("{}: {}", name, e);
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}

fn run_lookup(data: &Path, domains: &[String], json: bool) -> ExitCode {
    let path = RuleFileLoader::new().with_path(data).rule_file_path();
    let psl = match PublicSuffixList::open(&path) {
        Ok(psl) => psl,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    info!(path = %path.display(), tlds = psl.num_tld(), "Rule file loaded");

    // User input may be Unicode or mixed case; the demo list is already ASCII
    let domains: Vec<String> = if domains.is_empty() {
        DEMO_DOMAINS.iter().map(|d| d.to_string()).collect()
    } else {
        domains
            .iter()
            .filter_map(|d| match idna::to_ascii(d) {
                Ok(ascii) => Some(ascii),
                Err(e) => {
                    warn!(domain = %d, error = %e, "Skipping domain");
                    None
                }
            })
            .collect()
    };

    if !json {
        println!(
            "  {:>24}{:>24}{:>24}      {}",
            "Domain", "eTLD", "eTLD+1", "Manage By"
        );
    }

    for domain in &domains {
        if domain.is_empty() {
            if !json {
                println!();
            }
            continue;
        }

        let info = psl.classify(domain);
        if json {
            match serde_json::to_string(&info) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("Failed to serialize {}: {}", domain, e);
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!(
                "> {:>24}{:>24}{:>24}  is  {}",
                info.domain, info.etld, info.etld_plus_one, info.manager
            );
        }
    }

    ExitCode::SUCCESS
}
