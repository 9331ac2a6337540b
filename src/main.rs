//! Command line front end for csv-sort

use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process;

use csv_sort::{
    config::{InputSource, SortConfig, SortConfigBuilder, SortStrategy},
    error::{SortError, SortResult},
    sort,
};

fn main() {
    let result = run();
    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("csv-sort: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run() -> SortResult<i32> {
    let matches = build_cli().get_matches();
    let config = parse_config_from_matches(&matches)?;
    init_logging(config.debug)?;
    sort(&config)
}

fn init_logging(debug: bool) -> SortResult<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|e| SortError::internal(&format!("cannot install logger: {e}")))
}

fn build_cli() -> Command {
    Command::new("csv-sort")
        .version(env!("CARGO_PKG_VERSION"))
        .override_usage("csv-sort [OPTION]...")
        .about("Sort delimited records from stdin, a file, or a directory of files")
        .long_about("Sort delimited records by one field.\n\nWith -d every matching file under DIR is read concurrently by a pool of workers and the merged rows are sorted together. With -i a single file is read and every row must have the same number of fields. With neither, rows are read from standard input until EOF or an empty line.")
        .disable_help_flag(true)  // -h is the header flag

        // Input
        .arg(Arg::new("input")
            .short('i')
            .long("input")
            .help("Read a single file")
            .value_name("FILE")
            .conflicts_with("dir"))
        .arg(Arg::new("dir")
            .short('d')
            .long("dir")
            .help("Read every matching file under DIR")
            .value_name("DIR"))
        .arg(Arg::new("extension")
            .long("extension")
            .help("Extension of files read from DIR")
            .value_name("EXT")
            .default_value("csv"))

        // Output
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .help("Write result to FILE instead of standard output")
            .value_name("FILE"))
        .arg(Arg::new("header")
            .short('h')
            .long("header")
            .help("The first line is a header: keep it first and out of the sort")
            .conflicts_with("dir")
            .action(ArgAction::SetTrue))

        // Ordering
        .arg(Arg::new("field")
            .short('f')
            .long("field")
            .help("Sort by field N (zero-based)")
            .value_name("N")
            .default_value("0")
            .value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("reverse")
            .short('r')
            .long("reverse")
            .help("Sort in descending order")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("algorithm")
            .short('a')
            .long("algorithm")
            .help("Sorting algorithm")
            .long_help("Sorting algorithm: comparison (1) sorts all rows at once, tree (2) inserts rows into a binary search tree and reads it back in order. Tree sort keeps equal keys in arrival order but degrades to quadratic time on already sorted input.")
            .value_name("ALGO")
            .default_value("comparison")
            .value_parser(["comparison", "tree", "1", "2"]))
        .arg(Arg::new("delimiter")
            .short('t')
            .long("delimiter")
            .help("Use SEP to separate fields")
            .value_name("SEP")
            .default_value(","))

        // Pipeline
        .arg(Arg::new("parallel")
            .long("parallel")
            .help("Number of files read concurrently")
            .value_name("N"))
        .arg(Arg::new("skip-errors")
            .long("skip-errors")
            .help("Warn about and skip unreadable paths and files instead of aborting")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("uniform-fields")
            .long("uniform-fields")
            .help("Require every row read from DIR to have the same number of fields")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("debug")
            .long("debug")
            .help("Log pipeline progress to stderr")
            .action(ArgAction::SetTrue))

        .arg(Arg::new("help")
            .long("help")
            .help("Display this help and exit")
            .action(ArgAction::Help))
}

/// Parse configuration from command line matches
fn parse_config_from_matches(matches: &clap::ArgMatches) -> SortResult<SortConfig> {
    let mut builder = SortConfigBuilder::new();

    let input = if let Some(file) = matches.get_one::<String>("input") {
        InputSource::File(PathBuf::from(file))
    } else if let Some(dir) = matches.get_one::<String>("dir") {
        InputSource::Tree(PathBuf::from(dir))
    } else {
        InputSource::Stdin
    };
    builder = builder.input(input);

    if let Some(field) = matches.get_one::<usize>("field") {
        builder = builder.sort_key(*field);
    }
    if let Some(algorithm) = matches.get_one::<String>("algorithm") {
        builder = builder.strategy(algorithm.parse::<SortStrategy>()?);
    }
    if let Some(extension) = matches.get_one::<String>("extension") {
        builder = builder.extension(extension);
    }
    if let Some(sep_str) = matches.get_one::<String>("delimiter") {
        let mut chars = sep_str.chars();
        match (chars.next(), chars.next()) {
            (Some(sep), None) => builder = builder.delimiter(sep),
            _ => return Err(SortError::invalid_field_separator(sep_str)),
        }
    }
    if let Some(parallel_str) = matches.get_one::<String>("parallel") {
        let workers: usize = parallel_str
            .parse()
            .map_err(|_| SortError::parse_error(&format!("invalid worker count: {}", parallel_str)))?;
        builder = builder.workers(workers);
    }
    if let Some(output) = matches.get_one::<String>("output") {
        builder = builder.output_file(output.clone());
    }

    if matches.get_flag("reverse") {
        builder = builder.reverse();
    }
    if matches.get_flag("header") {
        builder = builder.header();
    }
    if matches.get_flag("skip-errors") {
        builder = builder.skip_errors();
    }
    if matches.get_flag("uniform-fields") {
        builder = builder.uniform_fields();
    }
    if matches.get_flag("debug") {
        builder = builder.debug();
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv_sort::config::{ErrorPolicy, SortDirection};

    #[test]
    fn test_parse_basic_config() {
        let matches = build_cli()
            .try_get_matches_from(["csv-sort", "-f", "2", "-r", "-a", "2"])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");

        assert_eq!(config.input, InputSource::Stdin);
        assert_eq!(config.sort_key, 2);
        assert_eq!(config.direction, SortDirection::Descending);
        assert_eq!(config.strategy, SortStrategy::Tree);
        assert_eq!(config.delimiter, ',');
    }

    #[test]
    fn test_parse_directory_config() {
        let matches = build_cli()
            .try_get_matches_from([
                "csv-sort",
                "-d", "data",
                "--extension", ".tsv",
                "-t", "\t",
                "--parallel", "3",
                "--skip-errors",
                "-o", "out.tsv",
            ])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");

        assert_eq!(config.input, InputSource::Tree(PathBuf::from("data")));
        assert_eq!(config.extension, "tsv");
        assert_eq!(config.delimiter, '\t');
        assert_eq!(config.effective_worker_count(), 3);
        assert_eq!(config.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.output_file.as_deref(), Some("out.tsv"));
    }

    #[test]
    fn test_long_delimiter_flag() {
        let matches = build_cli()
            .try_get_matches_from(["csv-sort", "--delimiter", ";"])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");
        assert_eq!(config.delimiter, ';');
    }

    #[test]
    fn test_logger_installs_once() {
        assert!(init_logging(false).is_ok());
        match init_logging(true) {
            Err(SortError::Internal { message }) => assert!(message.contains("logger")),
            other => panic!("expected a second logger to be refused, got {other:?}"),
        }
    }

    #[test]
    fn test_header_flag_for_single_file() {
        let matches = build_cli()
            .try_get_matches_from(["csv-sort", "-i", "in.csv", "-h"])
            .expect("Failed to parse test arguments");

        let config = parse_config_from_matches(&matches).expect("Failed to parse test config");
        assert!(config.header);
        assert_eq!(config.input, InputSource::File(PathBuf::from("in.csv")));
    }

    #[test]
    fn test_conflicting_options() {
        assert!(build_cli()
            .try_get_matches_from(["csv-sort", "-i", "a.csv", "-d", "dir"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["csv-sort", "-d", "dir", "-h"])
            .is_err());
    }

    #[test]
    fn test_invalid_values() {
        let matches = build_cli()
            .try_get_matches_from(["csv-sort", "-t", "::"])
            .expect("Failed to parse test arguments");
        assert!(parse_config_from_matches(&matches).is_err());
        assert!(build_cli()
            .try_get_matches_from(["csv-sort", "--field-separator", ";"])
            .is_err());

        let matches = build_cli()
            .try_get_matches_from(["csv-sort", "--parallel", "0"])
            .expect("Failed to parse test arguments");
        assert!(parse_config_from_matches(&matches).is_err());

        assert!(build_cli()
            .try_get_matches_from(["csv-sort", "-f", "-1"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["csv-sort", "-a", "bubble"])
            .is_err());
    }
}
