use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use xlf_mt::config::TranslatorConfig;
use xlf_mt::mt::Orchestrator;
use xlf_mt::xliff::{RunOptions, translate_all, validate_request};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("xlf-mt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fill missing XLIFF translations using free machine translation services")
        .arg(
            Arg::new("file")
                .help("Source XLIFF file (e.g. src/locale/messages.xlf)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("language")
                .help("Target language: en, fr, ru, or all")
                .default_value("all")
                .index(2),
        )
        .arg(
            Arg::new("source-lang")
                .long("source-lang")
                .short('s')
                .help("Source language code (default: the file's source-language, else es)"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("Directory for translated files (default: next to the input)"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .help("Retry rounds over all providers after the first fails")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("no-capitalize")
                .long("no-capitalize")
                .help("Do not uppercase the first letter of translations")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("protect")
                .long("protect")
                .value_name("TOKEN")
                .help("Extra literal that must never be translated (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show every provider attempt")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only show warnings and the summary")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let input = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or("missing input file")?;
    let language = matches
        .get_one::<String>("language")
        .map(String::as_str)
        .unwrap_or("all");

    // Structural problems stop the run before any request is made.
    let languages = match validate_request(&input, language) {
        Ok(languages) => languages,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Err(e.into());
        }
    };

    let mut config = TranslatorConfig::from_env()?;
    if let Some(retries) = matches.get_one::<u32>("retries") {
        config.max_retries = *retries;
    }
    if matches.get_flag("no-capitalize") {
        config.codec.capitalize_first = false;
    }
    if let Some(tokens) = matches.get_many::<String>("protect") {
        config.codec.protected_literals.extend(tokens.cloned());
    }

    let options = RunOptions {
        output_dir: matches.get_one::<String>("output-dir").map(PathBuf::from),
        source_lang: matches.get_one::<String>("source-lang").cloned(),
    };

    let mut orchestrator = Orchestrator::with_default_providers(config)?;
    let results = translate_all(&mut orchestrator, &input, &languages, &options).await;

    let mut failed = 0;
    for (lang, result) in &results {
        match result {
            Ok(summary) => {
                println!("\n{}", summary);
                println!("Log saved: {}", summary.log.display());
            }
            Err(e) => {
                failed += 1;
                eprintln!("❌ {}: {}", lang, e);
            }
        }
    }

    if failed == results.len() {
        return Err(format!("translation failed for every language ({})", languages.join(", ")).into());
    }
    Ok(())
}
