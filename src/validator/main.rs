//! Standalone validator for bio phrase files.
//!
//! Checks a phrase JSON file for proper structure and that every phrase
//! fits the profile bio length limit.

use std::process::ExitCode;

use clap::Parser;

use anime_userbot::config::{MAX_BIO_LENGTH_FREE, MAX_BIO_LENGTH_PREMIUM, PhraseBook};

/// Bio phrase file validator.
#[derive(Parser, Debug)]
#[command(name = "validate_phrases")]
#[command(about = "Validates bio phrase files for the anime userbot")]
#[command(version)]
struct Args {
    /// Path to the JSON phrase file to validate.
    #[arg(short, long, default_value = "phrases.json")]
    file: String,

    /// Treat as Telegram Premium account (allows 140 chars instead of 70).
    #[arg(short, long)]
    premium: bool,

    /// Generate an example phrase file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show every phrase, not only the failing ones.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_file(&args.file, args.premium, args.verbose)
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = PhraseBook::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example phrase file written to: {output_path}");
            println!(
                "\nIt holds {} english and {} music phrases.",
                example.english.len(),
                example.music.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_file(path: &str, premium: bool, verbose: bool) -> ExitCode {
    println!("Validating: {path}");
    println!("Account type: {}\n", if premium { "Premium" } else { "Free" });

    let mut book = match PhraseBook::load_from_file(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("✗ Failed to load phrases: {e}");
            return ExitCode::FAILURE;
        }
    };

    // CLI overrides the file
    book.set_premium(premium);
    let max_length = book.max_bio_length();

    let mut errors = 0;
    let mut warnings = 0;

    for (set, results) in book.validate_all() {
        println!("{set} ({} phrases)", results.len());

        for (phrase, result) in book.phrases(set).iter().zip(&results) {
            let char_count = phrase.chars().count();

            if verbose {
                println!("  \"{}\" ({char_count} chars)", truncate(phrase, 40));
            }

            match result {
                Ok(()) => {
                    let warn_threshold = max_length * 90 / 100;
                    if char_count > warn_threshold {
                        warnings += 1;
                        if verbose {
                            println!(
                                "    ⚠ Warning: {char_count} chars is close to the {max_length} char limit"
                            );
                        }
                    } else if verbose {
                        println!("    ✓ OK");
                    }
                }
                Err(e) => {
                    errors += 1;
                    println!("    ✗ Error: {e}");
                }
            }
        }
    }

    println!();

    if book.english.is_empty() {
        println!("✗ The english set is empty; the rotator has nothing to start with");
        return ExitCode::FAILURE;
    }

    let total = book.len();
    if errors == 0 {
        println!("✓ All {total} phrases are valid!");

        if warnings > 0 {
            println!("  ({warnings} warning(s) - phrases close to character limit)");
        }

        println!("\nCharacter limits:");
        println!("  Free account:    {MAX_BIO_LENGTH_FREE} chars");
        println!("  Premium account: {MAX_BIO_LENGTH_PREMIUM} chars");

        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s) in {total} phrases");
        println!("  Valid: {}/{total}", total - errors);

        ExitCode::FAILURE
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
