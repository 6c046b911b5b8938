// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! urlhook CLI
//!
//! Loads a page into an instrumented headless window and prints every URL
//! it touches.

use std::env;
use std::io::Read;
use std::process::ExitCode;

use anyhow::Context;

use urlhook::{DedupStore, HookEngine, UrlMatcher, Window, WindowConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("urlhook=info".parse().expect("static directive parses")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let result = match args[1].as_str() {
        "inspect" => {
            let Some(url) = args.get(2) else {
                eprintln!("Usage: urlhook inspect <url> [--json]");
                return ExitCode::from(1);
            };
            let json = args[3..].iter().any(|a| a == "--json");
            inspect(url, json).await
        }
        "scan" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: urlhook scan <file|->");
                return ExitCode::from(1);
            };
            scan(path)
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-v" | "version" => {
            println!("urlhook {}", urlhook::VERSION);
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"urlhook - URL exfiltration visibility for headless pages

USAGE:
    urlhook <COMMAND> [OPTIONS]

COMMANDS:
    inspect <url> [--json]   Load a page with URL hooks installed and list every URL it touches
    scan <file|->            List the URLs found in a file or stdin
    help                     Show this help message
    version                  Show version information

EXAMPLES:
    urlhook inspect https://example.com
    urlhook inspect https://example.com --json > urls.json
    curl -s https://example.com/app.js | urlhook scan -

Set RUST_LOG=urlhook=debug for verbose output.
"#
    );
}

/// Install the hooks at document start, then let the page load into the
/// instrumented window
async fn inspect(url: &str, json: bool) -> anyhow::Result<()> {
    let window = Window::new(WindowConfig::for_auditing().url(url))
        .context("failed to create window")?;
    let engine = HookEngine::new();
    engine
        .install(&window)
        .context("failed to install URL hooks")?;

    let response = window
        .load()
        .await
        .with_context(|| format!("failed to load {}", url))?;
    let tasks = window.run_until_idle().await;
    tracing::debug!(
        status = response.status_code(),
        tasks,
        "Page load finished"
    );

    if json {
        println!("{}", engine.to_json()?);
        return Ok(());
    }

    let lines = engine.lines();
    println!("=== {} ({} URLs) ===", url, lines.len());
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn scan(path: &str) -> anyhow::Result<()> {
    let text = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
    };

    for url in unique_urls(&text) {
        println!("{}", url);
    }
    Ok(())
}

/// URLs in `text`, first occurrence of each, in order
fn unique_urls(text: &str) -> Vec<&str> {
    let matcher = UrlMatcher::new();
    let seen = DedupStore::new();
    matcher
        .find_iter(text)
        .filter(|url| seen.check_and_insert(url))
        .collect()
}
