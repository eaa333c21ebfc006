use chm_reader::{BookIcon, ChmFile, DirContainer};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <unpacked-chm-dir> [--search <QUERY>]", args[0]);
        std::process::exit(1);
    }

    let archive_dir = &args[1];
    let mut query: Option<&str> = None;
    if let Some(search_idx) = args.iter().position(|arg| arg == "--search") {
        if let Some(q) = args.get(search_idx + 1) {
            query = Some(q);
        } else {
            eprintln!("ERROR: --search flag requires an argument.");
            std::process::exit(1);
        }
    }

    println!("Reading archive from: {}", archive_dir);
    println!("{}", "=".repeat(60));

    let container = match DirContainer::open(archive_dir) {
        Ok(container) => container,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let mut archive = match ChmFile::load(container) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("\nERROR: Failed to load archive");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("\nArchive Information:");
    println!("  Title: {}", archive.title());
    println!("  Home: {}", archive.home_url());
    println!(
        "  Encoding: {} (cp{})",
        archive.current_encoding().name(),
        archive.current_encoding().codepage()
    );
    println!("  Has TOC: {}", archive.has_table_of_contents());
    println!("  Has index: {}", archive.has_index_table());
    println!("  Has search: {}", archive.has_search_table());
    println!("  Files: {}", archive.enumerate_files().len());

    if archive.has_table_of_contents() {
        match archive.parse_table_of_contents() {
            Ok(entries) => {
                println!("\nTable of Contents ({} entries):", entries.len());
                for entry in entries.iter().take(40) {
                    let icon = match BookIcon::from_id(entry.image_id) {
                        Some(BookIcon::Builtin(n)) => format!(" [icon {}]", n),
                        _ => String::new(),
                    };
                    println!(
                        "  {}{}{} -> {}",
                        "  ".repeat(entry.indent as usize),
                        entry.name,
                        icon,
                        entry.urls.first().map(String::as_str).unwrap_or("-")
                    );
                }
                if entries.len() > 40 {
                    println!("  ... and {} more", entries.len() - 40);
                }
            }
            Err(e) => eprintln!("  TOC parse failed: {}", e),
        }
    }

    if archive.has_index_table() {
        match archive.parse_index() {
            Ok(entries) => println!("\nIndex: {} terms", entries.len()),
            Err(e) => eprintln!("  Index parse failed: {}", e),
        }
    }

    if let Some(query) = query {
        println!("\nSearch results for {:?}:", query);
        match archive.search(query) {
            Ok(results) if results.is_empty() => println!("  (no matches)"),
            Ok(results) => {
                for (i, result) in results.iter().enumerate() {
                    println!("  {}. {} ({})", i + 1, result.title, result.url);
                }
            }
            Err(e) => {
                eprintln!("\nERROR: Search failed");
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        }
    }
}
