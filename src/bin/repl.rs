//! Interactive shell for MiniSQL
//!
//! A thin collaborator around the engine: reads `;`-terminated
//! statements (possibly spanning lines), hands them to the database,
//! and renders the returned rows, counts, or errors. Contains no
//! engine logic of its own.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use minisql::{Database, ExecutionResult};

const BANNER: &str = r#"
MiniSQL v0.1.0
Type SQL statements terminated by ';', or .help for commands.
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut db = match std::env::args().nth(1) {
        Some(path) => {
            println!("Opening database at {}", path);
            Database::open(path)?
        }
        None => {
            println!("No database file given; running in memory.");
            Database::in_memory()
        }
    };

    println!("{}", BANNER);

    let mut rl = DefaultEditor::new()?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "minisql> " } else { "      -> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && trimmed.starts_with('.') {
                    let _ = rl.add_history_entry(trimmed);
                    if !dot_command(&mut db, trimmed)? {
                        break;
                    }
                    continue;
                }
                if trimmed.is_empty() && buffer.is_empty() {
                    continue;
                }
                buffer.push_str(&line);
                buffer.push('\n');
                if trimmed.ends_with(';') {
                    let _ = rl.add_history_entry(buffer.trim());
                    run_statements(&mut db, &buffer);
                    buffer.clear();
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("input error: {}", err);
                break;
            }
        }
    }

    db.close()?;
    println!("Bye.");
    Ok(())
}

/// Returns false when the shell should exit.
fn dot_command(db: &mut Database, command: &str) -> Result<bool> {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        ".help" => {
            println!(".help              show this help");
            println!(".tables            list tables");
            println!(".schema <table>    show a table's columns");
            println!(".stats             storage and cache statistics");
            println!(".drop <table>      drop a table");
            println!(".quit              save and exit");
        }
        ".tables" => {
            for name in db.table_names() {
                println!("{}", name);
            }
        }
        ".schema" => match parts.next().and_then(|name| db.table_info(name)) {
            Some(info) => {
                println!(
                    "{} (created {}, {} page(s), {} row(s))",
                    info.name,
                    info.created_at.format("%Y-%m-%d %H:%M:%S"),
                    info.page_count,
                    info.row_count
                );
                for (name, data_type) in info.columns {
                    println!("  {} {}", name, data_type);
                }
            }
            None => println!("usage: .schema <table> (table must exist)"),
        },
        ".stats" => {
            let stats = db.stats();
            println!("cache hits:    {}", stats.hits);
            println!("cache misses:  {}", stats.misses);
            println!("evictions:     {}", stats.evictions);
            println!("hit rate:      {:.2}%", stats.hit_rate() * 100.0);
            println!("total pages:   {}", stats.total_pages);
            println!("free pages:    {}", stats.free_pages);
        }
        ".drop" => match parts.next() {
            Some(name) => match db.drop_table(name) {
                Ok(()) => println!("dropped table '{}'", name),
                Err(err) => println!("{}", err),
            },
            None => println!("usage: .drop <table>"),
        },
        ".quit" | ".exit" => return Ok(false),
        other => println!("unknown command '{}'; try .help", other),
    }
    Ok(true)
}

fn run_statements(db: &mut Database, sql: &str) {
    match db.execute_script(sql) {
        Ok(results) => {
            for result in results {
                match result {
                    Ok(ExecutionResult::Rows { columns, rows }) => {
                        let count = rows.len();
                        print!("{}", format_rows(&columns, &rows));
                        println!("{} row(s)", count);
                    }
                    Ok(ExecutionResult::Affected { count }) => {
                        println!("{} row(s) affected", count);
                    }
                    Ok(ExecutionResult::SchemaChange { table }) => {
                        println!("table '{}' created", table);
                    }
                    Err(err) => println!("{}", err),
                }
            }
        }
        Err(err) => println!("{}", err),
    }
}

fn format_rows(columns: &[String], rows: &[minisql::storage::Row]) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let separator = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s.push('\n');
        s
    };

    let mut out = separator.clone();
    out.push('|');
    for (i, column) in columns.iter().enumerate() {
        out.push_str(&format!(" {:<width$} |", column, width = widths[i]));
    }
    out.push('\n');
    out.push_str(&separator);
    for row in &cells {
        out.push('|');
        for (i, cell) in row.iter().enumerate() {
            out.push_str(&format!(" {:<width$} |", cell, width = widths[i]));
        }
        out.push('\n');
    }
    if !cells.is_empty() {
        out.push_str(&separator);
    }
    out
}
