use std::env;
use std::fs;
use std::process::ExitCode;

use fb2_ingest::{BookRecord, ChapterRecord, Fb2Error, Fb2Parser, FallbackLabels};
use serde_json::{json, Value};

fn main() -> ExitCode {
    // stdout carries JSON, logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let mut rest = args.into_iter().skip(1).collect::<Vec<_>>();
    let pretty = pop_flag(&mut rest, "--pretty");
    let labels = match pop_value(&mut rest, "--labels")? {
        Some(code) => FallbackLabels::for_language(&code)
            .ok_or_else(|| format!("unsupported --labels value '{}' (expected en or ru)", code))?,
        None => FallbackLabels::default(),
    };
    let parser = Fb2Parser::new().with_labels(labels);

    if rest.is_empty() || rest[0] == "--help" || rest[0] == "-h" {
        print_help();
        return Ok(());
    }

    let cmd = rest.remove(0);
    match cmd.as_str() {
        "metadata" => {
            let path = first_arg(&rest, "metadata requires <fb2_path>")?;
            let book = load(&parser, &path)?;
            let output = json!({
                "fb2": path,
                "format": book.format(),
                "size": book.source_len(),
                "chapter_count": book.chapter_count(),
                "authors_joined": book.metadata().authors_joined(),
                "metadata": book.metadata(),
            });
            emit(&output, pretty)?;
        }
        "chapters" => {
            let mut args = rest;
            let ndjson = pop_flag(&mut args, "--ndjson");
            let path = first_arg(&args, "chapters requires <fb2_path>")?;
            let book = load(&parser, &path)?;
            if ndjson {
                for chapter in book.chapters() {
                    emit(&chapter_json(chapter), false)?;
                }
            } else {
                let output = json!({
                    "fb2": path,
                    "count": book.chapter_count(),
                    "chapters": book.chapters().iter().map(chapter_json).collect::<Vec<_>>(),
                });
                emit(&output, pretty)?;
            }
        }
        "chapter" => {
            let mut args = rest;
            let raw = pop_flag(&mut args, "--raw");
            let path = first_arg(&args, "chapter requires <fb2_path> <order>")?;
            let order = args
                .get(1)
                .ok_or_else(|| "chapter requires <fb2_path> <order>".to_string())?
                .parse::<usize>()
                .map_err(|e| format!("invalid chapter order: {}", e))?;
            let book = load(&parser, &path)?;
            let chapter = book.chapter(order).ok_or_else(|| {
                format!(
                    "chapter {} not found (chapter count: {})",
                    order,
                    book.chapter_count()
                )
            })?;
            if raw {
                println!("{}", chapter.content);
            } else {
                let output = json!({
                    "fb2": path,
                    "total_chapters": book.chapter_count(),
                    "chapter": chapter,
                });
                emit(&output, pretty)?;
            }
        }
        "validate" => {
            let mut args = rest;
            let strict = pop_flag(&mut args, "--strict");
            let path = first_arg(&args, "validate requires <fb2_path>")?;
            let bytes = read_file(&path)?;
            let report = parser.validate(&bytes);

            let output = json!({
                "fb2": path,
                "valid": report.is_valid(),
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "diagnostics": report.diagnostics(),
            });
            emit(&output, pretty)?;

            let has_failures = if strict {
                report.error_count() > 0 || report.warning_count() > 0
            } else {
                report.error_count() > 0
            };
            if has_failures {
                return Err(if strict {
                    "validation failed (strict mode)".to_string()
                } else {
                    "validation failed".to_string()
                });
            }
        }
        _ => {
            return Err(format!(
                "unknown command '{}'; run `fb2-ingest --help` for usage",
                cmd
            ));
        }
    }

    Ok(())
}

fn load(parser: &Fb2Parser, path: &str) -> Result<BookRecord, String> {
    let bytes = read_file(path)?;
    parser.parse(&bytes).map_err(display_err)
}

fn read_file(path: &str) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("failed to read '{}': {}", path, e))
}

fn chapter_json(chapter: &ChapterRecord) -> Value {
    json!({
        "order": chapter.order,
        "title": chapter.title,
        "chars": chapter.content.chars().count(),
    })
}

fn emit(value: &Value, pretty: bool) -> Result<(), String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn first_arg(args: &[String], msg: &str) -> Result<String, String> {
    args.first().cloned().ok_or_else(|| msg.to_string())
}

fn pop_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn pop_value(args: &mut Vec<String>, flag: &str) -> Result<Option<String>, String> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn display_err(err: Fb2Error) -> String {
    err.to_string()
}

fn print_help() {
    let help = r#"fb2-ingest - inspect FB2 (FictionBook) files

USAGE:
  fb2-ingest [--pretty] [--labels en|ru] <command> [args...]

COMMANDS:
  metadata <fb2_path>
  chapters <fb2_path> [--ndjson]
  chapter <fb2_path> <order> [--raw]
  validate <fb2_path> [--strict]

NOTES:
  - Output is JSON by default.
  - `chapters --ndjson` emits one JSON object per line.
  - `chapter --raw` prints the chapter text only.
  - `--labels` picks the language of generated titles ("Chapter N").
  - Set RUST_LOG=debug to see pipeline logs on stderr.
"#;
    println!("{}", help);
}
