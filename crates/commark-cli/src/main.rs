//! commark - convert CommonMark documents
//!
//! Usage:
//!   commark [OPTIONS] [FILE...]
//!
//! Files (or stdin when none are given) are streamed through the parser in
//! fixed-size chunks and concatenated into one document.

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use commark_core::{
    render_commonmark, render_html, render_latex, render_man, render_xml, Options, Parser, Tree,
};
use tracing_subscriber::EnvFilter;

const CHUNK_SIZE: usize = 4096;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    match run(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let config = parse_args(args)?;
    let mut parser = Parser::new(config.options).map_err(|e| e.to_string())?;

    if config.files.is_empty() {
        stream(&mut parser, io::stdin().lock(), "<stdin>")?;
    }
    for path in &config.files {
        let file = File::open(path).map_err(|e| format!("failed to read '{}': {}", path, e))?;
        stream(&mut parser, file, path)?;
    }

    let tree = parser.finish();
    let output = render(&tree, &config);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| format!("failed to write output: {}", e))
}

/// Feed everything `reader` yields into `parser`.
fn stream(parser: &mut Parser, mut reader: impl Read, name: &str) -> Result<(), String> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(format!("failed to read '{}': {}", name, e)),
        };
        parser.feed(&buf[..n]);
        total += n;
    }
    tracing::debug!(input = name, bytes = total, "input consumed");
    Ok(())
}

fn render(tree: &Tree, config: &Config) -> String {
    let options = &config.options;
    match config.format {
        OutputFormat::Html => render_html(tree, options),
        OutputFormat::Xml => render_xml(tree, options),
        OutputFormat::Man => render_man(tree, options, config.width),
        OutputFormat::Latex => render_latex(tree, options, config.width),
        OutputFormat::Commonmark => render_commonmark(tree, options, config.width),
    }
}

#[derive(Debug)]
struct Config {
    format: OutputFormat,
    width: usize,
    options: Options,
    files: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum OutputFormat {
    Html,
    Xml,
    Man,
    Latex,
    Commonmark,
}

impl OutputFormat {
    fn from_name(name: &str) -> Result<Self, String> {
        match name {
            "html" => Ok(Self::Html),
            "xml" => Ok(Self::Xml),
            "man" => Ok(Self::Man),
            "latex" => Ok(Self::Latex),
            "commonmark" => Ok(Self::Commonmark),
            _ => Err(format!("unknown format: {}", name)),
        }
    }
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut format = OutputFormat::Html;
    let mut width = 0;
    let mut options = Options::default();
    let mut files = Vec::new();

    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("commark {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "-t" | "--to" => {
                i += 1;
                let name = args.get(i).ok_or("--to requires a format")?;
                format = OutputFormat::from_name(name)?;
            }
            "--width" => {
                i += 1;
                let value = args.get(i).ok_or("--width requires a number")?;
                width = value
                    .parse()
                    .map_err(|_| format!("invalid width: {}", value))?;
            }
            "--sourcepos" => options.source_pos = true,
            "--hardbreaks" => options.hard_breaks = true,
            "--nobreaks" => options.no_breaks = true,
            "--safe" => options.safe = true,
            "--smart" => options.smart = true,
            "--validate-utf8" => options.validate_utf8 = true,
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("unknown option: {}", arg));
            }
            _ => files.push(arg.clone()),
        }
        i += 1;
    }

    options.validate().map_err(|e| e.to_string())?;

    Ok(Config {
        format,
        width,
        options,
        files,
    })
}

fn print_help() {
    eprintln!(
        r#"commark - CommonMark converter

USAGE:
    commark [OPTIONS] [FILE...]

Reads stdin when no FILE is given.

OPTIONS:
    -t, --to FORMAT      Output format: html (default), xml, man, latex, commonmark
        --width N        Wrap man, latex and commonmark output at N columns (0: no wrapping)
        --sourcepos      Include source positions in html and xml output
        --hardbreaks     Render soft breaks as hard breaks
        --nobreaks       Render soft breaks as spaces
        --safe           Omit raw HTML and dangerous URLs
        --smart          Use typographic quotes, dashes and ellipses
        --validate-utf8  Replace invalid UTF-8 without warning
    -h, --help           Print help information
    -V, --version        Print version information

Set RUST_LOG=commark_core=debug to trace parsing.

EXAMPLES:
    commark README.md                 Render a file as HTML
    commark --to man --width 72 a.md  Render a man page body
    cat a.md | commark --to commonmark
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("commark")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let config = parse_args(&args(&[])).unwrap();
        assert!(matches!(config.format, OutputFormat::Html));
        assert_eq!(config.width, 0);
        assert_eq!(config.options, Options::default());
        assert!(config.files.is_empty());
    }

    #[test]
    fn test_parse_args_flags_and_files() {
        let config = parse_args(&args(&["--to", "man", "--width", "72", "--smart", "a.md", "b.md"])).unwrap();
        assert!(matches!(config.format, OutputFormat::Man));
        assert_eq!(config.width, 72);
        assert!(config.options.smart);
        assert_eq!(config.files, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_parse_args_rejects_conflicts_and_unknowns() {
        assert!(parse_args(&args(&["--hardbreaks", "--nobreaks"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["--to", "pdf"])).is_err());
        assert!(parse_args(&args(&["--width"])).is_err());
    }
}
