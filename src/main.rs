use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use wikicodec::ast::SourceFormat;
use wikicodec::{RenderOptions, locate, reference, render};

#[derive(Parser)]
#[command(
    name = "wikicodec",
    version,
    about = "Convert between wikitext and HTML, locate templates and sections"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert wikitext to HTML
    ToHtml {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Convert HTML to wikitext
    ToWikitext {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,

        /// Render headings as `==Title==` instead of `== Title ==`
        #[arg(long)]
        compact_headings: bool,
    },

    /// Dump the parsed document as JSON
    Ast {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,

        /// Markup the input is written in
        #[arg(long, value_enum, default_value = "wikitext")]
        from: InputFormat,
    },

    /// Print the text of a `{{NAME ...}}` template
    Template {
        /// Template name (case-insensitive)
        name: String,

        /// Input file (stdin if omitted)
        file: Option<PathBuf>,

        /// Print every top-level occurrence, prefixed with `start..end`
        #[arg(long)]
        all: bool,
    },

    /// Print the section under a heading, subsections included
    Section {
        /// Heading title (case-insensitive)
        title: String,

        /// Input file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Normalize a reference field
    Refs {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,

        /// Dump the parsed items as JSON instead
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    Wikitext,
    Html,
}

impl From<InputFormat> for SourceFormat {
    fn from(f: InputFormat) -> Self {
        match f {
            InputFormat::Wikitext => SourceFormat::Wikitext,
            InputFormat::Html => SourceFormat::Html,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when a lookup found nothing.
fn run(command: Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::ToHtml { file } => {
            let src = wikicodec::read_input(file.as_deref())?;
            println!("{}", render::wikitext_to_html(&src));
        }
        Command::ToWikitext {
            file,
            compact_headings,
        } => {
            let src = wikicodec::read_input(file.as_deref())?;
            let opts = RenderOptions {
                pad_headings: !compact_headings,
            };
            println!("{}", render::html_to_wikitext_with_options(&src, &opts));
        }
        Command::Ast { file, from } => {
            let src = wikicodec::read_input(file.as_deref())?;
            let doc = wikicodec::document_file(&src, from.into());
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::Template { name, file, all } => {
            let src = wikicodec::read_input(file.as_deref())?;
            if all {
                let spans = locate::find_template_ranges(&src, &name);
                if spans.is_empty() {
                    eprintln!("template not found: {}", name);
                    return Ok(false);
                }
                for s in spans {
                    println!("{}..{} {}", s.start(), s.end(), s.content);
                }
            } else {
                let Some(span) = locate::find_template_range(&src, &name) else {
                    eprintln!("template not found: {}", name);
                    return Ok(false);
                };
                println!("{}", span.content);
            }
        }
        Command::Section { title, file } => {
            let src = wikicodec::read_input(file.as_deref())?;
            let Some(span) = locate::find_section_by_title(&src, &title) else {
                eprintln!("section not found: {}", title);
                return Ok(false);
            };
            print!("{}", span.content);
            if !span.content.ends_with('\n') {
                println!();
            }
        }
        Command::Refs { file, json } => {
            let src = wikicodec::read_input(file.as_deref())?;
            let src = src.strip_suffix('\n').unwrap_or(&src);
            let items = reference::parse(src);
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                println!("{}", reference::serialize(&items));
            }
        }
    }
    Ok(true)
}
