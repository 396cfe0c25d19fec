use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use markwell_core::{
    CmarkRenderer, Editor, EditorConfig, MarkdownSerializer, RenderOptions, parse_fragment,
    render_blocks,
};
use miette::{IntoDiagnostic, Result};

#[derive(Parser)]
#[command(version, about = "Markwell - markdown WYSIWYG editing engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markup to block HTML
    Render {
        /// Markup file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Serialize an HTML fragment to markup
    Serialize {
        /// HTML file, stdin when omitted
        input: Option<PathBuf>,
    },
    /// Replay a keystroke script against a fresh editor
    ///
    /// Plain text is typed; {ENTER}, {BS}, {HOME} and {END} press keys.
    Replay {
        /// The script itself
        script: String,

        /// JSON editor config
        #[arg(long, env = "MARKWELL_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_miette();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input } => {
            let markup = read_input(input.as_deref())?;
            let rendered = render_blocks(&CmarkRenderer, &markup, &RenderOptions::default());
            println!("{}", rendered.html());
        }
        Commands::Serialize { input } => {
            let html = read_input(input.as_deref())?;
            println!("{}", MarkdownSerializer::default().serialize(&html));
        }
        Commands::Replay { script, config } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => EditorConfig::default(),
            };
            replay(&script, config)?;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step<'a> {
    Type(&'a str),
    Enter,
    Backspace,
    Home,
    End,
}

/// Split a script into typing runs and key presses. Unknown `{…}` tokens are
/// typed literally.
fn parse_script(script: &str) -> Vec<Step<'_>> {
    const KEYS: [(&str, Step<'static>); 4] = [
        ("{ENTER}", Step::Enter),
        ("{BS}", Step::Backspace),
        ("{HOME}", Step::Home),
        ("{END}", Step::End),
    ];

    let mut steps = Vec::new();
    let mut rest = script;
    let mut pos = 0;
    while pos < rest.len() {
        let key = KEYS
            .iter()
            .find(|(token, _)| rest[pos..].starts_with(token));
        match key {
            Some((token, step)) => {
                if pos > 0 {
                    steps.push(Step::Type(&rest[..pos]));
                }
                steps.push(step.clone());
                rest = &rest[pos + token.len()..];
                pos = 0;
            }
            None => {
                pos += rest[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if !rest.is_empty() {
        steps.push(Step::Type(rest));
    }
    steps
}

fn replay(script: &str, config: EditorConfig) -> Result<()> {
    let dom = parse_fragment(r#"<div id="editor"></div>"#);
    let mut editor = Editor::create(dom, "editor", config)?;

    for step in parse_script(script) {
        tracing::debug!(?step, "replay");
        match step {
            Step::Type(text) => editor.type_text(text),
            Step::Enter => {
                editor.press_enter();
            }
            Step::Backspace => {
                editor.press_backspace();
            }
            Step::Home => {
                editor.press_home();
            }
            Step::End => {
                editor.press_end();
            }
        }
    }

    println!("html:     {}", editor.html());
    println!("markdown: {:?}", editor.markdown());
    match editor.caret_offset() {
        Some(offset) => println!("caret:    {offset}"),
        None => println!("caret:    none"),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).into_diagnostic(),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
            Ok(buf)
        }
    }
}

fn load_config(path: &Path) -> Result<EditorConfig> {
    let raw = std::fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&raw).into_diagnostic()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
