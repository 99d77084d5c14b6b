use std::path::{Path, PathBuf};

use clap::Args;
use mamaswitch_session::{Event, EventOutcome, SessionHandle};
use mamaswitch_utterance::Command;
use mamaswitch_voiceprint::AudioSample;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::{get_config, identifier, output_result};
use crate::Cli;

/// Interactive session.
///
/// Each stdin line is one utterance. Prefix it with `@path/to.wav ` to attach
/// audio. Lines starting with `:` are session commands: `:status`,
/// `:history`, `:reset`, `:quit`.
#[derive(Args)]
pub struct RunCommand {
    /// Speaker model artifact (overrides config file)
    #[arg(long)]
    model: Option<PathBuf>,
}

/// One parsed input line.
#[derive(Debug, PartialEq)]
enum Line<'a> {
    Empty,
    Status,
    History,
    Reset,
    Quit,
    Unknown(&'a str),
    Utterance {
        audio: Option<&'a Path>,
        text: &'a str,
    },
}

fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Empty;
    }
    if let Some(cmd) = line.strip_prefix(':') {
        return match cmd {
            "status" | "s" => Line::Status,
            "history" | "h" => Line::History,
            "reset" | "r" => Line::Reset,
            "quit" | "q" | "exit" => Line::Quit,
            other => Line::Unknown(other),
        };
    }
    if let Some(rest) = line.strip_prefix('@') {
        let (path, text) = match rest.split_once(char::is_whitespace) {
            Some((path, text)) => (path, text.trim()),
            None => (rest, ""),
        };
        return Line::Utterance {
            audio: Some(Path::new(path)),
            text,
        };
    }
    Line::Utterance { audio: None, text: line }
}

/// Reads the attached audio. A failed read degrades the event to text-only.
fn load_audio(path: &Path) -> Option<AudioSample> {
    match AudioSample::read_wav(path) {
        Ok(audio) => Some(audio),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "audio unreadable, continuing text-only");
            None
        }
    }
}

fn print_outcome(out: &EventOutcome, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(&out.entry)?);
        return Ok(());
    }
    let command = out.command.map_or("-", |c| c.as_str());
    println!(
        "[{} {:>3}% {}] {} / {}",
        out.speaker, out.sync_rate, out.method, command, out.attitude
    );
    println!("{}", out.response);
    Ok(())
}

impl RunCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let sinks = cfg.sinks()?;
        if sinks.is_empty() {
            debug!("no log_dir or journal configured, records stay in memory");
        }
        let session = SessionHandle::builder(cfg.session.clone())
            .identifier(identifier(&cfg, self.model.as_deref()))
            .sink(sinks)
            .spawn()?;
        info!("session started, type :quit to leave");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                Line::Empty => {}
                Line::Status => output_result(&session.status().await?, cli.json)?,
                Line::History => output_result(&session.history().await?, cli.json)?,
                Line::Reset => output_result(&session.reset().await?, cli.json)?,
                Line::Quit => break,
                Line::Unknown(cmd) => eprintln!("unknown command :{cmd}"),
                Line::Utterance { audio, text } => {
                    let mut event = Event::text(text);
                    event.audio = audio.and_then(load_audio);
                    let out = session.submit(event).await?;
                    print_outcome(&out, cli.json)?;
                    if out.command == Some(Command::Exit) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
