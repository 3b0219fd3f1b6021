//! Line-oriented REPL over stdin/stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::app::AppState;
use crate::cards::DroppedFile;
use crate::credentials::SaveOutcome;
use crate::publish::PublishOutcome;

pub const HELP: &str = "\
Commands:
  /agents                    list agents and the fan-out selection
  /select <id>               toggle an agent in the selection
  /send <prompt>             fan a prompt out to the selected agents
  /new                       open an empty session
  /sessions                  list sessions (newest first)
  /use <n>                   make session n active
  /paste <text>              paste an assistant reply into the active session
  /capture                   add the active session's latest reply to the pack
  /pack                      list pack cards
  /title <text>              set the pack title
  /drop <file>... [-- text]  add dropped files and optional text
  /rm <card-id>              remove a card
  /diagram <source>          edit the live diagram (\\n for newlines)
  /adddiagram                add the live diagram to the pack
  /publish                   publish the pack
  /context [path]            fetch context for a spec path
  /keys                      refresh credential status
  /setkey <provider> <key>   store a provider key
  /help                      show this help
  /quit                      exit";

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Agents,
    Select(String),
    Send(String),
    New,
    Sessions,
    Use(usize),
    Paste(String),
    Capture,
    Pack,
    Title(String),
    Drop {
        files: Vec<String>,
        text: Option<String>,
    },
    Remove(Uuid),
    Diagram(String),
    AddDiagram,
    Publish,
    Context(Option<String>),
    Keys,
    SetKey {
        provider: String,
        key: String,
    },
    Help,
    Quit,
    /// Anything unrecognized, with a reason.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (line, ""),
        };

        let required = |name: &str, make: fn(String) -> Command| {
            if rest.is_empty() {
                Command::Invalid(format!("{name} needs an argument"))
            } else {
                make(rest.to_string())
            }
        };

        match head {
            "/agents" => Self::Agents,
            "/select" => required("/select", Self::Select),
            "/send" => required("/send", Self::Send),
            "/new" => Self::New,
            "/sessions" => Self::Sessions,
            "/use" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => Self::Use(n),
                _ => Self::Invalid("/use needs a session number".into()),
            },
            "/paste" => required("/paste", Self::Paste),
            "/capture" => Self::Capture,
            "/pack" => Self::Pack,
            "/title" => Self::Title(rest.to_string()),
            "/drop" => parse_drop(rest),
            "/rm" => match Uuid::parse_str(rest) {
                Ok(id) => Self::Remove(id),
                Err(_) => Self::Invalid("/rm needs a card id".into()),
            },
            "/diagram" => required("/diagram", |s| Self::Diagram(s.replace("\\n", "\n"))),
            "/adddiagram" => Self::AddDiagram,
            "/publish" => Self::Publish,
            "/context" => Self::Context((!rest.is_empty()).then(|| rest.to_string())),
            "/keys" => Self::Keys,
            "/setkey" => match rest.split_once(char::is_whitespace) {
                Some((provider, key)) if !key.trim().is_empty() => Self::SetKey {
                    provider: provider.to_string(),
                    key: key.trim().to_string(),
                },
                _ => Self::Invalid("/setkey needs a provider and a key".into()),
            },
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            other => Self::Invalid(format!("unknown command: {other}")),
        }
    }
}

/// Split at the first `--` that stands alone as a word.
fn split_text_marker(rest: &str) -> Option<(&str, &str)> {
    rest.match_indices("--").find_map(|(i, _)| {
        let before = &rest[..i];
        let after = &rest[i + 2..];
        let starts_word = before.chars().next_back().is_none_or(char::is_whitespace);
        let ends_word = after.chars().next().is_none_or(char::is_whitespace);
        (starts_word && ends_word).then_some((before, after))
    })
}

fn parse_drop(rest: &str) -> Command {
    let (files, text) = match split_text_marker(rest) {
        Some((files, text)) => (files, Some(text.trim().to_string())),
        None => (rest, None),
    };
    let files: Vec<String> = files.split_whitespace().map(str::to_string).collect();
    if files.is_empty() && text.as_deref().is_none_or(str::is_empty) {
        return Command::Invalid("/drop needs files or text".into());
    }
    Command::Drop { files, text }
}

fn truncate(s: &str, max: usize) -> String {
    let first = s.lines().next().unwrap_or_default();
    if first.chars().count() > max {
        format!("{}…", first.chars().take(max).collect::<String>())
    } else {
        first.to_string()
    }
}

/// Execute one command. Returns false when the REPL should stop.
pub async fn execute(state: &AppState, command: Command) -> bool {
    match command {
        Command::Agents => {
            let selected = state.sessions.selected_agents().await;
            for agent in state.agents.all() {
                let mark = if selected.contains(&agent.id) { "*" } else { " " };
                println!(
                    "{mark} {:<8} {} ({}/{})",
                    agent.id, agent.label, agent.provider, agent.model
                );
            }
        }
        Command::Select(id) => {
            if state.agents.get(&id).is_none() {
                println!("Unknown agent: {id}");
            } else if state.sessions.toggle_agent(&id).await {
                println!("Selected {id}");
            } else {
                println!("Deselected {id}");
            }
        }
        Command::Send(prompt) => {
            let created = state.sessions.fan_out_selected(&prompt).await;
            if created.is_empty() {
                println!("No agents selected");
            } else {
                println!("Opened {} session(s)", created.len());
            }
        }
        Command::New => match state.sessions.new_session().await {
            Some(s) => println!("Opened session {} ({})", s.id, s.title),
            None => println!("No agents configured"),
        },
        Command::Sessions => {
            let active = state.sessions.active_id().await;
            let sessions = state.sessions.snapshot().await;
            if sessions.is_empty() {
                println!("No sessions");
            }
            for (i, s) in sessions.iter().enumerate() {
                let mark = if Some(s.id) == active { "*" } else { " " };
                println!("{mark} {}. {} [{} messages]", i + 1, s.title, s.messages.len());
            }
        }
        Command::Use(n) => {
            let sessions = state.sessions.snapshot().await;
            match sessions.get(n - 1) {
                Some(s) => {
                    state.sessions.set_active(s.id).await;
                    println!("Active: {}", s.title);
                }
                None => println!("No session {n}"),
            }
        }
        Command::Paste(text) => {
            if state.sessions.paste_into_active(&text).await {
                println!("Reply pasted");
            } else {
                println!("No active session");
            }
        }
        Command::Capture => match state.capture_active().await {
            Some(card) => println!("Captured card {}", card.id),
            None => println!("Nothing to capture"),
        },
        Command::Pack => {
            println!("Title: {}", state.pack_title().await);
            let cards = state.cards.cards().await;
            if cards.is_empty() {
                println!("Pack is empty");
            }
            for card in cards.iter() {
                let preview = match state.previews.snapshot(card.id) {
                    Some(p) => match p.error {
                        Some(e) => format!(" [diagram error: {}]", truncate(&e, 60)),
                        None => format!(" [{:?}]", p.phase),
                    },
                    None => String::new(),
                };
                println!(
                    "{} {:<10} {}{preview}",
                    card.id,
                    card.kind.name(),
                    truncate(card.label(), 60)
                );
            }
        }
        Command::Title(title) => {
            state.set_pack_title(&title).await;
            println!("Title: {}", state.pack_title().await);
        }
        Command::Drop { files, text } => {
            let files: Vec<DroppedFile> = files.into_iter().map(DroppedFile::new).collect();
            let added = state.cards.ingest_drop(&files, text.as_deref()).await;
            println!("Added {} card(s)", added.len());
        }
        Command::Remove(id) => {
            if state.cards.remove_card(id).await {
                println!("Removed {id}");
            } else {
                println!("No card {id}");
            }
        }
        Command::Diagram(source) => {
            state.helper.edit(source);
            println!("Diagram updated");
        }
        Command::AddDiagram => {
            let snap = state.helper.snapshot();
            if let Some(e) = snap.error {
                println!("Warning: diagram has errors: {}", truncate(&e, 80));
            }
            let card = state.helper.add_to_pack(&state.cards).await;
            println!("Added diagram card {}", card.id);
        }
        Command::Publish => match state.publish().await {
            PublishOutcome::Skipped => println!("Pack is empty; nothing to publish"),
            PublishOutcome::Published(v) | PublishOutcome::Failed(v) => {
                println!("{}", serde_json::to_string_pretty(&v).unwrap_or_default())
            }
        },
        Command::Context(path) => {
            if let Some(path) = path {
                state.context.set_path(path).await;
            }
            let v = state.context.fetch_current().await;
            println!("{}", serde_json::to_string_pretty(&v).unwrap_or_default());
        }
        Command::Keys => {
            let status = state.credentials.refresh_all().await;
            for provider in state.credentials.providers() {
                let ok = status.get(provider).copied().unwrap_or(false);
                println!("{provider:<10} {}", if ok { "configured" } else { "missing" });
            }
        }
        Command::SetKey { provider, key } => {
            state.credentials.set_input(&provider, key).await;
            match state.credentials.save_input(&provider).await {
                SaveOutcome::Saved { configured } => {
                    println!("Saved {provider} key (configured: {configured})")
                }
                SaveOutcome::Rejected => println!("Backend did not accept the {provider} key"),
                SaveOutcome::Skipped => println!("Empty key ignored"),
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
        Command::Invalid(reason) => {
            println!("{reason}");
            println!("{HELP}");
        }
    }
    true
}

/// Read commands from stdin until EOF or `/quit`.
pub async fn run(state: Arc<AppState>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if !execute(&state, Command::parse(line)).await {
            break;
        }
        eprint!("> ");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::diagram::preview::tests::RecordingRenderer;
    use crate::dispatch::Envelope;
    use crate::dispatch::stub::StubBackend;
    use serde_json::json;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(Command::parse("/agents"), Command::Agents);
        assert_eq!(Command::parse("  /publish  "), Command::Publish);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/use 2"), Command::Use(2));
        assert_eq!(
            Command::parse("/send draft the gates"),
            Command::Send("draft the gates".into())
        );
    }

    #[test]
    fn rejects_missing_arguments() {
        assert!(matches!(Command::parse("/send"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/use 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/rm nope"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/setkey openai"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/bogus"), Command::Invalid(_)));
    }

    #[test]
    fn parses_drop_files_and_text() {
        assert_eq!(
            Command::parse("/drop a.png b.pdf -- some notes"),
            Command::Drop {
                files: vec!["a.png".into(), "b.pdf".into()],
                text: Some("some notes".into()),
            }
        );
        assert_eq!(
            Command::parse("/drop a.png"),
            Command::Drop {
                files: vec!["a.png".into()],
                text: None,
            }
        );
        assert!(matches!(Command::parse("/drop --  "), Command::Invalid(_)));
    }

    #[test]
    fn drop_marker_must_stand_alone() {
        assert_eq!(
            Command::parse("/drop release--notes.md"),
            Command::Drop {
                files: vec!["release--notes.md".into()],
                text: None,
            }
        );
        assert_eq!(
            Command::parse("/drop a--b.png -- see a--b"),
            Command::Drop {
                files: vec!["a--b.png".into()],
                text: Some("see a--b".into()),
            }
        );
        assert_eq!(
            Command::parse("/drop -- just text"),
            Command::Drop {
                files: vec![],
                text: Some("just text".into()),
            }
        );
    }

    #[test]
    fn diagram_unescapes_newlines() {
        assert_eq!(
            Command::parse("/diagram graph TD\\nA-->B"),
            Command::Diagram("graph TD\nA-->B".into())
        );
    }

    #[test]
    fn context_path_is_optional() {
        assert_eq!(Command::parse("/context"), Command::Context(None));
        assert_eq!(
            Command::parse("/context specs/x.md"),
            Command::Context(Some("specs/x.md".into()))
        );
    }

    #[test]
    fn setkey_splits_provider_and_key() {
        assert_eq!(
            Command::parse("/setkey xai  xai-123 "),
            Command::SetKey {
                provider: "xai".into(),
                key: "xai-123".into(),
            }
        );
    }

    #[tokio::test]
    async fn execute_drives_state() {
        let backend = StubBackend::new(|_: &Envelope| Ok(json!({"ok": true})));
        let state = AppState::new(AppConfig::default(), backend.clone(), RecordingRenderer::new());

        assert!(execute(&state, Command::parse("/send hello")).await);
        assert_eq!(state.sessions.len().await, 2);

        assert!(execute(&state, Command::parse("/paste the reply")).await);
        assert!(execute(&state, Command::parse("/capture")).await);
        assert_eq!(state.cards.len().await, 1);

        assert!(execute(&state, Command::parse("/title Gates")).await);
        assert!(execute(&state, Command::parse("/publish")).await);
        assert_eq!(backend.ops(), vec!["specbundle.create"]);

        assert!(!execute(&state, Command::Quit).await);
    }
}
