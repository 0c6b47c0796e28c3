//! Headless mode for the RPG.
//!
//! A line-oriented text interface for running the game without a TUI,
//! intended for scripting and automated play. Lines starting with `#` are
//! commands; anything else is the party leader's action.

use rpg_core::{
    CharacterClass, CharacterRequest, GameLogEntry, GamePhase, GameSession, Gender, Race,
    SaveStore, TurnOutcome, MAX_COMPANIONS,
};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One parsed line of headless input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessCommand {
    Create(CharacterRequest),
    Party(Vec<CharacterRequest>),
    Save,
    Load,
    Status,
    Restart,
    Help,
    Quit,
    Action(String),
}

/// Parse a line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<HeadlessCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('#') else {
        return Ok(Some(HeadlessCommand::Action(line.to_string())));
    };

    let parts: Vec<&str> = rest.split_whitespace().collect();
    let command = match parts.first().copied() {
        Some("create") => parse_create(&parts[1..])?,
        Some("party") => parse_party(&parts[1..])?,
        Some("save") => HeadlessCommand::Save,
        Some("load") => HeadlessCommand::Load,
        Some("status") => HeadlessCommand::Status,
        Some("restart") => HeadlessCommand::Restart,
        Some("help") => HeadlessCommand::Help,
        Some("quit") | Some("exit") => HeadlessCommand::Quit,
        _ => return Err("Unknown command. Type #help for help.".to_string()),
    };
    Ok(Some(command))
}

/// `#create <name...> <race> <class> <gender>`; the name may contain spaces.
fn parse_create(args: &[&str]) -> Result<HeadlessCommand, String> {
    const USAGE: &str = "Usage: #create <name> <race> <class> <gender>";
    if args.len() < 4 {
        return Err(USAGE.to_string());
    }
    let (name, choices) = args.split_at(args.len() - 3);
    let race = parse_race(choices[0]).ok_or_else(|| format!("Unknown race: {}", choices[0]))?;
    let class = parse_class(choices[1]).ok_or_else(|| format!("Unknown class: {}", choices[1]))?;
    let gender =
        parse_gender(choices[2]).ok_or_else(|| format!("Unknown gender: {}", choices[2]))?;

    Ok(HeadlessCommand::Create(CharacterRequest::named(
        name.join(" "),
        race,
        class,
        gender,
    )))
}

/// `#party race/class/gender ...`, zero to three companions.
fn parse_party(args: &[&str]) -> Result<HeadlessCommand, String> {
    if args.len() > MAX_COMPANIONS {
        return Err(format!("At most {MAX_COMPANIONS} companions"));
    }
    let companions = args
        .iter()
        .map(|member| {
            let mut fields = member.split('/');
            let (Some(race), Some(class), Some(gender), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(format!("Expected race/class/gender, got {member}"));
            };
            Ok(CharacterRequest::companion(
                parse_race(race).ok_or_else(|| format!("Unknown race: {race}"))?,
                parse_class(class).ok_or_else(|| format!("Unknown class: {class}"))?,
                parse_gender(gender).ok_or_else(|| format!("Unknown gender: {gender}"))?,
            ))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(HeadlessCommand::Party(companions))
}

fn parse_race(s: &str) -> Option<Race> {
    Race::all()
        .iter()
        .copied()
        .find(|race| race.name().eq_ignore_ascii_case(s))
}

fn parse_class(s: &str) -> Option<CharacterClass> {
    CharacterClass::all()
        .iter()
        .copied()
        .find(|class| class.name().eq_ignore_ascii_case(s))
}

fn parse_gender(s: &str) -> Option<Gender> {
    match s.to_lowercase().as_str() {
        "m" => Some(Gender::Male),
        "f" => Some(Gender::Female),
        other => Gender::all()
            .iter()
            .copied()
            .find(|gender| gender.name().eq_ignore_ascii_case(other)),
    }
}

/// Tagged lines for log entries, skipping the leader's own echo.
fn format_entries(entries: &[GameLogEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.is_dm() || entry.is_system())
        .map(|entry| {
            if entry.is_dm() {
                format!("[DM]\n{}\n", entry.message)
            } else {
                format!("[SYSTEM] {}", entry.message)
            }
        })
        .collect()
}

fn status_lines(session: &GameSession) -> Vec<String> {
    let mut lines = vec![
        "[STATUS]".to_string(),
        format!("  Phase: {}", session.phase()),
    ];
    for member in session.party() {
        lines.push(format!(
            "  {} ({}) HP: {}/{} STR {} DEX {} INT {}",
            member.name,
            member.summary_line(),
            member.hp,
            member.max_hp,
            member.strength,
            member.dexterity,
            member.intelligence
        ));
        if !member.inventory.is_empty() {
            lines.push(format!("    Inventory: {}", member.inventory.join(", ")));
        }
    }
    if let Some(reason) = session.game_over_reason() {
        lines.push(format!("  Game over: {reason}"));
    }
    lines
}

const HELP: &[&str] = &[
    "[HELP]",
    "  #create <name> <race> <class> <gender>  - Create the party leader",
    "  #party race/class/gender ...            - Add up to 3 companions and begin",
    "  #save                                   - Save the game",
    "  #load                                   - Load your saved game",
    "  #status                                 - Show the party",
    "  #restart                                - Start over (deletes your save)",
    "  #quit                                   - Exit the game",
    "  (anything else is sent as the leader's action)",
];

/// Run the game in headless mode.
pub async fn run_headless(
    mut session: GameSession,
    store: SaveStore,
    user: &str,
) -> io::Result<()> {
    let mut out = Output::new();

    out.line("=== RPG Headless Mode ===");
    out.line(format!("User: {user}"));
    out.line(format!("Races: {}", names(Race::all())));
    out.line(format!("Classes: {}", names(CharacterClass::all())));
    if store.has_save(user).await {
        out.line("A saved game exists; #load to resume.");
    }
    out.lines(HELP.iter().copied());
    out.line("");
    out.flush().await;

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                out.line(format!("[ERROR] {message}"));
                out.flush().await;
                continue;
            }
        };

        let log_before = session.log().len();
        match command {
            HeadlessCommand::Quit => {
                out.line("Goodbye!");
                out.flush().await;
                break;
            }
            HeadlessCommand::Help => out.lines(HELP.iter().copied()),
            HeadlessCommand::Status => out.lines(status_lines(&session)),
            HeadlessCommand::Create(request) => match session.create_main_character(request).await {
                Ok(leader) => out.line(format!(
                    "[CREATED] {} ({}) HP: {}/{}\n  {}",
                    leader.name,
                    leader.summary_line(),
                    leader.hp,
                    leader.max_hp,
                    leader.backstory
                )),
                Err(e) => out.line(format!("[ERROR] {e}")),
            },
            HeadlessCommand::Party(companions) => match session.finalize_party(companions).await {
                Ok(()) => {
                    out.lines(status_lines(&session));
                    out.lines(format_entries(session.log()));
                }
                Err(e) => out.line(format!("[ERROR] {e}")),
            },
            HeadlessCommand::Save => match session.snapshot() {
                None => out.line("[ERROR] Nothing to save until the adventure starts"),
                Some(saved) => match store.save(user, &saved).await {
                    Ok(()) => out.line("[SAVED]"),
                    Err(e) => out.line(format!("[ERROR] Save failed: {e}")),
                },
            },
            HeadlessCommand::Load => match store.load(user).await {
                Some(saved) => {
                    session.restore(saved);
                    out.line("[LOADED]");
                    out.lines(status_lines(&session));
                }
                None => out.line("[ERROR] No saved game"),
            },
            HeadlessCommand::Restart => {
                session.restart();
                if let Err(e) = store.clear(user).await {
                    out.line(format!("[ERROR] Could not clear save: {e}"));
                }
                out.line("[RESTARTED] #create a new leader");
            }
            HeadlessCommand::Action(action) => {
                if session.phase() != GamePhase::Playing {
                    out.line(format!(
                        "[ERROR] Actions are only possible while playing (now: {})",
                        session.phase()
                    ));
                } else {
                    let outcome = session.player_action(&action).await;
                    out.lines(format_entries(&session.log()[log_before..]));
                    if let TurnOutcome::GameOver { reason } = outcome {
                        out.line(format!("[GAME OVER] {reason}"));
                    }
                }
            }
        }
        out.flush().await;
    }

    Ok(())
}

fn names<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Buffered stdout.
struct Output {
    buffer: String,
    stdout: io::Stdout,
}

impl Output {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            stdout: io::stdout(),
        }
    }

    fn line(&mut self, line: impl AsRef<str>) {
        self.buffer.push_str(line.as_ref());
        self.buffer.push('\n');
    }

    fn lines<S: AsRef<str>>(&mut self, lines: impl IntoIterator<Item = S>) {
        for line in lines {
            self.line(line);
        }
    }

    async fn flush(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        if self.stdout.write_all(buffer.as_bytes()).await.is_ok() {
            self.stdout.flush().await.ok();
        }
    }
}
