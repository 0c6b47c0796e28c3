//! Main application state and logic

use std::collections::VecDeque;

use rpg_core::{
    CharacterClass, CharacterRequest, GamePhase, GameSession, Gender, Race, SaveStore,
    TurnOutcome, MAX_COMPANIONS,
};
use tracing::{info, warn};

use crate::ui::theme::GameTheme;
use crate::ui::Overlay;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - free text input
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// Step `current` by `delta` through `all`, wrapping at both ends.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: isize) -> T {
    let len = all.len() as isize;
    let index = all.iter().position(|item| *item == current).unwrap_or(0) as isize;
    all[(index + delta).rem_euclid(len) as usize]
}

// ============================================================================
// Character creation form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationField {
    #[default]
    Name,
    Race,
    Class,
    Gender,
}

impl CreationField {
    const ORDER: [CreationField; 4] = [
        CreationField::Name,
        CreationField::Race,
        CreationField::Class,
        CreationField::Gender,
    ];
}

/// The party leader's choices.
#[derive(Debug, Clone)]
pub struct CreationForm {
    pub name: String,
    pub race: Race,
    pub class: CharacterClass,
    pub gender: Gender,
    pub field: CreationField,
}

impl Default for CreationForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            race: Race::Human,
            class: CharacterClass::Warrior,
            gender: Gender::Male,
            field: CreationField::Name,
        }
    }
}

impl CreationForm {
    pub fn next_field(&mut self) {
        self.field = cycle(&CreationField::ORDER, self.field, 1);
    }

    pub fn prev_field(&mut self) {
        self.field = cycle(&CreationField::ORDER, self.field, -1);
    }

    /// Change the focused choice. Does nothing on the name field.
    pub fn cycle_choice(&mut self, delta: isize) {
        match self.field {
            CreationField::Name => {}
            CreationField::Race => self.race = cycle(Race::all(), self.race, delta),
            CreationField::Class => self.class = cycle(CharacterClass::all(), self.class, delta),
            CreationField::Gender => self.gender = cycle(Gender::all(), self.gender, delta),
        }
    }

    pub fn request(&self) -> CharacterRequest {
        CharacterRequest::named(self.name.trim(), self.race, self.class, self.gender)
    }
}

// ============================================================================
// Party assembly form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotField {
    #[default]
    Race,
    Class,
    Gender,
}

impl SlotField {
    const ORDER: [SlotField; 3] = [SlotField::Race, SlotField::Class, SlotField::Gender];
}

/// Companion slots; names are left to the game master.
#[derive(Debug, Clone, Default)]
pub struct AssemblyForm {
    pub slots: Vec<CharacterRequest>,
    pub selected: usize,
    pub field: SlotField,
}

impl AssemblyForm {
    /// Add a slot and select it. Returns false when the party is full.
    pub fn add_slot(&mut self) -> bool {
        if self.slots.len() >= MAX_COMPANIONS {
            return false;
        }
        self.slots.push(CharacterRequest::default());
        self.selected = self.slots.len() - 1;
        true
    }

    pub fn remove_selected(&mut self) {
        if self.selected < self.slots.len() {
            self.slots.remove(self.selected);
        }
        self.selected = self.selected.min(self.slots.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        if !self.slots.is_empty() {
            self.selected = (self.selected + 1) % self.slots.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.slots.is_empty() {
            self.selected = (self.selected + self.slots.len() - 1) % self.slots.len();
        }
    }

    pub fn next_field(&mut self) {
        self.field = cycle(&SlotField::ORDER, self.field, 1);
    }

    pub fn cycle_choice(&mut self, delta: isize) {
        let field = self.field;
        let Some(slot) = self.slots.get_mut(self.selected) else {
            return;
        };
        match field {
            SlotField::Race => slot.race = cycle(Race::all(), slot.race, delta),
            SlotField::Class => slot.class = cycle(CharacterClass::all(), slot.class, delta),
            SlotField::Gender => slot.gender = cycle(Gender::all(), slot.gender, delta),
        }
    }
}

// ============================================================================
// Deferred work
// ============================================================================

/// Work that needs the game master or the disk. The main loop awaits it
/// between frames so the status line can say what is happening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTask {
    CreateCharacter(CharacterRequest),
    FinalizeParty(Vec<CharacterRequest>),
    Action(String),
    Save { then_quit: bool },
    Load,
    Restart,
}

impl PendingTask {
    pub fn describe(&self) -> String {
        match self {
            PendingTask::CreateCharacter(request) => format!(
                "Creating {}...",
                request.name.as_deref().unwrap_or("your character")
            ),
            PendingTask::FinalizeParty(companions) if companions.is_empty() => {
                "Setting the scene...".to_string()
            }
            PendingTask::FinalizeParty(_) => "Gathering the party...".to_string(),
            PendingTask::Action(_) => "The game master is thinking...".to_string(),
            PendingTask::Save { .. } => "Saving...".to_string(),
            PendingTask::Load => "Loading...".to_string(),
            PendingTask::Restart => "Restarting...".to_string(),
        }
    }
}

// ============================================================================
// App
// ============================================================================

/// Main application state
pub struct App {
    pub session: GameSession,
    store: SaveStore,
    user: String,
    has_save: bool,

    // UI state
    pub theme: GameTheme,
    overlay: Option<Overlay>,
    pub creation: CreationForm,
    pub assembly: AssemblyForm,

    // Narrative display
    pub narrative_scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,

    pending: Option<PendingTask>,
}

impl App {
    pub fn new(session: GameSession, store: SaveStore, user: impl Into<String>) -> Self {
        Self {
            session,
            store,
            user: user.into(),
            has_save: false,
            theme: GameTheme::default(),
            overlay: None,
            creation: CreationForm::default(),
            assembly: AssemblyForm::default(),
            narrative_scroll: 0,
            scroll_locked_to_bottom: true,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(100),
            history_index: None,
            saved_input: None,
            status_message: None,
            should_quit: false,
            pending: None,
        }
    }

    /// Check the store for a save belonging to this user.
    pub async fn refresh_save_flag(&mut self) {
        self.has_save = self.store.has_save(&self.user).await;
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase()
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn has_save(&self) -> bool {
        self.has_save
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&PendingTask> {
        self.pending.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    fn queue(&mut self, task: PendingTask) {
        self.set_status(task.describe());
        self.pending = Some(task);
    }

    // =========================================================================
    // Screen actions
    // =========================================================================

    pub fn submit_creation(&mut self) {
        if self.creation.name.trim().is_empty() {
            self.set_status("Your character needs a name");
            return;
        }
        self.queue(PendingTask::CreateCharacter(self.creation.request()));
    }

    pub fn submit_party(&mut self) {
        self.queue(PendingTask::FinalizeParty(self.assembly.slots.clone()));
    }

    pub fn request_load(&mut self) {
        if !self.has_save {
            self.set_status("No saved game");
            return;
        }
        self.queue(PendingTask::Load);
    }

    /// Queue the typed action for the game master.
    pub fn submit_action(&mut self) {
        if self.phase() != GamePhase::Playing {
            self.set_status("The adventure is over. :restart to begin anew");
            return;
        }
        if let Some(action) = self.submit_input() {
            if !action.trim().is_empty() {
                self.queue(PendingTask::Action(action));
            }
        }
    }

    /// Run whatever work was queued since the last frame.
    pub async fn run_pending(&mut self) {
        let Some(task) = self.pending.take() else {
            return;
        };

        match task {
            PendingTask::CreateCharacter(request) => {
                match self.session.create_main_character(request).await {
                    Ok(leader) => {
                        let message = format!("{} is ready. Choose up to {MAX_COMPANIONS} companions.", leader.name);
                        self.assembly = AssemblyForm::default();
                        self.set_status(message);
                    }
                    Err(e) => {
                        warn!(error = %e, "Character creation failed");
                        self.set_status(format!("Could not create character: {e}"));
                    }
                }
            }
            PendingTask::FinalizeParty(companions) => {
                match self.session.finalize_party(companions).await {
                    Ok(()) => {
                        self.clear_status();
                        self.input_mode = InputMode::Normal;
                        self.scroll_to_bottom();
                    }
                    Err(e) => {
                        warn!(error = %e, "Party assembly failed");
                        self.set_status(format!("Could not assemble the party: {e}"));
                    }
                }
            }
            PendingTask::Action(action) => {
                match self.session.player_action(&action).await {
                    TurnOutcome::Advanced | TurnOutcome::Ignored => self.clear_status(),
                    TurnOutcome::GameOver { .. } => {
                        self.input_mode = InputMode::Normal;
                        self.set_status("Game over. :restart to begin anew");
                    }
                    TurnOutcome::Failed { .. } => {
                        self.set_status("The game master did not answer. Try again.");
                    }
                }
                self.scroll_to_bottom();
            }
            PendingTask::Save { then_quit } => {
                match self.session.snapshot() {
                    None => self.set_status("Nothing to save until the adventure starts"),
                    Some(saved) => match self.store.save(&self.user, &saved).await {
                        Ok(()) => {
                            self.has_save = true;
                            self.set_status("Game saved!");
                        }
                        Err(e) => {
                            warn!(error = %e, "Save failed");
                            self.set_status(format!("Save failed: {e}"));
                            return;
                        }
                    },
                }
                if then_quit {
                    self.should_quit = true;
                }
            }
            PendingTask::Load => match self.store.load(&self.user).await {
                Some(saved) => {
                    self.session.restore(saved);
                    self.input_mode = InputMode::Normal;
                    self.scroll_to_bottom();
                    self.set_status("Game loaded");
                }
                None => {
                    self.has_save = false;
                    self.set_status("The saved game could not be read and was discarded");
                }
            },
            PendingTask::Restart => {
                self.session.restart();
                self.creation = CreationForm::default();
                self.assembly = AssemblyForm::default();
                self.input_mode = InputMode::Normal;
                self.clear_input();
                if let Err(e) = self.store.clear(&self.user).await {
                    warn!(error = %e, "Could not clear save");
                }
                self.has_save = false;
                info!(user = %self.user, "Restarted");
                self.set_status("A new adventure awaits");
            }
        }
    }

    // =========================================================================
    // Modes and scrolling
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    /// Enter insert mode, unless the adventure is over.
    pub fn enter_insert_mode(&mut self) {
        if self.phase() == GamePhase::GameOver {
            self.set_status("The adventure is over. :restart to begin anew");
            return;
        }
        self.input_mode = InputMode::Insert;
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.input_buffer.clear();
            self.cursor_position = 0;
        }
    }

    /// Scroll narrative to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // The widget caps this to the real maximum
        self.narrative_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.narrative_scroll = 0;
        self.scroll_locked_to_bottom = false;
    }

    /// Rough maximum scroll assuming ~60 columns of text.
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .session
            .log()
            .iter()
            .map(|entry| {
                entry
                    .message
                    .lines()
                    .map(|line| (line.chars().count() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll narrative up (unlocks from bottom)
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.narrative_scroll > max_scroll {
            self.narrative_scroll = max_scroll;
        }
        self.narrative_scroll = self.narrative_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll narrative down
    pub fn scroll_down(&mut self, lines: usize) {
        self.narrative_scroll = self.narrative_scroll.saturating_add(lines);
        let max_scroll = self.estimate_max_scroll();
        self.narrative_scroll = self.narrative_scroll.min(max_scroll + 100);
    }

    // =========================================================================
    // Input editing
    // =========================================================================

    /// Take the current input, recording actions in history.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        if !input.starts_with(':') {
            self.input_history.push_front(input.clone());
            if self.input_history.len() > 100 {
                self.input_history.pop_back();
            }
        }
        self.history_index = None;
        self.saved_input = None;

        Some(input)
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position) {
            self.input_buffer
                .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let idx = match self.history_index {
            None => 0,
            Some(i) if i + 1 < self.input_history.len() => i + 1,
            Some(i) => i,
        };

        if let Some(entry) = self.input_history.get(idx) {
            self.input_buffer = entry.clone();
            self.cursor_position = self.input_buffer.chars().count();
            self.history_index = Some(idx);
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.cursor_position = self.input_buffer.chars().count();
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Process a colon command. Returns whether it was recognised.
    pub fn process_command(&mut self, command: &str) -> bool {
        let cmd = command.trim_start_matches(':');
        let Some(name) = cmd.split_whitespace().next() else {
            return false;
        };

        match name {
            "q" | "quit" | "exit" => {
                self.should_quit = true;
            }
            "w" | "save" => self.queue(PendingTask::Save { then_quit: false }),
            "wq" | "x" => self.queue(PendingTask::Save { then_quit: true }),
            "load" | "e" => self.request_load(),
            "restart" => self.queue(PendingTask::Restart),
            "help" | "h" => self.toggle_help(),
            _ => {
                self.set_status(format!("Unknown command: {name}"));
                return false;
            }
        }
        true
    }

    // =========================================================================
    // Overlays and status
    // =========================================================================

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Set status message (always overwrites)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Set input buffer content and move cursor to end (unicode-safe)
    #[cfg(test)]
    pub fn set_input(&mut self, content: impl Into<String>) {
        self.input_buffer = content.into();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpg_core::{MockMaster, MockTurn};
    use tempfile::TempDir;

    fn test_app(master: MockMaster, dir: &TempDir) -> App {
        App::new(GameSession::new(master), SaveStore::new(dir.path()), "noa")
    }

    async fn playing_app(master: MockMaster, dir: &TempDir) -> App {
        let mut app = test_app(master, dir);
        app.creation.name = "Noa".to_string();
        app.submit_creation();
        app.run_pending().await;
        app.submit_party();
        app.run_pending().await;
        assert_eq!(app.phase(), GamePhase::Playing);
        app
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(cycle(Race::all(), Race::Human, -1), Race::Halfling);
        assert_eq!(cycle(Race::all(), Race::Halfling, 1), Race::Human);
        assert_eq!(cycle(Gender::all(), Gender::Male, 3), Gender::Female);
    }

    #[test]
    fn test_creation_form() {
        let mut form = CreationForm::default();
        form.cycle_choice(1);
        assert_eq!(form.race, Race::Human);

        form.next_field();
        form.cycle_choice(1);
        form.next_field();
        form.cycle_choice(-1);
        assert_eq!(form.race, Race::Elf);
        assert_eq!(form.class, CharacterClass::Cleric);

        form.name = "  Noa ".to_string();
        assert_eq!(form.request().name.as_deref(), Some("Noa"));

        form.prev_field();
        form.prev_field();
        assert_eq!(form.field, CreationField::Name);
    }

    #[test]
    fn test_assembly_slots() {
        let mut form = AssemblyForm::default();
        form.cycle_choice(1);
        assert!(form.slots.is_empty());

        for _ in 0..MAX_COMPANIONS {
            assert!(form.add_slot());
        }
        assert!(!form.add_slot());
        assert_eq!(form.selected, 2);

        form.cycle_choice(1);
        assert_eq!(form.slots[2].race, Race::Elf);

        form.select_next();
        assert_eq!(form.selected, 0);
        form.select_prev();
        assert_eq!(form.selected, 2);

        form.remove_selected();
        assert_eq!(form.slots.len(), 2);
        assert_eq!(form.selected, 1);
    }

    #[test]
    fn test_unicode_input_editing() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);

        for c in "שלום".chars() {
            app.type_char(c);
        }
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input_buffer(), "שלם");
        app.cursor_home();
        app.delete();
        assert_eq!(app.input_buffer(), "לם");
    }

    #[test]
    fn test_history_navigation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);

        app.set_input("first");
        app.submit_input();
        app.set_input("second");
        app.submit_input();
        app.set_input("draft");

        app.history_prev();
        assert_eq!(app.input_buffer(), "second");
        app.history_prev();
        assert_eq!(app.input_buffer(), "first");
        app.history_prev();
        assert_eq!(app.input_buffer(), "first");
        app.history_next();
        app.history_next();
        assert_eq!(app.input_buffer(), "draft");
    }

    #[test]
    fn test_commands_are_not_history() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);
        app.set_input(":w");
        app.submit_input();
        assert!(app.input_history.is_empty());
    }

    #[test]
    fn test_process_command() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);

        assert!(app.process_command(":help"));
        assert!(app.has_overlay());

        assert!(app.process_command(":w"));
        assert_eq!(app.pending(), Some(&PendingTask::Save { then_quit: false }));

        assert!(!app.process_command(":fly"));
        assert_eq!(app.status_message(), Some("Unknown command: fly"));

        assert!(app.process_command(":q"));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_creation_requires_name() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);

        app.submit_creation();
        assert!(!app.is_busy());
        assert_eq!(app.phase(), GamePhase::CharacterCreation);
    }

    #[tokio::test]
    async fn test_play_turn() {
        let dir = TempDir::new().unwrap();
        let master = MockMaster::new().with_turn(MockTurn::narrate("A door creaks.").with_hp("Noa", 7));
        let mut app = playing_app(master, &dir).await;

        app.enter_insert_mode();
        app.set_input("Open the door");
        app.submit_action();
        assert_eq!(
            app.pending(),
            Some(&PendingTask::Action("Open the door".to_string()))
        );
        app.run_pending().await;

        assert_eq!(app.session.party()[0].hp, 7);
        assert_eq!(app.session.log().last().map(|e| e.message.as_str()), Some("A door creaks."));
        assert!(app.scroll_locked_to_bottom);
    }

    #[tokio::test]
    async fn test_failed_turn_sets_status() {
        let dir = TempDir::new().unwrap();
        let master = MockMaster::new().with_turn(MockTurn::fail("offline"));
        let mut app = playing_app(master, &dir).await;

        app.set_input("Wait");
        app.submit_action();
        app.run_pending().await;

        assert_eq!(app.phase(), GamePhase::Playing);
        assert!(app.session.log().last().is_some_and(|e| e.is_system()));
        assert!(app.status_message().is_some());
    }

    #[tokio::test]
    async fn test_save_load_and_restart() {
        let dir = TempDir::new().unwrap();
        let mut app = playing_app(MockMaster::new(), &dir).await;

        app.process_command(":w");
        app.run_pending().await;
        assert!(app.has_save());

        let mut fresh = test_app(MockMaster::new(), &dir);
        fresh.refresh_save_flag().await;
        assert!(fresh.has_save());
        fresh.request_load();
        fresh.run_pending().await;
        assert_eq!(fresh.phase(), GamePhase::Playing);
        assert_eq!(fresh.session.log(), app.session.log());

        fresh.process_command(":restart");
        fresh.run_pending().await;
        assert_eq!(fresh.phase(), GamePhase::CharacterCreation);
        assert!(!fresh.has_save());

        app.refresh_save_flag().await;
        assert!(!app.has_save());
    }

    #[tokio::test]
    async fn test_save_before_adventure() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);

        app.process_command(":wq");
        app.run_pending().await;
        assert!(!app.has_save());
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_insert_blocked_after_game_over() {
        let dir = TempDir::new().unwrap();
        let master = MockMaster::new().with_turn(MockTurn::narrate("Fin.").game_over(None));
        let mut app = playing_app(master, &dir).await;

        app.set_input("Jump");
        app.submit_action();
        app.run_pending().await;
        assert_eq!(app.phase(), GamePhase::GameOver);

        app.enter_insert_mode();
        assert_eq!(app.input_mode, InputMode::Normal);
    }
}
