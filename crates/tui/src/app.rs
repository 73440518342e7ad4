use std::{cmp, collections::BTreeSet, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gully_core::{
    balance::{self, BalancedTeams, Captains},
    config::AppConfig,
    error::ValidationError,
    innings::{InningsState, Outcome},
    matchflow::{MatchFlow, MatchReport, Stage},
    models::{format_rating, Player, PlayerId, TeamSide},
    roster::PlayerRegistry,
    save::{MatchRecord, Store},
    summary::InningsSummary,
};
use rand::Rng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 32;
const DEFAULT_PROMPT_RATING: &str = "5";
const MENU_ITEMS: [&str; 4] = ["New Match", "Players", "History", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Players,
    Setup,
    Scoring,
    Summary,
    History,
}

/// Stages of the add-player prompt.
#[derive(Debug, Clone, PartialEq)]
enum PromptStep {
    Name,
    Batting { name: String },
    Bowling { name: String, batting: f64 },
}

#[derive(Debug, Clone)]
struct TextPrompt {
    step: PromptStep,
    input: String,
    cursor: usize,
}

impl TextPrompt {
    fn new(step: PromptStep, initial: &str) -> Self {
        Self {
            step,
            input: initial.to_string(),
            cursor: initial.len(),
        }
    }

    fn title(&self) -> &'static str {
        match self.step {
            PromptStep::Name => "New Player",
            PromptStep::Batting { .. } => "Batting Rating",
            PromptStep::Bowling { .. } => "Bowling Rating",
        }
    }

    fn instruction(&self) -> String {
        match &self.step {
            PromptStep::Name => "Player name".to_string(),
            PromptStep::Batting { name } => format!("Batting rating for {name} (1-10)"),
            PromptStep::Bowling { name, .. } => format!("Bowling rating for {name} (1-10)"),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_INPUT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn value(&self) -> &str {
        self.input.trim()
    }
}

struct SetupState {
    pool: Vec<Player>,
    cursor: usize,
    captains: Captains,
    teams: Option<BalancedTeams>,
    toss_winner: Option<TeamSide>,
}

impl SetupState {
    fn new(pool: Vec<Player>) -> Self {
        Self {
            pool,
            cursor: 0,
            captains: Captains::default(),
            teams: None,
            toss_winner: None,
        }
    }

    fn player_at_cursor(&self) -> Option<&Player> {
        self.pool.get(self.cursor)
    }

    fn captain_name(&self, id: Option<PlayerId>) -> String {
        id.and_then(|id| self.pool.iter().find(|p| p.id == id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "-".to_string())
    }
}

struct ScoringState {
    flow: MatchFlow,
    bowler_cursor: usize,
    batsman_cursor: usize,
    this_over: Vec<Outcome>,
    confirm_abandon: bool,
}

impl ScoringState {
    fn new(flow: MatchFlow) -> Self {
        Self {
            flow,
            bowler_cursor: 0,
            batsman_cursor: 0,
            this_over: Vec::new(),
            confirm_abandon: false,
        }
    }

    fn current_bowler(&self) -> Option<&Player> {
        let players = &self.flow.innings()?.bowling_team.players;
        players.get(self.bowler_cursor % players.len().max(1))
    }

    fn cycle_bowler(&mut self, delta: isize) {
        let Some(innings) = self.flow.innings() else {
            return;
        };
        let total = innings.bowling_team.players.len();
        if total == 0 {
            return;
        }
        let next = (self.bowler_cursor as isize + delta).rem_euclid(total as isize);
        self.bowler_cursor = next as usize;
    }

    fn reset_for_new_innings(&mut self) {
        self.bowler_cursor = 0;
        self.batsman_cursor = 0;
        self.this_over.clear();
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end for the scorer.
pub struct GullyApp {
    config: AppConfig,
    registry: PlayerRegistry,
    store: Store,
    state: UiState,
    screen: Screen,
    theme: Theme,
    prompt: Option<TextPrompt>,
    setup: Option<SetupState>,
    scoring: Option<ScoringState>,
    report: Option<MatchReport>,
    history: Vec<MatchRecord>,
}

impl GullyApp {
    pub fn new(config: AppConfig, registry: PlayerRegistry, store: Store) -> Self {
        Self {
            config,
            registry,
            store,
            state: UiState::default(),
            screen: Screen::Menu,
            theme: Theme::default(),
            prompt: None,
            setup: None,
            scoring: None,
            report: None,
            history: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "{} players registered, {} overs per innings",
            self.registry.len(),
            self.config.overs_per_innings
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        info!("Scorer closed");
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                let result = if self.prompt.is_some() {
                    match event {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_prompt_key(key)
                        }
                        _ => Ok(()),
                    }
                } else {
                    self.handle_input(event)
                };
                if let Err(err) = result {
                    warn!("Action rejected: {err:#}");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Players => self.handle_players_key(key),
            Screen::Setup => self.handle_setup_key(key),
            Screen::Scoring => self.handle_scoring_key(key),
            Screen::Summary => self.handle_summary_key(key),
            Screen::History => self.handle_history_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.menu_cursor = step_cursor(self.state.menu_cursor, 1, MENU_ITEMS.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.menu_cursor =
                    step_cursor(self.state.menu_cursor, -1, MENU_ITEMS.len());
            }
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    self.screen = Screen::Players;
                    self.state
                        .set_status("Pick the players for this match, then press Enter".to_string());
                }
                1 => {
                    self.screen = Screen::Players;
                    self.state
                        .set_status("n add  x remove  Space select".to_string());
                }
                2 => self.open_history(),
                _ => {
                    self.state.should_quit = true;
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_players_key(&mut self, key: KeyEvent) -> Result<()> {
        let players = self.registry.players();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.player_cursor = step_cursor(self.state.player_cursor, 1, players.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.player_cursor =
                    step_cursor(self.state.player_cursor, -1, players.len());
            }
            KeyCode::Char(' ') => {
                if let Some(player) = players.get(self.state.player_cursor) {
                    self.state.toggle_selected(player.id);
                }
            }
            KeyCode::Char('a') => {
                self.state.selected = players.iter().map(|p| p.id).collect();
                self.state
                    .set_status(format!("Selected all {} players", players.len()));
            }
            KeyCode::Char('c') => {
                self.state.selected.clear();
                self.state.set_status("Selection cleared".to_string());
            }
            KeyCode::Char('n') => {
                self.prompt = Some(TextPrompt::new(PromptStep::Name, ""));
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(player) = players.get(self.state.player_cursor) {
                    if let Some(removed) = self.registry.remove_player(player.id) {
                        self.state.selected.remove(&removed.id);
                        self.state.player_cursor = self
                            .state
                            .player_cursor
                            .min(self.registry.len().saturating_sub(1));
                        self.persist_players();
                        self.state.set_status(format!("Removed {}", removed.name));
                    }
                }
            }
            KeyCode::Enter => self.begin_setup(&players)?,
            _ => {}
        }
        Ok(())
    }

    fn begin_setup(&mut self, players: &[Player]) -> Result<()> {
        let ids: Vec<PlayerId> = players
            .iter()
            .filter(|p| self.state.selected.contains(&p.id))
            .map(|p| p.id)
            .collect();
        if ids.len() < 2 {
            return Err(ValidationError::TooFewPlayers { found: ids.len() }.into());
        }
        let pool = self.registry.pool(&ids)?;
        info!(players = pool.len(), "Match setup started");
        self.setup = Some(SetupState::new(pool));
        self.screen = Screen::Setup;
        self.state.set_status(
            "Move to a player and press a or b to choose captains, Enter to make teams".to_string(),
        );
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut prompt) = self.prompt.take() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.state.set_status("New player cancelled".to_string());
                return Ok(());
            }
            KeyCode::Enter => return self.advance_prompt(prompt),
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.move_home(),
            KeyCode::End => prompt.move_end(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
        self.prompt = Some(prompt);
        Ok(())
    }

    fn advance_prompt(&mut self, prompt: TextPrompt) -> Result<()> {
        let value = prompt.value().to_string();
        match prompt.step.clone() {
            PromptStep::Name => {
                if value.is_empty() {
                    self.prompt = Some(prompt);
                    return Err(ValidationError::EmptyName.into());
                }
                self.prompt = Some(TextPrompt::new(
                    PromptStep::Batting { name: value },
                    DEFAULT_PROMPT_RATING,
                ));
            }
            PromptStep::Batting { name } => match parse_rating(&value) {
                Some(batting) => {
                    self.prompt = Some(TextPrompt::new(
                        PromptStep::Bowling { name, batting },
                        DEFAULT_PROMPT_RATING,
                    ));
                }
                None => {
                    self.prompt = Some(prompt);
                    self.state
                        .set_status(format!("'{value}' is not a rating between 1 and 10"));
                }
            },
            PromptStep::Bowling { name, batting } => match parse_rating(&value) {
                Some(bowling) => {
                    let player = self.registry.add_player(&name, batting, bowling)?;
                    self.state.player_cursor = self.registry.len().saturating_sub(1);
                    self.persist_players();
                    self.state
                        .set_status(format!("Added {} ({})", player.name, player.rating_label()));
                }
                None => {
                    self.prompt = Some(prompt);
                    self.state
                        .set_status(format!("'{value}' is not a rating between 1 and 10"));
                }
            },
        }
        Ok(())
    }

    fn persist_players(&mut self) {
        if let Err(err) = self.store.save_players(&self.registry.players()) {
            error!(?err, "Failed to save players");
            self.state.set_status(format!("Failed to save players: {err}"));
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut setup) = self.setup.take() else {
            self.screen = Screen::Players;
            return Ok(());
        };
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            self.screen = Screen::Players;
            self.state.set_status("Match setup cancelled".to_string());
            return Ok(());
        }
        let result = self.apply_setup_key(&mut setup, key);
        if self.screen == Screen::Setup {
            self.setup = Some(setup);
        }
        result
    }

    fn apply_setup_key(&mut self, setup: &mut SetupState, key: KeyEvent) -> Result<()> {
        match (&setup.teams, setup.toss_winner) {
            (None, _) => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    setup.cursor = step_cursor(setup.cursor, 1, setup.pool.len());
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    setup.cursor = step_cursor(setup.cursor, -1, setup.pool.len());
                }
                KeyCode::Char('a') => {
                    if let Some(id) = setup.player_at_cursor().map(|p| p.id) {
                        if setup.captains.b == Some(id) {
                            setup.captains.b = None;
                        }
                        setup.captains.a = Some(id);
                    }
                }
                KeyCode::Char('b') => {
                    if let Some(id) = setup.player_at_cursor().map(|p| p.id) {
                        if setup.captains.a == Some(id) {
                            setup.captains.a = None;
                        }
                        setup.captains.b = Some(id);
                    }
                }
                KeyCode::Enter => {
                    let teams = balance::balance(
                        &setup.pool,
                        &self.config.team_a_name,
                        &self.config.team_b_name,
                        setup.captains,
                    )?;
                    self.state.set_status(format!(
                        "Teams ready, rating gap {}. Press t to toss, r to pick again",
                        format_rating(teams.rating_gap())
                    ));
                    setup.teams = Some(teams);
                }
                _ => {}
            },
            (Some(teams), None) => match key.code {
                KeyCode::Char('t') => {
                    let winner = if rand::thread_rng().gen_bool(0.5) {
                        TeamSide::A
                    } else {
                        TeamSide::B
                    };
                    let name = teams.team(winner).name.clone();
                    info!(winner = %name, "Toss decided");
                    self.state.set_status(format!(
                        "{name} won the toss. Press 1 to bat first or 2 to bowl first"
                    ));
                    setup.toss_winner = Some(winner);
                }
                KeyCode::Char('r') => {
                    setup.teams = None;
                    self.state.set_status("Pick captains again".to_string());
                }
                _ => {}
            },
            (Some(teams), Some(winner)) => {
                let batting_first = match key.code {
                    KeyCode::Char('1') => winner,
                    KeyCode::Char('2') => winner.other(),
                    KeyCode::Char('r') => {
                        setup.teams = None;
                        setup.toss_winner = None;
                        self.state.set_status("Pick captains again".to_string());
                        return Ok(());
                    }
                    _ => return Ok(()),
                };
                let mut flow = MatchFlow::new(teams.clone(), self.config.overs_per_innings);
                flow.start(batting_first)?;
                let batting = teams.team(batting_first).name.clone();
                self.scoring = Some(ScoringState::new(flow));
                self.screen = Screen::Scoring;
                self.state.set_status(format!("{batting} to bat. Play!"));
            }
        }
        Ok(())
    }

    fn handle_scoring_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(mut scoring) = self.scoring.take() else {
            self.screen = Screen::Menu;
            return Ok(());
        };
        if key.code == KeyCode::Esc {
            if scoring.confirm_abandon {
                info!("Match abandoned");
                self.screen = Screen::Menu;
                self.state.set_status("Match abandoned".to_string());
                return Ok(());
            }
            scoring.confirm_abandon = true;
            self.state
                .set_status("Press Esc again to abandon the match".to_string());
            self.scoring = Some(scoring);
            return Ok(());
        }
        scoring.confirm_abandon = false;

        let result = self.apply_scoring_key(&mut scoring, key);
        if scoring.flow.stage() == Stage::Complete {
            if let Err(err) = self.finish_match(&scoring.flow) {
                self.screen = Screen::Menu;
                return Err(err);
            }
        } else {
            self.scoring = Some(scoring);
        }
        result
    }

    fn apply_scoring_key(&mut self, scoring: &mut ScoringState, key: KeyEvent) -> Result<()> {
        let Some(innings) = scoring.flow.innings() else {
            return Ok(());
        };
        let ended = innings.is_ended();
        let needs_batsman = innings.needs_batsman();
        let available = innings.available_batsmen();
        let non_striker = innings.non_striker_index;
        let overs_before = innings.overs;

        if ended {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char('e')) {
                self.close_innings(scoring)?;
            }
            return Ok(());
        }

        if needs_batsman {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    scoring.batsman_cursor = step_cursor(scoring.batsman_cursor, 1, available.len());
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    scoring.batsman_cursor =
                        step_cursor(scoring.batsman_cursor, -1, available.len());
                }
                KeyCode::Enter => {
                    if let Some(&index) = available.get(scoring.batsman_cursor) {
                        scoring.flow.select_batsman(index)?;
                        scoring.batsman_cursor = 0;
                        let name = scoring
                            .flow
                            .innings()
                            .and_then(|s| s.batsmen.get(index))
                            .map(|b| b.name.clone())
                            .unwrap_or_default();
                        self.state.set_status(format!("{name} comes in"));
                    }
                }
                KeyCode::Char('e') => self.close_innings(scoring)?,
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => scoring.cycle_bowler(1),
            KeyCode::BackTab => scoring.cycle_bowler(-1),
            KeyCode::Char(ch) => {
                if let Some(outcome) = outcome_for_key(ch) {
                    let bowler_id = scoring
                        .current_bowler()
                        .map(|p| p.id)
                        .context("the bowling side has no players")?;
                    scoring.flow.record_ball(outcome, bowler_id)?;
                    scoring.this_over.push(outcome);
                    self.after_delivery(scoring, overs_before, format!("{outcome} recorded"));
                    return Ok(());
                }
                match ch {
                    's' => {
                        if let Some(index) = non_striker {
                            scoring.flow.select_batsman(index)?;
                            self.state.set_status("Strike changed".to_string());
                        }
                    }
                    'o' => {
                        scoring.flow.end_over()?;
                        self.after_delivery(
                            scoring,
                            overs_before,
                            "The over has not started yet".to_string(),
                        );
                    }
                    'e' => self.close_innings(scoring)?,
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn after_delivery(&mut self, scoring: &mut ScoringState, overs_before: u32, note: String) {
        let Some(innings) = scoring.flow.innings() else {
            return;
        };
        if let Some(reason) = innings.end_reason() {
            self.state.set_status(format!(
                "Innings over ({reason}) at {}/{}. Press e to continue",
                innings.total_runs, innings.wickets
            ));
        } else if innings.overs > overs_before {
            let bowlers = innings.bowling_team.players.len().max(1);
            scoring.bowler_cursor = (scoring.bowler_cursor + 1) % bowlers;
            let next = innings
                .bowling_team
                .players
                .get(scoring.bowler_cursor)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            scoring.this_over.clear();
            self.state
                .set_status(format!("End of over {}. {next} to bowl", innings.overs));
        } else if innings.needs_batsman() {
            self.state
                .set_status("Wicket! Choose the next batsman".to_string());
        } else {
            self.state.set_status(note);
        }
    }

    fn close_innings(&mut self, scoring: &mut ScoringState) -> Result<()> {
        scoring.flow.end_innings()?;
        scoring.reset_for_new_innings();
        if scoring.flow.stage() == Stage::SecondInnings {
            if let Some(innings) = scoring.flow.innings() {
                let target = innings.target.unwrap_or_default();
                self.state.set_status(format!(
                    "{} need {target} to win from {} overs",
                    innings.batting_team.name, innings.max_overs
                ));
            }
        }
        Ok(())
    }

    fn finish_match(&mut self, flow: &MatchFlow) -> Result<()> {
        let players = self.registry.players();
        let report = flow.finalize(&players)?;
        self.registry.replace_all(report.updated_players.clone());
        let saved = self.persist_report(&report);
        let result_text = report.result.text.clone();
        self.report = Some(report);
        self.screen = Screen::Summary;
        match saved {
            Ok(()) => self
                .state
                .set_status(format!("{result_text}. Ratings updated and match saved")),
            Err(err) => {
                error!(?err, "Failed to save finished match");
                self.state
                    .set_status(format!("{result_text}. Saving failed: {err}"));
            }
        }
        Ok(())
    }

    fn persist_report(&self, report: &MatchReport) -> Result<()> {
        self.store.save_players(&report.updated_players)?;
        self.store.record_match(&report.record)?;
        Ok(())
    }

    fn handle_summary_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
            }
            KeyCode::Char('h') => self.open_history(),
            _ => {}
        }
        Ok(())
    }

    fn open_history(&mut self) {
        self.history = self.store.match_history();
        self.state.history_cursor = 0;
        self.screen = Screen::History;
        if self.history.is_empty() {
            self.state.set_status("No matches recorded yet".to_string());
        } else {
            self.state
                .set_status(format!("{} matches recorded", self.history.len()));
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.screen = Screen::Menu;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.history_cursor =
                    step_cursor(self.state.history_cursor, 1, self.history.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.history_cursor =
                    step_cursor(self.state.history_cursor, -1, self.history.len());
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Players => self.draw_players(frame),
            Screen::Setup => self.draw_setup(frame),
            Screen::Scoring => self.draw_scoring(frame),
            Screen::Summary => self.draw_summary(frame),
            Screen::History => self.draw_history(frame),
        }
        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn draw_menu(&self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5_u16.min(area.height)),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let banner = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "G U L L Y   C R I C K E T",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "team balancer and ball-by-ball scorer",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(banner, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_width = 28_u16.min(layout[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
        self.render_status(frame, layout[2]);
    }

    fn draw_players(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);

        let players = self.registry.players();
        self.state.player_cursor = self
            .state
            .player_cursor
            .min(players.len().saturating_sub(1));

        let items: Vec<ListItem> = if players.is_empty() {
            vec![ListItem::new(Line::from("  No players. Press n to add one"))]
        } else {
            players
                .iter()
                .map(|player| {
                    let selected = self.state.selected.contains(&player.id);
                    let marker = if selected {
                        Span::styled("[x] ", Style::default().fg(self.theme.success))
                    } else {
                        Span::styled("[ ] ", Style::default().fg(self.theme.muted))
                    };
                    ListItem::new(Line::from(vec![
                        marker,
                        Span::styled(
                            format!("{:<14}", player.name),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::raw(player.rating_label()),
                    ]))
                })
                .collect()
        };
        let mut list_state = ListState::default();
        if !players.is_empty() {
            list_state.select(Some(self.state.player_cursor));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Players"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, body[0], &mut list_state);

        let chosen: Vec<&Player> = players
            .iter()
            .filter(|p| self.state.selected.contains(&p.id))
            .collect();
        let pool_rating: f64 = chosen.iter().map(|p| p.total_rating).sum();
        let mut lines = vec![
            Line::from(format!("Selected: {} of {}", chosen.len(), players.len())),
            Line::from(format!("Pool rating: {}", format_rating(pool_rating))),
            Line::from(""),
        ];
        for (keys, action) in [
            ("Space", "toggle player"),
            ("a / c", "select all / clear"),
            ("n", "add player"),
            ("x", "remove player"),
            ("Enter", "continue to match setup"),
            ("Esc", "back to menu"),
        ] {
            lines.push(key_hint(&self.theme, keys, action));
        }
        let side = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Selection"))
            .wrap(Wrap { trim: true });
        frame.render_widget(side, body[1]);
        self.render_status(frame, rows[1]);
    }

    fn draw_setup(&self, frame: &mut Frame) {
        let area = frame.size();
        let Some(setup) = self.setup.as_ref() else {
            self.draw_placeholder(frame, "Match Setup", "No players selected");
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);

        let items: Vec<ListItem> = setup
            .pool
            .iter()
            .map(|player| {
                let tag = if setup.captains.a == Some(player.id) {
                    Span::styled("(A) ", Style::default().fg(self.theme.accent))
                } else if setup.captains.b == Some(player.id) {
                    Span::styled("(B) ", Style::default().fg(self.theme.warning))
                } else {
                    Span::raw("    ")
                };
                ListItem::new(Line::from(vec![
                    tag,
                    Span::raw(format!(
                        "{:<14} {}",
                        player.name,
                        format_rating(player.total_rating)
                    )),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        if setup.teams.is_none() && !setup.pool.is_empty() {
            list_state.select(Some(setup.cursor.min(setup.pool.len() - 1)));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Pool"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, body[0], &mut list_state);

        let mut lines = Vec::new();
        match &setup.teams {
            None => {
                lines.push(Line::from(format!(
                    "Captain A: {}",
                    setup.captain_name(setup.captains.a)
                )));
                lines.push(Line::from(format!(
                    "Captain B: {}",
                    setup.captain_name(setup.captains.b)
                )));
                lines.push(Line::from(""));
                lines.push(key_hint(&self.theme, "a / b", "make captain of team A / B"));
                lines.push(key_hint(&self.theme, "Enter", "balance teams"));
                lines.push(key_hint(&self.theme, "Esc", "back to players"));
            }
            Some(teams) => {
                for side in [TeamSide::A, TeamSide::B] {
                    let team = teams.team(side);
                    lines.push(Line::from(Span::styled(
                        format!(
                            "{}  (bat {} · bowl {} · total {})",
                            team.name,
                            format_rating(team.total_batting_rating),
                            format_rating(team.total_bowling_rating),
                            format_rating(team.total_rating)
                        ),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )));
                    for (idx, player) in team.players.iter().enumerate() {
                        let role = if idx == 0 { " (c)" } else { "" };
                        lines.push(Line::from(format!("  {}{role}", player.name)));
                    }
                    lines.push(Line::from(""));
                }
                if let Some(common) = &teams.common_player {
                    lines.push(Line::from(format!(
                        "Common player: {} fields for both sides",
                        common.name
                    )));
                }
                match setup.toss_winner {
                    None => {
                        lines.push(key_hint(&self.theme, "t", "toss"));
                        lines.push(key_hint(&self.theme, "r", "pick captains again"));
                    }
                    Some(winner) => {
                        lines.push(Line::from(Span::styled(
                            format!("{} won the toss", teams.team(winner).name),
                            Style::default().fg(self.theme.success),
                        )));
                        lines.push(key_hint(&self.theme, "1", "bat first"));
                        lines.push(key_hint(&self.theme, "2", "bowl first"));
                    }
                }
            }
        }
        let panel = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Teams"))
            .wrap(Wrap { trim: false });
        frame.render_widget(panel, body[1]);
        self.render_status(frame, rows[1]);
    }

    fn draw_scoring(&self, frame: &mut Frame) {
        let area = frame.size();
        let Some(scoring) = self.scoring.as_ref() else {
            self.draw_placeholder(frame, "Scoring", "No match in progress");
            return;
        };
        let Some(innings) = scoring.flow.innings() else {
            self.draw_placeholder(frame, "Scoring", "Waiting for the toss");
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(4)])
            .split(body[1]);

        self.render_score_bar(frame, rows[0], scoring, innings);
        self.render_batting_card(frame, body[0], innings);
        self.render_bowler_panel(frame, right[0], scoring);
        self.render_bowling_card(frame, right[1], scoring, innings);
        self.render_scoring_help(frame, rows[2], innings);
        self.render_status(frame, rows[3]);

        if innings.needs_batsman() {
            self.render_batsman_picker(frame, area, scoring, innings);
        }
    }

    fn render_score_bar(
        &self,
        frame: &mut Frame,
        area: Rect,
        scoring: &ScoringState,
        innings: &InningsState,
    ) {
        let label = match scoring.flow.stage() {
            Stage::SecondInnings | Stage::Complete => "Second innings",
            _ => "First innings",
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!(
                    "{} {}/{}",
                    innings.batting_team.name, innings.total_runs, innings.wickets
                ),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  ({} / {} ov)  extras {}",
                innings.overs_display(),
                innings.max_overs,
                innings.extras
            )),
        ])];

        match (innings.runs_required(), innings.required_run_rate()) {
            (Some(required), Some(rate)) => lines.push(Line::from(format!(
                "Target {}: need {required} off {} balls  RRR {rate:.2}",
                innings.target.unwrap_or_default(),
                innings.balls_remaining()
            ))),
            _ => lines.push(Line::from(format!(
                "CRR {:.2}",
                innings.current_run_rate()
            ))),
        }
        if let Some(first) = scoring.flow.first_innings() {
            lines.push(Line::from(Span::styled(
                format!("{} made {}", first.batting_team_name, first.score_line()),
                Style::default().fg(self.theme.muted),
            )));
        }

        let mut over_spans = vec![Span::raw("This over: ")];
        for outcome in &scoring.this_over {
            let colour = match outcome {
                Outcome::Wicket => self.theme.danger,
                Outcome::Wide | Outcome::NoBall => self.theme.warning,
                Outcome::Runs(4) | Outcome::Runs(6) => self.theme.success,
                Outcome::Runs(_) => self.theme.primary_fg,
            };
            over_spans.push(Span::styled(format!("{outcome} "), Style::default().fg(colour)));
        }
        lines.push(Line::from(over_spans));

        let block = Block::default().borders(Borders::ALL).title(label);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_batting_card(&self, frame: &mut Frame, area: Rect, innings: &InningsState) {
        let header = Row::new(vec!["Batter", "R", "B", "4s", "6s", "SR"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = innings
            .batsmen
            .iter()
            .enumerate()
            .map(|(idx, stat)| {
                let (marker, style) = if Some(idx) == innings.current_batsman_index {
                    ("▶ ", Style::default().fg(self.theme.accent))
                } else if Some(idx) == innings.non_striker_index {
                    ("• ", Style::default().fg(self.theme.primary_fg))
                } else if stat.out {
                    ("  ", Style::default().fg(self.theme.muted))
                } else {
                    ("  ", Style::default())
                };
                let name = if stat.out {
                    format!("{marker}{} (out)", stat.name)
                } else {
                    format!("{marker}{}", stat.name)
                };
                Row::new(vec![
                    Cell::from(name),
                    Cell::from(stat.runs.to_string()),
                    Cell::from(stat.balls_faced.to_string()),
                    Cell::from(stat.fours.to_string()),
                    Cell::from(stat.sixes.to_string()),
                    Cell::from(format!("{:.1}", stat.strike_rate())),
                ])
                .style(style)
            })
            .collect();
        let widths = [
            Constraint::Min(14),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} batting", innings.batting_team.name)),
        );
        frame.render_widget(table, area);
    }

    fn render_bowler_panel(&self, frame: &mut Frame, area: Rect, scoring: &ScoringState) {
        let line = match scoring.current_bowler() {
            Some(bowler) => Line::from(vec![
                Span::raw("Bowling: "),
                Span::styled(
                    bowler.name.clone(),
                    Style::default()
                        .fg(self.theme.accent_alt)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("  (Tab to change)", Style::default().fg(self.theme.muted)),
            ]),
            None => Line::from("No bowler available"),
        };
        let panel =
            Paragraph::new(vec![line]).block(Block::default().borders(Borders::ALL).title("Bowler"));
        frame.render_widget(panel, area);
    }

    fn render_bowling_card(
        &self,
        frame: &mut Frame,
        area: Rect,
        scoring: &ScoringState,
        innings: &InningsState,
    ) {
        let current = scoring.current_bowler().map(|p| p.id);
        let header = Row::new(vec!["Bowler", "O", "R", "W", "Econ"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = innings
            .bowlers
            .values()
            .map(|stat| {
                let style = if Some(stat.player_id) == current {
                    Style::default().fg(self.theme.accent_alt)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(stat.name.clone()),
                    Cell::from(stat.overs_display()),
                    Cell::from(stat.runs_conceded.to_string()),
                    Cell::from(stat.wickets.to_string()),
                    Cell::from(format!("{:.2}", stat.economy())),
                ])
                .style(style)
            })
            .collect();
        let widths = [
            Constraint::Min(12),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} bowling", innings.bowling_team.name)),
        );
        frame.render_widget(table, area);
    }

    fn render_scoring_help(&self, frame: &mut Frame, area: Rect, innings: &InningsState) {
        let hints: &[(&str, &str)] = if innings.is_ended() {
            &[("Enter", "continue"), ("Esc Esc", "abandon")]
        } else if innings.needs_batsman() {
            &[("↑/↓", "choose"), ("Enter", "send in"), ("e", "end innings")]
        } else {
            &[
                ("0-6", "runs"),
                ("w", "wicket"),
                ("d", "wide"),
                ("n", "no-ball"),
                ("Tab", "bowler"),
                ("s", "swap strike"),
                ("o", "end over"),
                ("e", "end innings"),
            ]
        };
        let mut spans = Vec::new();
        for (keys, action) in hints {
            spans.push(Span::styled(
                (*keys).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(" {action}  ")));
        }
        let help = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Keys"))
            .wrap(Wrap { trim: true });
        frame.render_widget(help, area);
    }

    fn render_batsman_picker(
        &self,
        frame: &mut Frame,
        area: Rect,
        scoring: &ScoringState,
        innings: &InningsState,
    ) {
        let available = innings.available_batsmen();
        let height = (available.len() as u16 + 2).clamp(3, area.height.saturating_sub(2).max(3));
        let modal = centered_rect(36, height, area);
        frame.render_widget(Clear, modal);

        let items: Vec<ListItem> = available
            .iter()
            .filter_map(|&index| innings.batsmen.get(index))
            .map(|stat| ListItem::new(Line::from(format!("  {}", stat.name))))
            .collect();
        let mut list_state = ListState::default();
        if !available.is_empty() {
            list_state.select(Some(scoring.batsman_cursor.min(available.len() - 1)));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Next batsman"),
            )
            .highlight_style(
                Style::default()
                    .bg(self.theme.selection_bg)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_stateful_widget(list, modal, &mut list_state);
    }

    fn draw_summary(&self, frame: &mut Frame) {
        let area = frame.size();
        let Some(report) = self.report.as_ref() else {
            self.draw_placeholder(frame, "Summary", "No finished match");
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(cmp::min(report.deltas.len() as u16 + 2, 12)),
                Constraint::Length(3),
            ])
            .split(area);

        let result = Paragraph::new(Line::from(Span::styled(
            report.result.text.clone(),
            Style::default()
                .fg(self.theme.success)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Result"));
        frame.render_widget(result, rows[0]);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        for (innings, area) in [(&report.innings1, cards[0]), (&report.innings2, cards[1])] {
            let card = Paragraph::new(innings_lines(&self.theme, innings))
                .block(Block::default().borders(Borders::ALL).title(format!(
                    "{} innings",
                    innings.batting_team_name
                )))
                .wrap(Wrap { trim: false });
            frame.render_widget(card, area);
        }

        let changes: Vec<Line> = report
            .deltas
            .iter()
            .filter_map(|(id, delta)| {
                let player = report.updated_players.iter().find(|p| p.id == *id)?;
                Some(Line::from(vec![
                    Span::styled(
                        format!("{:<14}", player.name),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("bat {} ", format_delta(delta.batting_delta)),
                        Style::default().fg(delta_colour(&self.theme, delta.batting_delta)),
                    ),
                    Span::raw(format!("→ {}   ", format_rating(player.batting_rating))),
                    Span::styled(
                        format!("bowl {} ", format_delta(delta.bowling_delta)),
                        Style::default().fg(delta_colour(&self.theme, delta.bowling_delta)),
                    ),
                    Span::raw(format!("→ {}", format_rating(player.bowling_rating))),
                ]))
            })
            .collect();
        let ratings = Paragraph::new(changes)
            .block(Block::default().borders(Borders::ALL).title("Rating changes"));
        frame.render_widget(ratings, rows[2]);
        self.render_status(frame, rows[3]);
    }

    fn draw_history(&self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[0]);

        let items: Vec<ListItem> = if self.history.is_empty() {
            vec![ListItem::new(Line::from("  No matches recorded"))]
        } else {
            self.history
                .iter()
                .map(|record| {
                    let when = record
                        .timestamp
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M");
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{when}  "), Style::default().fg(self.theme.muted)),
                        Span::raw(record.title()),
                    ]))
                })
                .collect()
        };
        let mut list_state = ListState::default();
        if !self.history.is_empty() {
            list_state.select(Some(
                self.state.history_cursor.min(self.history.len() - 1),
            ));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Match History"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, body[0], &mut list_state);

        let detail = match self.history.get(self.state.history_cursor) {
            Some(record) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        record.result.text.clone(),
                        Style::default()
                            .fg(self.theme.success)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                ];
                lines.extend(innings_lines(&self.theme, &record.innings1));
                lines.push(Line::from(""));
                lines.extend(innings_lines(&self.theme, &record.innings2));
                lines
            }
            None => vec![Line::from("Finish a match to see it here")],
        };
        let panel = Paragraph::new(detail)
            .block(Block::default().borders(Borders::ALL).title("Scorecard"))
            .wrap(Wrap { trim: false });
        frame.render_widget(panel, body[1]);
        self.render_status(frame, rows[1]);
    }

    fn draw_placeholder(&self, frame: &mut Frame, title: &str, message: &str) {
        let paragraph = Paragraph::new(vec![Line::from(message.to_string())])
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, frame.size());
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &TextPrompt) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = 7_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);

        let paragraph = Paragraph::new(vec![
            Line::from(prompt.instruction()),
            input_line,
            Line::from(""),
            helper,
        ])
        .block(Block::default().borders(Borders::ALL).title(prompt.title()))
        .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(Line::from(self.state.status.clone()))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    player_cursor: usize,
    history_cursor: usize,
    selected: BTreeSet<PlayerId>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            player_cursor: 0,
            history_cursor: 0,
            selected: BTreeSet::new(),
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn toggle_selected(&mut self, id: PlayerId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }
}

/// Move a list cursor by `delta`, staying inside `0..total`.
fn step_cursor(current: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let next = (current as isize + delta).clamp(0, total as isize - 1);
    next as usize
}

fn outcome_for_key(ch: char) -> Option<Outcome> {
    match ch.to_ascii_lowercase() {
        'w' => Some(Outcome::Wicket),
        'd' => Some(Outcome::Wide),
        'n' => Some(Outcome::NoBall),
        digit => digit
            .to_digit(10)
            .and_then(|n| u8::try_from(n).ok())
            .filter(|&n| n <= 6)
            .map(Outcome::Runs),
    }
}

fn parse_rating(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| (1.0..=10.0).contains(value))
}

fn format_delta(delta: f64) -> String {
    format!("{delta:+.1}")
}

fn delta_colour(theme: &Theme, delta: f64) -> Color {
    if delta > 0.05 {
        theme.success
    } else if delta < -0.05 {
        theme.danger
    } else {
        theme.muted
    }
}

fn key_hint(theme: &Theme, keys: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{keys:>7} "),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(action.to_string()),
    ])
}

fn innings_lines(theme: &Theme, innings: &InningsSummary) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!("{} {}", innings.batting_team_name, innings.score_line()),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    ))];
    for stat in innings.batsmen.iter().filter(|b| b.has_batted()) {
        let status = if stat.out { "" } else { " not out" };
        lines.push(Line::from(format!(
            "  {:<14} {:>3} ({}){status}",
            stat.name, stat.runs, stat.balls_faced
        )));
    }
    if innings.extras > 0 {
        lines.push(Line::from(format!("  {:<14} {:>3}", "Extras", innings.extras)));
    }
    lines.push(Line::from(Span::styled(
        format!("{} bowling", innings.bowling_team_name),
        Style::default().fg(theme.muted),
    )));
    for stat in &innings.bowlers {
        lines.push(Line::from(format!(
            "  {:<14} {}-{}-{}",
            stat.name,
            stat.overs_display(),
            stat.runs_conceded,
            stat.wickets
        )));
    }
    lines
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
