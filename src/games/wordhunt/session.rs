use std::time::Duration;

use rand::{rngs::StdRng, seq::SliceRandom, Rng};
use tracing::{debug, info, trace};

use super::{
    core::{is_match, Gesture, Position},
    round::{Round, RoundGenerator},
    scores::ScoreUpdate,
    words_list::Facts,
};
use crate::framework::config::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Waiting,
    Playing,
    /// Reserved; nothing enters this state yet.
    #[allow(dead_code)]
    Paused,
    GameOver,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    Success { fact: Option<String> },
    Timeout { fact: Option<String> },
}

impl Feedback {
    pub fn fact(&self) -> Option<&str> {
        match self {
            Self::Success { fact } | Self::Timeout { fact } => fact.as_deref(),
        }
    }
}

/// Identifies one scheduled timer. A timer that fires with a ticket the
/// session no longer holds is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Work the host has to do after an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Restart the one-second countdown from a full second.
    StartCountdown,
    StopCountdown,
    Save(ScoreUpdate),
    ScheduleAdvance { ticket: Ticket, after: Duration },
    ScheduleFeedbackClear { ticket: Ticket, after: Duration },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundState {
    pub round: Round,
    pub selection: Vec<Position>,
    pub score: u32,
    pub time_remaining: u32,
    pub status: Status,
    pub rounds_played: u32,
    pub hint: Option<Position>,
    pub feedback: Option<Feedback>,
}

impl RoundState {
    pub const fn hint_shown(&self) -> bool {
        self.hint.is_some()
    }
}

/// The game rules. Every event handler mutates the state and returns the
/// timers and saves the host has to take care of; nothing here sleeps.
#[derive(Debug)]
pub struct Session<R = StdRng> {
    generator: RoundGenerator,
    facts: Facts,
    config: GameConfig,
    rng: R,
    state: RoundState,

    gesture: Option<Gesture>,
    countdown: bool,
    advance: Option<Ticket>,
    clear_feedback: Option<Ticket>,
    next_ticket: u64,

    game: u32,
    flushed: bool,
    high_score: u32,
}

impl<R: Rng> Session<R> {
    pub fn new(generator: RoundGenerator, facts: Facts, config: GameConfig, mut rng: R) -> Self {
        let round = generator.new_round(&mut rng);
        let state = Self::waiting(round, &config);

        Self {
            generator,
            facts,
            config,
            rng,
            state,
            gesture: None,
            countdown: false,
            advance: None,
            clear_feedback: None,
            next_ticket: 0,
            game: 0,
            flushed: false,
            high_score: 0,
        }
    }

    /// Sets the best score the store knows about for this player.
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    fn waiting(round: Round, config: &GameConfig) -> RoundState {
        RoundState {
            round,
            selection: Vec::new(),
            score: 0,
            time_remaining: config.round_seconds,
            status: Status::Waiting,
            rounds_played: 0,
            hint: None,
            feedback: None,
        }
    }

    pub const fn state(&self) -> &RoundState {
        &self.state
    }

    pub const fn countdown_running(&self) -> bool {
        self.countdown
    }

    pub const fn known_high_score(&self) -> u32 {
        self.high_score
    }

    fn ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn fact(&mut self) -> Option<String> {
        self.facts.random(&mut self.rng)
    }

    fn update(&self) -> ScoreUpdate {
        ScoreUpdate {
            game: self.game,
            score: self.state.score,
            rounds_played: self.state.rounds_played,
        }
    }

    fn cancel_timers(&mut self) {
        self.advance = None;
        self.clear_feedback = None;
        self.gesture = None;
        self.state.selection.clear();
    }

    /// Starts a new game on a fresh board: score and rounds start over.
    pub fn start(&mut self) -> Vec<Effect> {
        self.cancel_timers();

        self.game += 1;
        self.flushed = false;

        let round = self.generator.new_round(&mut self.rng);
        self.state = RoundState {
            status: Status::Playing,
            rounds_played: 1,
            ..Self::waiting(round, &self.config)
        };
        self.countdown = true;

        info!(game = self.game, "game started");

        vec![Effect::StartCountdown]
    }

    /// Moves on to a fresh board, keeping the score.
    fn next_round(&mut self) -> Vec<Effect> {
        self.cancel_timers();

        self.state.round = self.generator.new_round(&mut self.rng);
        self.state.rounds_played += 1;
        self.state.time_remaining = self.config.round_seconds;
        self.state.hint = None;
        self.state.feedback = None;
        self.countdown = true;

        debug!(rounds_played = self.state.rounds_played, "next round");

        vec![Effect::StartCountdown]
    }

    /// One second of the countdown.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.state.status != Status::Playing || !self.countdown {
            return Vec::new();
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        trace!(time_remaining = self.state.time_remaining);

        if self.state.time_remaining == self.config.hint_at_seconds && self.state.hint.is_none() {
            self.state.hint = self
                .state
                .round
                .target()
                .path()
                .choose(&mut self.rng)
                .copied();
            debug!(hint = ?self.state.hint, "hint revealed");
        }

        if self.state.time_remaining == 0 {
            return self.time_up();
        }

        Vec::new()
    }

    fn time_up(&mut self) -> Vec<Effect> {
        self.cancel_timers();
        self.countdown = false;
        self.state.status = Status::GameOver;
        self.state.feedback = Some(Feedback::Timeout { fact: self.fact() });

        info!(score = self.state.score, "time up");

        let ticket = self.ticket();
        self.clear_feedback = Some(ticket);

        let mut effects = vec![
            Effect::StopCountdown,
            Effect::ScheduleFeedbackClear {
                ticket,
                after: self.config.feedback_window(),
            },
        ];

        if self.state.score > self.high_score {
            self.flushed = true;
            effects.push(Effect::Save(self.update()));
        }

        effects
    }

    /// Pointer down. While a found word is on show this skips straight to the
    /// next round instead of starting a selection.
    pub fn press(&mut self, pos: Position) -> Vec<Effect> {
        if self.state.status != Status::Playing {
            return Vec::new();
        }

        if self.advance.is_some() {
            return self.next_round();
        }

        if !pos.in_bounds(self.state.round.grid().size()) {
            return Vec::new();
        }

        let gesture = Gesture::new(pos);
        self.state.selection = gesture.path().to_vec();
        self.gesture = Some(gesture);

        Vec::new()
    }

    pub fn hover(&mut self, pos: Position) -> Vec<Effect> {
        if self.state.status != Status::Playing
            || !pos.in_bounds(self.state.round.grid().size())
        {
            return Vec::new();
        }

        if let Some(gesture) = self.gesture.as_mut() {
            self.state.selection = gesture.hover(pos).to_vec();
        }

        Vec::new()
    }

    /// Pointer up: checks the selection against the target word.
    pub fn release(&mut self) -> Vec<Effect> {
        let Some(gesture) = self.gesture.take() else {
            return Vec::new();
        };
        self.state.selection.clear();

        if self.state.status != Status::Playing {
            return Vec::new();
        }

        if !is_match(gesture.path(), self.state.round.target().path()) {
            trace!("selection missed");
            return Vec::new();
        }

        self.countdown = false;
        self.state.score += self.config.points_per_word;
        self.state.feedback = Some(Feedback::Success { fact: self.fact() });

        info!(
            word = %self.state.round.word(),
            score = self.state.score,
            "word found"
        );

        let ticket = self.ticket();
        self.advance = Some(ticket);

        vec![
            Effect::StopCountdown,
            Effect::Save(self.update()),
            Effect::ScheduleAdvance {
                ticket,
                after: self.config.success_delay(),
            },
        ]
    }

    /// Player dismissed the feedback.
    pub fn dismiss(&mut self) -> Vec<Effect> {
        if self.advance.is_some() {
            return self.next_round();
        }

        if self.clear_feedback.take().is_some() {
            self.state.feedback = None;
        }

        Vec::new()
    }

    /// The success delay ran out.
    pub fn advance(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.advance != Some(ticket) {
            trace!(?ticket, "stale advance");
            return Vec::new();
        }

        self.next_round()
    }

    pub fn clear_feedback(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.clear_feedback == Some(ticket) {
            self.clear_feedback = None;
            self.state.feedback = None;
        }

        Vec::new()
    }

    /// Ends the game early. The score is flushed once per game.
    pub fn stop(&mut self) -> Vec<Effect> {
        if self.state.status != Status::Playing {
            return Vec::new();
        }

        self.cancel_timers();
        self.countdown = false;
        self.state.status = Status::GameOver;
        self.state.feedback = None;

        info!(score = self.state.score, "game stopped");

        let mut effects = vec![Effect::StopCountdown];

        if !self.flushed && self.state.score > 0 {
            self.flushed = true;
            effects.push(Effect::Save(self.update()));
        }

        effects
    }

    /// Back to the waiting screen with a fresh board.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.cancel_timers();
        self.countdown = false;

        let round = self.generator.new_round(&mut self.rng);
        self.state = Self::waiting(round, &self.config);

        debug!("session reset");

        vec![Effect::StopCountdown]
    }

    /// The store reported a high score for this player.
    pub fn confirm_high_score(&mut self, high_score: u32) {
        self.high_score = self.high_score.max(high_score);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Effect, Feedback, Session, Status, Ticket};
    use crate::{
        framework::config::GameConfig,
        games::wordhunt::{
            core::Position,
            round::RoundGenerator,
            scores::ScoreUpdate,
            words_list::{Facts, WordsList},
        },
    };
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn session(seed: u64) -> Session<StdRng> {
        let generator = RoundGenerator::new(WordsList::builtin(), 10).unwrap();
        Session::new(
            generator,
            Facts::builtin(),
            GameConfig::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn target(session: &Session<StdRng>) -> Vec<Position> {
        session.state().round.target().path().to_vec()
    }

    fn drag(session: &mut Session<StdRng>, from: Position, to: Position) -> Vec<Effect> {
        let mut effects = session.press(from);
        effects.extend(session.hover(to));
        effects.extend(session.release());
        effects
    }

    /// Drags over the target word and returns the advance ticket.
    fn find_word(session: &mut Session<StdRng>) -> Ticket {
        let path = target(session);
        let effects = drag(session, path[0], path[path.len() - 1]);

        effects
            .into_iter()
            .find_map(|effect| match effect {
                Effect::ScheduleAdvance { ticket, .. } => Some(ticket),
                _ => None,
            })
            .expect("dragging over the target is a match")
    }

    fn ticks(session: &mut Session<StdRng>, n: u32) -> Vec<Effect> {
        (0..n).flat_map(|_| session.tick()).collect()
    }

    fn saves(effects: &[Effect]) -> Vec<ScoreUpdate> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Save(update) => Some(*update),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn starts_waiting() {
        let mut session = session(1);
        let state = session.state();

        assert_eq!(state.status, Status::Waiting);
        assert_eq!(state.score, 0);
        assert_eq!(state.rounds_played, 0);
        assert_eq!(state.time_remaining, 60);
        assert!(state.round.grid().is_filled());
        assert!(!session.countdown_running());

        assert_eq!(session.tick(), vec![]);
        assert_eq!(session.state().time_remaining, 60);
    }

    #[test]
    #[tracing_test::traced_test]
    fn start_game() {
        let mut session = session(2);

        assert_eq!(session.start(), vec![Effect::StartCountdown]);

        let state = session.state();
        assert_eq!(state.status, Status::Playing);
        assert_eq!(state.time_remaining, 60);
        assert_eq!(state.score, 0);
        assert_eq!(state.rounds_played, 1);
        assert!(session.countdown_running());
        assert!(logs_contain("game started"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn found_word_scores_and_advances() {
        let mut session = session(3);
        session.start();
        ticks(&mut session, 5);

        let path = target(&session);
        let effects = drag(&mut session, path[0], path[path.len() - 1]);

        let Some(Effect::ScheduleAdvance { ticket, after }) = effects.last().cloned() else {
            panic!("expected an advance, got {effects:?}");
        };
        assert_eq!(after, Duration::from_millis(1500));
        assert_eq!(effects[0], Effect::StopCountdown);
        assert_eq!(
            saves(&effects),
            vec![ScoreUpdate {
                game: 1,
                score: 50,
                rounds_played: 1
            }]
        );

        let state = session.state();
        assert_eq!(state.score, 50);
        assert_eq!(state.status, Status::Playing);
        assert!(state.selection.is_empty());
        assert!(matches!(state.feedback, Some(Feedback::Success { fact: Some(_) })));

        // countdown is frozen until the next round
        assert_eq!(ticks(&mut session, 3), vec![]);
        assert_eq!(session.state().time_remaining, 55);

        assert_eq!(session.advance(ticket), vec![Effect::StartCountdown]);

        let state = session.state();
        assert_eq!(state.rounds_played, 2);
        assert_eq!(state.score, 50);
        assert_eq!(state.time_remaining, 60);
        assert_eq!(state.feedback, None);
        assert_eq!(state.hint, None);
        assert!(session.countdown_running());
    }

    #[test]
    fn reverse_drag_matches() {
        let mut session = session(4);
        session.start();

        let path = target(&session);
        drag(&mut session, path[path.len() - 1], path[0]);

        assert_eq!(session.state().score, 50);
    }

    #[test]
    fn miss_clears_selection() {
        let mut session = session(5);
        session.start();

        let path = target(&session);
        session.press(path[0]);
        assert_eq!(session.state().selection, vec![path[0]]);

        // one cell short of the word
        session.hover(path[path.len() - 2]);
        assert_eq!(session.state().selection.len(), path.len() - 1);

        assert_eq!(session.release(), vec![]);
        assert!(session.state().selection.is_empty());
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().feedback, None);
        assert!(session.countdown_running());
    }

    #[test]
    fn crooked_drag_is_just_the_anchor() {
        let mut session = session(6);
        session.start();

        session.press(Position::new(0, 0));
        session.hover(Position::new(1, 2));

        assert_eq!(session.state().selection, vec![Position::new(0, 0)]);
    }

    #[test]
    #[tracing_test::traced_test]
    fn timer_runs_out() {
        let mut session = session(7);
        session.start();

        assert_eq!(ticks(&mut session, 59), vec![]);
        assert_eq!(session.state().time_remaining, 1);

        let effects = session.tick();
        let state = session.state();
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.status, Status::GameOver);
        assert!(matches!(state.feedback, Some(Feedback::Timeout { .. })));
        assert!(!session.countdown_running());
        assert_eq!(effects[0], Effect::StopCountdown);
        assert!(matches!(effects[1], Effect::ScheduleFeedbackClear { after, .. } if after == Duration::from_secs(2)));
        assert_eq!(saves(&effects), vec![], "nothing beats a high score of 0");

        assert_eq!(ticks(&mut session, 5), vec![]);
        assert_eq!(session.state().time_remaining, 0);
        assert_eq!(session.state().score, 0);

        let path = target(&session);
        assert_eq!(drag(&mut session, path[0], path[path.len() - 1]), vec![]);
        assert_eq!(session.state().score, 0);
        assert!(logs_contain("time up"));
    }

    #[test]
    fn time_up_flushes_new_high_score() {
        let mut session = session(8).with_high_score(20);
        session.start();
        let ticket = find_word(&mut session);
        session.advance(ticket);

        let effects = ticks(&mut session, 60);

        assert_eq!(
            saves(&effects),
            vec![ScoreUpdate {
                game: 1,
                score: 50,
                rounds_played: 2
            }]
        );
    }

    #[test]
    fn time_up_skips_flush_below_high_score() {
        let mut session = session(9).with_high_score(20);
        session.start();
        let ticket = find_word(&mut session);
        session.confirm_high_score(400);
        session.advance(ticket);

        let effects = ticks(&mut session, 60);

        assert_eq!(session.state().status, Status::GameOver);
        assert_eq!(saves(&effects), vec![]);
        assert_eq!(session.known_high_score(), 400);
    }

    #[test]
    fn hint_is_shown_once_per_round() {
        let mut session = session(10);
        session.start();

        let mut reveals = 0;
        for _ in 0..60 {
            let before = session.state().hint_shown();
            session.tick();
            let state = session.state();

            if !before && state.hint_shown() {
                reveals += 1;
                assert_eq!(state.time_remaining, 10);
            }
            if let Some(hint) = state.hint {
                assert!(state.round.target().contains(hint));
            }
        }

        assert_eq!(reveals, 1);
    }

    #[test]
    fn hint_resets_with_round() {
        let mut session = session(11);
        session.start();
        ticks(&mut session, 50);
        assert!(session.state().hint_shown());

        let ticket = find_word(&mut session);
        assert!(session.state().hint_shown(), "hint stays until the round changes");

        session.advance(ticket);
        assert!(!session.state().hint_shown());

        ticks(&mut session, 50);
        let state = session.state();
        assert!(state.round.target().contains(state.hint.expect("second round hint")));
    }

    #[test]
    fn no_hint_while_frozen() {
        let mut session = session(12);
        session.start();
        ticks(&mut session, 45);

        find_word(&mut session);
        ticks(&mut session, 10);

        assert!(!session.state().hint_shown());
        assert_eq!(session.state().time_remaining, 15);
    }

    #[test]
    fn dismiss_advances_early() {
        let mut session = session(13);
        session.start();
        let ticket = find_word(&mut session);

        assert_eq!(session.dismiss(), vec![Effect::StartCountdown]);
        assert_eq!(session.state().rounds_played, 2);

        // the original timer firing late must not skip another round
        assert_eq!(session.advance(ticket), vec![]);
        assert_eq!(session.state().rounds_played, 2);
    }

    #[test]
    fn press_during_success_dismisses() {
        let mut session = session(14);
        session.start();
        find_word(&mut session);

        assert_eq!(session.press(Position::new(0, 0)), vec![Effect::StartCountdown]);

        let state = session.state();
        assert_eq!(state.rounds_played, 2);
        assert!(state.selection.is_empty());
        assert_eq!(session.release(), vec![]);
    }

    #[test]
    fn stop_flushes_once() {
        let mut session = session(15);
        session.start();
        let ticket = find_word(&mut session);
        session.advance(ticket);

        let effects = session.stop();
        assert_eq!(effects[0], Effect::StopCountdown);
        assert_eq!(
            saves(&effects),
            vec![ScoreUpdate {
                game: 1,
                score: 50,
                rounds_played: 2
            }]
        );

        let state = session.state();
        assert_eq!(state.status, Status::GameOver);
        assert_eq!(state.feedback, None);
        assert_eq!(session.stop(), vec![]);
    }

    #[test]
    fn stop_without_score_saves_nothing() {
        let mut session = session(16);
        session.start();

        assert_eq!(session.stop(), vec![Effect::StopCountdown]);
    }

    #[test]
    fn stop_cancels_pending_advance() {
        let mut session = session(17);
        session.start();
        let ticket = find_word(&mut session);

        session.stop();

        assert_eq!(session.advance(ticket), vec![]);
        assert_eq!(session.state().status, Status::GameOver);
        assert_eq!(session.state().rounds_played, 1);
    }

    #[test]
    fn reset_returns_to_waiting() {
        let mut session = session(18);
        session.start();
        let ticket = find_word(&mut session);
        let board = session.state().round.clone();

        assert_eq!(session.reset(), vec![Effect::StopCountdown]);

        let state = session.state();
        assert_eq!(state.status, Status::Waiting);
        assert_eq!(state.score, 0);
        assert_eq!(state.rounds_played, 0);
        assert_eq!(state.time_remaining, 60);
        assert_eq!(state.feedback, None);
        assert_ne!(state.round, board);

        assert_eq!(session.advance(ticket), vec![]);
        assert_eq!(session.state().status, Status::Waiting);
    }

    #[test]
    fn new_game_counts_separately() {
        let mut session = session(19);
        session.start();
        find_word(&mut session);
        session.stop();

        session.start();
        let state = session.state();
        assert_eq!(state.score, 0);
        assert_eq!(state.rounds_played, 1);

        let path = target(&session);
        let effects = drag(&mut session, path[0], path[path.len() - 1]);
        assert_eq!(
            saves(&effects),
            vec![ScoreUpdate {
                game: 2,
                score: 50,
                rounds_played: 1
            }]
        );
    }

    #[test]
    fn feedback_clears_after_window() {
        let mut session = session(20);
        session.start();

        let effects = ticks(&mut session, 60);
        let ticket = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::ScheduleFeedbackClear { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("time up schedules a clear");

        session.clear_feedback(Ticket(ticket.0 + 100));
        assert!(session.state().feedback.is_some(), "unknown ticket");

        session.clear_feedback(ticket);
        assert_eq!(session.state().feedback, None);
    }

    #[test]
    fn ignores_input_while_waiting() {
        let mut session = session(21);

        assert_eq!(session.press(Position::new(1, 1)), vec![]);
        assert_eq!(session.hover(Position::new(1, 3)), vec![]);
        assert_eq!(session.release(), vec![]);
        assert!(session.state().selection.is_empty());
        assert_eq!(session.stop(), vec![]);
    }

    #[test]
    fn out_of_bounds_press_is_ignored() {
        let mut session = session(22);
        session.start();

        session.press(Position::new(10, 0));

        assert!(session.state().selection.is_empty());
        assert_eq!(session.release(), vec![]);
    }
}
