use std::time::Duration;

use rand::Rng;
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, trace, warn};

use super::{
    core::Position,
    scores::{SaveOutcome, ScoreClient, ScoreLedger, ScoreUpdate},
    session::{Effect, RoundState, Session, Ticket},
};
use crate::accounts::Backend;

const SECOND: Duration = Duration::from_secs(1);

/// Player input, as it arrives from the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Start,
    Press(Position),
    Hover(Position),
    Release,
    Dismiss,
    Stop,
    Reset,
    Quit,
}

type Saved = (ScoreUpdate, SaveOutcome);

/// Drives a [`Session`] in real time: ticks the countdown, fires the
/// scheduled timers and runs score saves in the background.
///
/// Saves are spawned with [`tokio::task::spawn_local`], so [`Runner::run`]
/// has to be awaited inside a [`tokio::task::LocalSet`].
pub struct Runner<B, R> {
    session: Session<R>,
    scores: Option<ScoreClient<B>>,
    ledger: ScoreLedger,
    flush_every: Duration,
    state: watch::Sender<RoundState>,

    countdown: Interval,
    advance: Option<(Ticket, Instant)>,
    clear_feedback: Option<(Ticket, Instant)>,
}

fn deadline(timer: Option<(Ticket, Instant)>) -> Instant {
    timer.map_or_else(|| Instant::now() + Duration::from_secs(3600), |(_, at)| at)
}

impl<B, R> Runner<B, R>
where
    B: Backend + 'static,
    R: Rng,
{
    pub fn new(
        session: Session<R>,
        scores: Option<ScoreClient<B>>,
        flush_every: Duration,
    ) -> (Self, watch::Receiver<RoundState>) {
        let (state, rx) = watch::channel(session.state().clone());
        let flush_every = flush_every.max(SECOND);

        let mut countdown = time::interval_at(Instant::now() + SECOND, SECOND);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let runner = Self {
            session,
            scores,
            ledger: ScoreLedger::new(),
            flush_every,
            state,
            countdown,
            advance: None,
            clear_feedback: None,
        };

        (runner, rx)
    }

    fn handle(&mut self, input: Input) -> Vec<Effect> {
        trace!(?input);

        match input {
            Input::Start => self.session.start(),
            Input::Press(pos) => self.session.press(pos),
            Input::Hover(pos) => self.session.hover(pos),
            Input::Release => self.session.release(),
            Input::Dismiss => self.session.dismiss(),
            Input::Stop => self.session.stop(),
            Input::Reset => self.session.reset(),
            Input::Quit => Vec::new(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>, saved: &mpsc::UnboundedSender<Saved>) {
        for effect in effects {
            match effect {
                Effect::StartCountdown => self.countdown.reset(),
                Effect::StopCountdown => (),
                Effect::Save(update) => self.save(update, saved),
                Effect::ScheduleAdvance { ticket, after } => {
                    self.advance = Some((ticket, Instant::now() + after));
                }
                Effect::ScheduleFeedbackClear { ticket, after } => {
                    self.clear_feedback = Some((ticket, Instant::now() + after));
                }
            }
        }
    }

    fn save(&mut self, update: ScoreUpdate, saved: &mpsc::UnboundedSender<Saved>) {
        let Some(scores) = self.scores.clone() else {
            trace!(?update, "playing as guest, not saving");
            return;
        };

        self.ledger.sent(update);

        let saved = saved.clone();
        tokio::task::spawn_local(async move {
            let outcome = scores.save(update).await;
            saved.send((update, outcome)).ok();
        });
    }

    fn settle(&mut self, update: ScoreUpdate, outcome: SaveOutcome) {
        self.ledger.settled(update, &outcome);

        match outcome {
            SaveOutcome::Saved(receipt) => self.session.confirm_high_score(receipt.high_score),
            SaveOutcome::Exhausted { attempts, error } => {
                warn!(?update, attempts, %error, "score not saved, keeping it for the next flush");
            }
            SaveOutcome::Rejected(error) => warn!(?update, %error, "score refused"),
        }
    }

    fn flush(&mut self, saved: &mpsc::UnboundedSender<Saved>) {
        if let Some(update) = self.ledger.pending() {
            debug!(?update, "flushing unsaved score");
            self.save(update, saved);
        }
    }

    pub async fn run(mut self, mut input: mpsc::Receiver<Input>) {
        let (saved_tx, mut saved_rx) = mpsc::unbounded_channel::<Saved>();

        let mut flush = time::interval_at(Instant::now() + self.flush_every, self.flush_every);
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let effects = tokio::select! {
                input = input.recv() => match input {
                    None | Some(Input::Quit) => break,
                    Some(input) => self.handle(input),
                },

                _ = self.countdown.tick(), if self.session.countdown_running() => {
                    self.session.tick()
                }

                () = time::sleep_until(deadline(self.advance)), if self.advance.is_some() => {
                    match self.advance.take() {
                        Some((ticket, _)) => self.session.advance(ticket),
                        None => Vec::new(),
                    }
                }

                () = time::sleep_until(deadline(self.clear_feedback)), if self.clear_feedback.is_some() => {
                    match self.clear_feedback.take() {
                        Some((ticket, _)) => self.session.clear_feedback(ticket),
                        None => Vec::new(),
                    }
                }

                Some((update, outcome)) = saved_rx.recv() => {
                    self.settle(update, outcome);
                    Vec::new()
                }

                _ = flush.tick() => {
                    self.flush(&saved_tx);
                    Vec::new()
                }
            };

            self.apply(effects, &saved_tx);
            self.state.send_replace(self.session.state().clone());
        }

        self.shutdown(&saved_tx, &mut saved_rx).await;
    }

    /// Waits for running saves, then makes one last attempt at anything
    /// still unconfirmed.
    async fn shutdown(
        &mut self,
        saved_tx: &mpsc::UnboundedSender<Saved>,
        saved_rx: &mut mpsc::UnboundedReceiver<Saved>,
    ) {
        while self.ledger.in_flight() > 0 {
            let Some((update, outcome)) = saved_rx.recv().await else {
                break;
            };
            self.settle(update, outcome);
        }

        self.flush(saved_tx);

        if self.ledger.in_flight() > 0 {
            if let Some((update, outcome)) = saved_rx.recv().await {
                self.settle(update, outcome);
            }
        }

        info!("game closed");
    }
}
