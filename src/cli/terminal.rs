use std::fmt::Write;

use crate::games::wordhunt::{core::Position, Feedback, Input, RoundState, Status};

pub const HELP: &str = "\
commands:
  start                 start a new game
  drag R1 C1 R2 C2      select from one cell to another
  press R C             put the pointer down on a cell
  hover R C             move the pointer to a cell
  release               lift the pointer
  dismiss               skip the feedback
  stop                  end the game
  reset                 back to the start screen
  help                  show this
  quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseLineError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    #[error("`{command}` takes {expected} numbers")]
    Arguments { command: String, expected: usize },

    #[error("`{0}` is not a cell number")]
    Number(String),
}

/// What a line typed by the player asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Inputs(Vec<Input>),
    Help,
    Nothing,
}

fn positions(
    command: &str,
    args: &[&str],
    expected: usize,
) -> Result<Vec<Position>, ParseLineError> {
    if args.len() != expected * 2 {
        return Err(ParseLineError::Arguments {
            command: command.to_owned(),
            expected: expected * 2,
        });
    }

    let numbers = args
        .iter()
        .map(|arg| {
            arg.parse::<usize>()
                .map_err(|_| ParseLineError::Number((*arg).to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(numbers
        .chunks(2)
        .map(|pair| Position::new(pair[0], pair[1]))
        .collect())
}

pub fn parse_line(line: &str) -> Result<Line, ParseLineError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Line::Nothing);
    };
    let command = command.to_lowercase();
    let args: Vec<&str> = words.collect();

    let inputs = match command.as_str() {
        "start" => vec![Input::Start],
        "release" => vec![Input::Release],
        "dismiss" => vec![Input::Dismiss],
        "stop" => vec![Input::Stop],
        "reset" => vec![Input::Reset],
        "quit" | "exit" => vec![Input::Quit],
        "help" | "?" => return Ok(Line::Help),
        "press" => vec![Input::Press(positions(&command, &args, 1)?[0])],
        "hover" => vec![Input::Hover(positions(&command, &args, 1)?[0])],
        "drag" => {
            let cells = positions(&command, &args, 2)?;
            vec![
                Input::Press(cells[0]),
                Input::Hover(cells[1]),
                Input::Release,
            ]
        }
        _ => return Err(ParseLineError::Unknown(command)),
    };

    Ok(Line::Inputs(inputs))
}

fn status(status: Status) -> &'static str {
    match status {
        Status::Waiting => "press start",
        Status::Playing => "playing",
        Status::Paused => "paused",
        Status::GameOver => "game over",
    }
}

/// Board, score line and feedback as plain text.
///
/// Selected cells are drawn in brackets, the hint in braces, and after the
/// game ends the hidden word in angle brackets.
pub fn render(state: &RoundState, high_score: u32) -> String {
    let mut out = String::new();
    let grid = state.round.grid();
    let reveal = state.status == Status::GameOver && state.feedback.is_none();

    writeln!(
        out,
        "score {}  best {}  time {}s  round {}  [{}]",
        state.score,
        high_score.max(state.score),
        state.time_remaining,
        state.rounds_played,
        status(state.status)
    )
    .ok();

    out.push_str("    ");
    for col in 0..grid.size() {
        write!(out, "{col:^3}").ok();
    }
    out.push('\n');

    for row in 0..grid.size() {
        write!(out, "{row:>2}  ").ok();

        for col in 0..grid.size() {
            let pos = Position::new(row, col);
            let letter = grid.get(pos).unwrap_or('.');

            let (open, close) = if state.selection.contains(&pos) {
                ('[', ']')
            } else if state.hint == Some(pos) {
                ('{', '}')
            } else if reveal && state.round.target().contains(pos) {
                ('<', '>')
            } else {
                (' ', ' ')
            };

            write!(out, "{open}{letter}{close}").ok();
        }
        out.push('\n');
    }

    match &state.feedback {
        Some(feedback @ Feedback::Success { .. }) => {
            writeln!(out, "found it! the word was {}", state.round.word()).ok();
            if let Some(fact) = feedback.fact() {
                writeln!(out, "did you know? {fact}").ok();
            }
        }
        Some(feedback @ Feedback::Timeout { .. }) => {
            writeln!(out, "time up! the word was {}", state.round.word()).ok();
            if let Some(fact) = feedback.fact() {
                writeln!(out, "did you know? {fact}").ok();
            }
        }
        None => {}
    }

    out
}

/// Whether `current` is worth drawing again. The countdown alone only
/// redraws every ten seconds and for the last five.
pub fn worth_redrawing(previous: Option<&RoundState>, current: &RoundState) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if previous.time_remaining == current.time_remaining {
        return previous != current;
    }

    let mut ticked = previous.clone();
    ticked.time_remaining = current.time_remaining;

    ticked != *current || current.time_remaining % 10 == 0 || current.time_remaining <= 5
}

#[cfg(test)]
mod tests {
    use super::{parse_line, render, worth_redrawing, Line, ParseLineError};
    use crate::{
        framework::config::GameConfig,
        games::wordhunt::{
            core::Position,
            round::RoundGenerator,
            words_list::{Facts, WordsList},
            Input, Session,
        },
    };
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    macro_rules! lines {
        ($($name:ident: $line:literal => $expected:expr,)+) => {
            $(
            paste::paste! {
                #[test]
                fn [<parse_ $name>]() {
                    assert_eq!(parse_line($line), $expected);
                }
            }
            )+
        };
    }

    lines! {
        start: "start" => Ok(Line::Inputs(vec![Input::Start])),
        shouting: "  STOP " => Ok(Line::Inputs(vec![Input::Stop])),
        blank: "   " => Ok(Line::Nothing),
        help: "help" => Ok(Line::Help),
        press: "press 2 3" => Ok(Line::Inputs(vec![Input::Press(Position::new(2, 3))])),
        drag: "drag 2 3 2 7" => Ok(Line::Inputs(vec![
            Input::Press(Position::new(2, 3)),
            Input::Hover(Position::new(2, 7)),
            Input::Release,
        ])),
        short_drag: "drag 1 2 3" => Err(ParseLineError::Arguments {
            command: "drag".to_owned(),
            expected: 4,
        }),
        negative: "hover -1 2" => Err(ParseLineError::Number("-1".to_owned())),
        unknown: "jump" => Err(ParseLineError::Unknown("jump".to_owned())),
    }

    #[test]
    fn render_marks_cells() {
        let generator = RoundGenerator::new(WordsList::builtin(), 10).unwrap();
        let mut session = Session::new(
            generator,
            Facts::default(),
            GameConfig::default(),
            StdRng::seed_from_u64(3),
        );
        session.start();

        let path = session.state().round.target().path().to_vec();
        session.press(path[0]);

        let board = render(session.state(), 0);
        let letter = session.state().round.grid().get(path[0]).unwrap();

        assert!(board.starts_with("score 0  best 0  time 60s  round 1  [playing]"));
        assert!(board.contains(&format!("[{letter}]")));
        assert_eq!(board.lines().count(), 1 + 1 + 10);

        session.stop();
        let board = render(session.state(), 0);
        assert_eq!(board.matches('<').count(), path.len());
    }

    #[test]
    fn countdown_redraws_on_milestones() {
        let generator = RoundGenerator::new(WordsList::builtin(), 10).unwrap();
        let mut session = Session::new(
            generator,
            Facts::default(),
            GameConfig::default(),
            StdRng::seed_from_u64(4),
        );
        session.start();

        let mut previous = session.state().clone();
        assert!(worth_redrawing(None, &previous));
        assert!(!worth_redrawing(Some(&previous), &previous));

        let mut redrawn = Vec::new();
        for _ in 0..59 {
            session.tick();
            let current = session.state().clone();
            if worth_redrawing(Some(&previous), &current) {
                redrawn.push(current.time_remaining);
            }
            previous = current;
        }

        // 10 also reveals the hint
        assert_eq!(redrawn, vec![50, 40, 30, 20, 10, 5, 4, 3, 2, 1]);

        let path = previous.round.target().path().to_vec();
        session.press(path[0]);
        assert!(worth_redrawing(Some(&previous), session.state()));
    }
}
