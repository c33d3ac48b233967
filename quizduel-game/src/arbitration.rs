//! Host-side rules: who answers, what a round is worth, who won.

use crate::message::NO_ANSWER;
use crate::state::ScoreBoard;
use quizduel_core::{GameConfig, Outcome, Question, QuestionBank, Role};
use rand::seq::SliceRandom;
use rand::Rng;

pub const CORRECT_BASE_POINTS: u32 = 100;
pub const POINTS_PER_SECOND_LEFT: u32 = 10;
pub const CONSOLATION_POINTS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidResolution {
    pub winner: Role,
    pub winning_bid: u32,
    pub tie: bool,
}

/// Lower bid wins the right to answer; equal bids are a coin flip
pub fn resolve_bids<R: Rng + ?Sized>(host_bid: u32, client_bid: u32, rng: &mut R) -> BidResolution {
    let (winner, tie) = if host_bid < client_bid {
        (Role::Host, false)
    } else if client_bid < host_bid {
        (Role::Client, false)
    } else if rng.gen_bool(0.5) {
        (Role::Host, true)
    } else {
        (Role::Client, true)
    };

    let winning_bid = match winner {
        Role::Host => host_bid,
        Role::Client => client_bid,
    };

    BidResolution {
        winner,
        winning_bid,
        tie,
    }
}

/// What the active player handed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Answer(usize),
    NoAnswer,
}

impl Submission {
    pub fn from_wire(answer_index: i32) -> Self {
        usize::try_from(answer_index)
            .map(Submission::Answer)
            .unwrap_or(Submission::NoAnswer)
    }

    pub fn to_wire(self) -> i32 {
        match self {
            Submission::Answer(index) => i32::try_from(index).unwrap_or(NO_ANSWER),
            Submission::NoAnswer => NO_ANSWER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub points: u32,
    pub credited: Role,
}

/// Correct: `100 + 10 * time left` to the active side.
/// Wrong or no answer: 25 to the other side.
pub fn score_answer(
    question: &Question,
    submission: Submission,
    time_remaining: u32,
    active: Role,
) -> Verdict {
    let correct = submission == Submission::Answer(question.correct_option_index);

    if correct {
        Verdict {
            correct,
            points: CORRECT_BASE_POINTS
                .saturating_add(POINTS_PER_SECOND_LEFT.saturating_mul(time_remaining)),
            credited: active,
        }
    } else {
        Verdict {
            correct,
            points: CONSOLATION_POINTS,
            credited: active.opponent(),
        }
    }
}

pub fn decide_winner(scores: &ScoreBoard) -> Outcome {
    use std::cmp::Ordering;

    match scores.host_score.cmp(&scores.client_score) {
        Ordering::Greater => Outcome::Host,
        Ordering::Less => Outcome::Client,
        Ordering::Equal => Outcome::Draw,
    }
}

/// Question bound to a 1-based round, `None` when the sequence ran out
pub fn question_for_round(questions: &[Question], round: u32) -> Option<&Question> {
    let index = usize::try_from(round.checked_sub(1)?).ok()?;
    questions.get(index)
}

/// Draw the match's questions once: filter by category, shuffle, truncate
pub fn select_questions<R: Rng + ?Sized>(
    bank: &QuestionBank,
    config: &GameConfig,
    rng: &mut R,
) -> Vec<Question> {
    let mut questions = bank.eligible(config);
    questions.shuffle(rng);
    questions.truncate(config.total_rounds as usize);
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(correct: usize) -> Question {
        Question {
            category: "geography".to_string(),
            prompt: "Largest ocean?".to_string(),
            answer_options: vec![
                "Atlantic".to_string(),
                "Indian".to_string(),
                "Arctic".to_string(),
                "Pacific".to_string(),
            ],
            correct_option_index: correct,
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Host), Just(Role::Client)]
    }

    proptest! {
        /// Property: with distinct bids the lower bid always wins and sets the countdown
        #[test]
        fn prop_lower_bid_wins(a in 1u32..=30, b in 1u32..=30, seed in any::<u64>()) {
            prop_assume!(a != b);
            let mut rng = StdRng::seed_from_u64(seed);
            let resolution = resolve_bids(a, b, &mut rng);

            let expected = if a < b { Role::Host } else { Role::Client };
            prop_assert_eq!(resolution.winner, expected);
            prop_assert_eq!(resolution.winning_bid, a.min(b));
            prop_assert!(!resolution.tie);
        }

        /// Property: correct answers pay 100 + 10/s to the active side,
        /// anything else pays 25 to the other side
        #[test]
        fn prop_scoring_rule(
            correct in 0usize..4,
            submitted in -1i32..4,
            time_left in 0u32..=30,
            active in role_strategy(),
        ) {
            let verdict = score_answer(&question(correct), Submission::from_wire(submitted), time_left, active);

            if submitted == correct as i32 {
                prop_assert!(verdict.correct);
                prop_assert_eq!(verdict.points, 100 + 10 * time_left);
                prop_assert_eq!(verdict.credited, active);
            } else {
                prop_assert!(!verdict.correct);
                prop_assert_eq!(verdict.points, 25);
                prop_assert_eq!(verdict.credited, active.opponent());
            }
        }

        /// Property: the winner is whoever holds more points, equal is a draw
        #[test]
        fn prop_winner_determination(host in 0u32..5000, client in 0u32..5000) {
            let outcome = decide_winner(&ScoreBoard::new(host, client));
            let expected = if host > client {
                Outcome::Host
            } else if client > host {
                Outcome::Client
            } else {
                Outcome::Draw
            };
            prop_assert_eq!(outcome, expected);
        }
    }

    #[test]
    fn test_tie_break_is_roughly_fair() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let trials = 10_000;
        let host_wins = (0..trials)
            .filter(|_| {
                let resolution = resolve_bids(12, 12, &mut rng);
                assert!(resolution.tie);
                assert_eq!(resolution.winning_bid, 12);
                resolution.winner == Role::Host
            })
            .count();

        let ratio = host_wins as f64 / trials as f64;
        assert!((0.45..=0.55).contains(&ratio), "host won {ratio} of ties");
    }

    #[test]
    fn test_timeout_sentinel() {
        assert_eq!(Submission::from_wire(-1), Submission::NoAnswer);
        assert_eq!(Submission::from_wire(-7), Submission::NoAnswer);
        assert_eq!(Submission::from_wire(2), Submission::Answer(2));
        assert_eq!(Submission::NoAnswer.to_wire(), -1);

        let verdict = score_answer(&question(3), Submission::NoAnswer, 0, Role::Client);
        assert_eq!(
            verdict,
            Verdict {
                correct: false,
                points: 25,
                credited: Role::Host
            }
        );
    }

    #[test]
    fn test_question_lookup_out_of_range() {
        let questions = vec![question(0), question(1)];
        assert_eq!(question_for_round(&questions, 1), Some(&questions[0]));
        assert_eq!(question_for_round(&questions, 2), Some(&questions[1]));
        assert!(question_for_round(&questions, 3).is_none());
        assert!(question_for_round(&questions, 0).is_none());
    }

    #[test]
    fn test_select_questions_without_replacement() {
        let bank = QuestionBank::bundled().unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = select_questions(&bank, &GameConfig::new(5, "all"), &mut rng);
        assert_eq!(picked.len(), 5);
        for (i, q) in picked.iter().enumerate() {
            assert!(!picked[i + 1..].contains(q), "question drawn twice");
        }

        let history = select_questions(&bank, &GameConfig::new(10, "history"), &mut rng);
        assert!(history.len() < 10);
        assert!(history.iter().all(|q| q.category == "history"));
    }
}
