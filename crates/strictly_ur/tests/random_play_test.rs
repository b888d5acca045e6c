//! Property checks over randomly played games of every preset.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use strictly_ur::invariants::{InvariantSet, PositionInvariants};
use strictly_ur::{Dice, GameSettings, GameState, Move, Player, RuleSet, WaitingForMove};

const GAMES_PER_PRESET: u64 = 20;

fn presets() -> Vec<GameSettings> {
    vec![
        GameSettings::finkel(),
        GameSettings::masters(),
        GameSettings::murray(),
        GameSettings::blitz(),
        GameSettings::aseb(),
    ]
}

fn check_offered_moves(rules: &RuleSet, state: &WaitingForMove) {
    let board = state.position().board();
    for mv in state.moves() {
        assert_eq!(mv.mover(), state.position().turn());
        if let Some(dest) = mv.dest() {
            if let Some(occupant) = board.get(dest) {
                assert_ne!(occupant.owner, mv.mover(), "landed on own piece: {}", mv);
                if *rules.settings().safe_rosettes() {
                    assert!(!rules.shape().is_rosette(dest), "captured on a rosette: {}", mv);
                }
            }
        }
        if let Some(captured) = mv.captured_piece() {
            assert_eq!(captured.owner, mv.mover().opponent());
        }
    }
}

/// Applies every offered move and regenerates moves for the successor.
fn check_successors(rules: &RuleSet, state: &WaitingForMove) {
    for mv in state.moves() {
        let states = rules.apply_move(state, mv).expect("offered move applies");
        let next = states.last().expect("chain has a next state");
        PositionInvariants::check_all(rules, next.position()).expect("invariants hold");
        if let GameState::WaitingForRoll(waiting) = next {
            for roll in 1..=*rules.settings().dice_count() {
                let position = waiting.position();
                rules
                    .find_available_moves(position.board(), position.turn_player(), roll)
                    .expect("moves regenerate");
            }
        }
    }
}

fn play_random_game(rules: &RuleSet, seed: u64) -> (Player, usize) {
    let mut dice = rules.create_dice(StdRng::seed_from_u64(seed));
    let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(7));
    let mut state = rules.generate_initial_game_state();
    let mut moves_played = 0;

    loop {
        PositionInvariants::check_all(rules, state.position()).expect("invariants hold");
        let mut chain = match &state {
            GameState::WaitingForRoll(waiting) => {
                rules.apply_roll(waiting, dice.roll()).expect("roll applies")
            }
            GameState::WaitingForMove(waiting) => {
                check_offered_moves(rules, waiting);
                check_successors(rules, waiting);
                let mv: Move = *waiting.moves().choose(&mut rng).expect("non-empty moves");
                moves_played += 1;
                rules.apply_move(waiting, &mv).expect("move applies")
            }
            GameState::Win(win) => return (win.winner(), moves_played),
            other => panic!("Unexpected state: {}", other),
        };
        assert_eq!(chain.len(), 2);
        state = chain.pop().expect("chain has a next state");
    }
}

#[test]
fn test_random_games_preserve_invariants() {
    for settings in presets() {
        let rules = RuleSet::new(settings).expect("valid preset");
        for seed in 0..GAMES_PER_PRESET {
            let (winner, moves) = play_random_game(&rules, seed);
            let pieces = usize::from(*settings.starting_pieces());
            assert!(moves >= pieces, "{} won after {} moves", winner, moves);
        }
    }
}

#[test]
fn test_games_on_separate_threads_are_independent() {
    let rules = RuleSet::new(GameSettings::finkel()).expect("valid preset");
    let sequential: Vec<(Player, usize)> = (0..8).map(|seed| play_random_game(&rules, seed)).collect();

    let parallel: Vec<(Player, usize)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|seed| {
                let rules = &rules;
                scope.spawn(move || play_random_game(rules, seed))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread finished"))
            .collect()
    });

    assert_eq!(sequential, parallel);
}
