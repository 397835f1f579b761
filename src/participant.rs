use crate::card::Hand;
use crate::color::CardColor;
use crate::map::{Destination, Map};
use crate::moves::Move;
use crate::player::PlayerView;

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Every call to a participant has the same `Result`:
/// either it succeeded with an answer, or it failed, which includes a human-readable reason.
pub type PlayerResponse<T> = Result<T, String>;

/// Anything that can take part in games and tournaments: a local strategy, a remote proxy, etc.
///
/// Any call can fail. Failing to `setup`, `pick` or `play` gets the participant excluded;
/// failures of the other calls are ignored.
pub trait Participant {
    fn name(&self) -> &str;

    /// Called once per game, before anything else.
    fn setup(&mut self, map: &Map, rails: u32, cards: &Hand) -> PlayerResponse<()>;

    /// Given the offered destinations, returns the ones the participant does *not* want.
    /// Exactly two destinations must be kept.
    fn pick(&mut self, offered: &BTreeSet<Destination>) -> PlayerResponse<BTreeSet<Destination>>;

    /// Called once per turn.
    fn play(&mut self, view: &PlayerView) -> PlayerResponse<Move>;

    /// Cards drawn after a [`Move::DrawCards`].
    fn more(&mut self, cards: &[CardColor]) -> PlayerResponse<()>;

    /// Called at the end of every game the participant was not excluded from.
    fn win(&mut self, won: bool) -> PlayerResponse<()>;

    /// Called once per tournament. Returns the map this participant would like to play on, if any.
    fn start(&mut self) -> PlayerResponse<Option<Map>>;

    /// Called at the end of a tournament, for the winners only.
    fn end(&mut self, won: bool) -> PlayerResponse<()>;

    fn excluded_from_game(&mut self, _reason: &str) -> PlayerResponse<()> {
        Ok(())
    }

    fn excluded_from_tournament(&mut self, _reason: &str) -> PlayerResponse<()> {
        Ok(())
    }
}

/// Calls into a participant, turning a panic into an `Err` the same way a failure is.
pub fn call_through<P, T, F>(participant: &mut P, call: F) -> PlayerResponse<T>
where
    P: Participant + ?Sized,
    F: FnOnce(&mut P) -> PlayerResponse<T>,
{
    match catch_unwind(AssertUnwindSafe(|| call(participant))) {
        Ok(response) => response,
        Err(panic) => Err(panic
            .downcast_ref::<&str>()
            .map(|reason| reason.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("participant panicked"))),
    }
}
