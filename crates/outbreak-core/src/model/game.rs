use crate::model::turn::TurnRecord;
use serde::{Deserialize, Serialize};

/// Per-game facts the engine needs from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMeta {
    pub id: u64,
    /// Funded-event cards shuffled into the player deck for this game.
    pub funding_rate: u32,
    /// The turn currently in progress; −1 while still in setup.
    pub turn_num: i32,
}

impl GameMeta {
    pub const fn in_setup(&self) -> bool {
        self.turn_num == -1
    }
}

/// Seam to the external event-log collaborator. Implementations return
/// the recorded turns for a game, ascending by turn number, up to and
/// including the game's current turn.
pub trait TurnSource {
    fn turns_up_to(&self, game: &GameMeta) -> Vec<TurnRecord>;
}

/// Event log already held in memory by the host.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLog {
    turns: Vec<TurnRecord>,
}

impl InMemoryLog {
    pub fn new(mut turns: Vec<TurnRecord>) -> Self {
        turns.sort_by_key(|turn| turn.turn_num);
        Self { turns }
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }
}

impl TurnSource for InMemoryLog {
    fn turns_up_to(&self, game: &GameMeta) -> Vec<TurnRecord> {
        self.turns
            .iter()
            .filter(|turn| turn.turn_num <= game.turn_num)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{GameMeta, InMemoryLog, TurnSource};
    use crate::model::turn::TurnRecord;

    #[test]
    fn log_sorts_and_bounds_turns() {
        let log = InMemoryLog::new(vec![
            TurnRecord::new(2),
            TurnRecord::new(-1),
            TurnRecord::new(0),
            TurnRecord::new(1),
        ]);
        let meta = GameMeta {
            id: 1,
            funding_rate: 4,
            turn_num: 1,
        };
        let turns = log.turns_up_to(&meta);
        let numbers: Vec<i32> = turns.iter().map(|turn| turn.turn_num).collect();
        assert_eq!(numbers, vec![-1, 0, 1]);
    }

    #[test]
    fn setup_query_sees_only_the_setup_turn() {
        let log = InMemoryLog::new(vec![TurnRecord::new(-1), TurnRecord::new(0)]);
        let meta = GameMeta {
            id: 1,
            funding_rate: 0,
            turn_num: -1,
        };
        assert_eq!(log.turns_up_to(&meta).len(), 1);
    }
}
