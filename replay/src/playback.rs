//! Read-only cursor over a finished battle

use vpet_battle::{BattleResult, DigimonStatus, Side, TurnLog};

/// Walks the turn log of a result. Position 0 is the state before the
/// first turn; position `n` is the state after turn `n`.
#[derive(Debug, Clone)]
pub struct Replay<'a> {
    result: &'a BattleResult,
    position: usize,
}

impl<'a> Replay<'a> {
    pub fn new(result: &'a BattleResult) -> Self {
        Self {
            result,
            position: 0,
        }
    }

    pub fn result(&self) -> &'a BattleResult {
        self.result
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Turn most recently played, `None` before the first
    pub fn current(&self) -> Option<&'a TurnLog> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.result.battle_log.get(index))
    }

    /// Step forward one turn and return it
    pub fn advance(&mut self) -> Option<&'a TurnLog> {
        if self.is_finished() {
            return None;
        }
        self.position += 1;
        self.current()
    }

    /// Step back one turn. Returns `false` when already at the start.
    pub fn rewind(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Jump to after `turn`, clamped to the last turn
    pub fn seek(&mut self, turn: usize) -> Option<&'a TurnLog> {
        self.position = turn.min(self.result.turns());
        self.current()
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.result.turns()
    }

    /// Statuses of `side` after `turn` (1-based). The log keeps no
    /// pre-battle snapshot, so turn 0 gives `None`.
    pub fn statuses_at(&self, side: Side, turn: usize) -> Option<&'a [DigimonStatus]> {
        if turn == 0 {
            return None;
        }
        self.result
            .battle_log
            .get(turn - 1)
            .map(|log| log.status(side))
    }
}

impl<'a> Iterator for Replay<'a> {
    type Item = &'a TurnLog;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpet_battle::{Attribute, BattleSimulator, Digimon, Protocol};

    fn result() -> BattleResult {
        let a = Digimon::new("Gabumon", Attribute::Data, 90, 8);
        let b = Digimon::new("Patamon", Attribute::Vaccine, 90, 8);
        BattleSimulator::new()
            .simulate_seeded(&a, &b, Protocol::DmcBs, 21)
            .unwrap()
    }

    #[test]
    fn test_walks_every_turn() {
        let result = result();
        let mut replay = Replay::new(&result);

        assert!(replay.current().is_none());
        let mut turns = 0;
        while let Some(turn) = replay.advance() {
            turns += 1;
            assert_eq!(turn.turn as usize, turns);
        }
        assert_eq!(turns, 5);
        assert!(replay.is_finished());
        assert!(replay.advance().is_none());
        assert_eq!(replay.position(), 5);
    }

    #[test]
    fn test_rewind_and_seek() {
        let result = result();
        let mut replay = Replay::new(&result);

        assert!(!replay.rewind());
        assert_eq!(replay.seek(3).map(|t| t.turn), Some(3));
        assert!(replay.rewind());
        assert_eq!(replay.current().map(|t| t.turn), Some(2));
        assert_eq!(replay.seek(99).map(|t| t.turn), Some(5));
        assert!(replay.is_finished());
        assert!(replay.seek(0).is_none());
    }

    #[test]
    fn test_statuses_at() {
        let result = result();
        let replay = Replay::new(&result);

        assert!(replay.statuses_at(Side::Device1, 0).is_none());
        let last = replay.statuses_at(Side::Device2, 5).unwrap();
        assert_eq!(last, result.final_status(Side::Device2));
        assert!(replay.statuses_at(Side::Device1, 6).is_none());
    }

    #[test]
    fn test_iterator_matches_log() {
        let result = result();
        let collected: Vec<_> = Replay::new(&result).collect();
        assert_eq!(collected.len(), result.turns());
        assert_eq!(collected[0], &result.battle_log[0]);
    }
}
