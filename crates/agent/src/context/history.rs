//! Bounded chat history.
//!
//! The history holds at most `max_exchanges` user/model pairs. Appends trim
//! the oldest pairs first, and a change of operation mode starts over.

use inkwell_core::{ChatTurn, TurnRole};

use crate::mode::OperationMode;

/// Ordered chat turns for one drafting surface.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
    max_exchanges: usize,
    mode: Option<OperationMode>,
}

impl ChatHistory {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_exchanges: max_exchanges.max(1),
            mode: None,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_exchanges(&self) -> usize {
        self.max_exchanges
    }

    pub fn mode(&self) -> Option<OperationMode> {
        self.mode
    }

    /// Append one turn and trim.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        trim_to(&mut self.turns, self.max_exchanges);
    }

    /// Append a completed user/model exchange and trim, as one mutation.
    pub fn push_exchange(&mut self, user: ChatTurn, model: ChatTurn) {
        debug_assert_eq!(user.role, TurnRole::User);
        debug_assert_eq!(model.role, TurnRole::Model);
        self.turns.push(user);
        self.turns.push(model);
        trim_to(&mut self.turns, self.max_exchanges);
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Record the mode of the next request. Returns `true` when the mode
    /// changed and the history was cleared.
    pub fn switch_mode(&mut self, mode: OperationMode) -> bool {
        let changed = self.mode.is_some_and(|current| current != mode);
        if changed {
            self.turns.clear();
        }
        self.mode = Some(mode);
        changed
    }

    /// A working copy of the history with `turn` appended, trimmed to the
    /// window. The stored history is not touched.
    pub fn window_with(&self, turn: ChatTurn) -> Vec<ChatTurn> {
        let mut window = self.turns.clone();
        window.push(turn);
        trim_to(&mut window, self.max_exchanges);
        window
    }
}

/// Evict the oldest pairs until at most `2 * max_exchanges` turns remain.
fn trim_to(turns: &mut Vec<ChatTurn>, max_exchanges: usize) {
    let max_turns = max_exchanges * 2;
    while turns.len() > max_turns {
        let n = turns.len().min(2);
        turns.drain(..n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(turns: &[ChatTurn]) -> Vec<&str> {
        turns.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn five_pairs_with_max_two_keeps_the_last_two() {
        let mut history = ChatHistory::new(2);
        for i in 1..=5 {
            history.push(ChatTurn::user(format!("u{i}")));
            history.push(ChatTurn::model(format!("m{i}")));
        }
        assert_eq!(texts(history.turns()), vec!["u4", "m4", "u5", "m5"]);
    }

    #[test]
    fn never_exceeds_twice_the_window() {
        for max in 1..=4 {
            let mut history = ChatHistory::new(max);
            for i in 0..12 {
                if i % 3 == 0 {
                    history.push(ChatTurn::user(format!("u{i}")));
                } else {
                    history.push_exchange(ChatTurn::user("q"), ChatTurn::model("a"));
                }
                assert!(history.len() <= 2 * max);
            }
        }
    }

    #[test]
    fn window_copy_leaves_history_alone() {
        let mut history = ChatHistory::new(1);
        history.push_exchange(ChatTurn::user("old"), ChatTurn::model("reply"));

        let window = history.window_with(ChatTurn::user("new"));
        assert_eq!(texts(&window), vec!["new"]);
        assert_eq!(texts(history.turns()), vec!["old", "reply"]);
    }

    #[test]
    fn mode_switch_clears() {
        let mut history = ChatHistory::new(3);
        assert!(!history.switch_mode(OperationMode::Draft));
        history.push_exchange(ChatTurn::user("q"), ChatTurn::model("a"));

        assert!(!history.switch_mode(OperationMode::Draft));
        assert_eq!(history.len(), 2);

        assert!(history.switch_mode(OperationMode::Critique));
        assert!(history.is_empty());
        assert_eq!(history.mode(), Some(OperationMode::Critique));
    }

    #[test]
    fn zero_window_is_clamped() {
        let mut history = ChatHistory::new(0);
        history.push_exchange(ChatTurn::user("q"), ChatTurn::model("a"));
        assert_eq!(history.max_exchanges(), 1);
        assert_eq!(history.len(), 2);
    }
}
