//! ComboGate: Closed | Open(allowed follow-up names).
//!
//! Closed → Open на ComboWindow begin (имена = follow-ups текущей атаки).
//! Open → Closed на ComboWindow end или успешном chain (что раньше).
//! Пустой список follow-ups: окно физически открыто, но gate фактически закрыт.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboGateState {
    Closed,
    Open(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboGate {
    window_open: bool,
    allowed: Vec<String>,
}

impl ComboGate {
    pub fn open(&mut self, follow_ups: &[String]) {
        self.window_open = true;
        self.allowed = follow_ups.to_vec();
    }

    /// ComboWindow end без chain'а.
    pub fn close(&mut self) {
        self.window_open = false;
        self.allowed.clear();
    }

    /// Успешный chain: один на окно.
    pub fn consume(&mut self) {
        self.close();
    }

    /// Можно ли сейчас chain'ить.
    pub fn is_open(&self) -> bool {
        self.window_open && !self.allowed.is_empty()
    }

    pub fn window_open(&self) -> bool {
        self.window_open
    }

    pub fn allowed_names(&self) -> &[String] {
        &self.allowed
    }

    pub fn state(&self) -> ComboGateState {
        if self.is_open() {
            ComboGateState::Open(self.allowed.clone())
        } else {
            ComboGateState::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_open_then_end_without_chain() {
        let mut gate = ComboGate::default();
        assert_eq!(gate.state(), ComboGateState::Closed);

        gate.open(&names(&["A"]));
        assert_eq!(gate.state(), ComboGateState::Open(names(&["A"])));

        gate.close();
        assert_eq!(gate.state(), ComboGateState::Closed);
        assert!(gate.allowed_names().is_empty());
    }

    #[test]
    fn test_empty_follow_ups_effectively_closed() {
        let mut gate = ComboGate::default();
        gate.open(&[]);

        assert!(gate.window_open());
        assert!(!gate.is_open());
        assert_eq!(gate.state(), ComboGateState::Closed);
    }

    #[test]
    fn test_consume_closes_immediately() {
        let mut gate = ComboGate::default();
        gate.open(&names(&["A", "B"]));
        gate.consume();

        assert!(!gate.is_open());
        assert!(!gate.window_open());
    }
}
