/// What one `update` did to the episode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// no detection, none ongoing
    Quiet,
    /// new episode; the count went up
    Rising,
    /// episode continues; no change
    Sustained,
    /// episode ended
    Falling,
}

/// Transition table of the episode automaton: (active, hit) -> (active', edge).
pub const fn step(active: bool, hit: bool) -> (bool, Edge) {
    match (active, hit) {
        (false, false) => (false, Edge::Quiet),
        (false, true) => (true, Edge::Rising),
        (true, true) => (true, Edge::Sustained),
        (true, false) => (false, Edge::Falling),
    }
}

/// Edge-triggered intrusion counter: one count per continuous episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntrusionTracker {
    active: bool,
    count: u64,
}

impl IntrusionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn update(&mut self, any_region_inside_zone: bool) -> Edge {
        let (active, edge) = step(self.active, any_region_inside_zone);
        self.active = active;
        if edge == Edge::Rising {
            self.count += 1;
        }
        edge
    }

    /// End an ongoing episode without counting; used when re-arming.
    pub fn end_episode(&mut self) {
        self.active = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
