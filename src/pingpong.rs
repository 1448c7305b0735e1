//! Two-slot ping-pong storage.
//!
//! A simulation step reads the current slot and writes the other one, then
//! calls [`PingPong::swap`]. The step counter advances with each swap so
//! callers can tell how many steps a slot pair has been through.

/// Which of the two slots is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// The other slot.
    #[inline]
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    /// Slot index, `0` for `A` and `1` for `B`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// A pair of equally-shaped values with a movable "current" marker.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    current: Slot,
    steps: u64,
}

impl<T> PingPong<T> {
    /// Create a pair with `a` as the current slot.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: Slot::A,
            steps: 0,
        }
    }

    /// Slot holding the latest state.
    #[inline]
    pub fn current(&self) -> Slot {
        self.current
    }

    /// Slot the next step writes to.
    #[inline]
    pub fn target(&self) -> Slot {
        self.current.other()
    }

    /// Number of completed swaps.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    /// Latest state.
    pub fn front(&self) -> &T {
        self.get(self.current)
    }

    /// Split into `(current, target)` for a read-one-write-other step.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        match self.current {
            Slot::A => (&*a, b),
            Slot::B => (&*b, a),
        }
    }

    /// Make the target slot current and count the step.
    pub fn swap(&mut self) {
        self.current = self.current.other();
        self.steps += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_alternates() {
        let mut pp = PingPong::new("a", "b");
        assert_eq!(pp.current(), Slot::A);
        assert_eq!(pp.target(), Slot::B);
        assert_eq!(*pp.front(), "a");

        pp.swap();
        assert_eq!(pp.current(), Slot::B);
        assert_eq!(*pp.front(), "b");
        assert_eq!(pp.steps(), 1);

        pp.swap();
        assert_eq!(pp.current(), Slot::A);
        assert_eq!(pp.steps(), 2);
    }

    #[test]
    fn test_split_reads_current_writes_target() {
        let mut pp = PingPong::new(vec![1, 2], vec![0, 0]);
        {
            let (src, dst) = pp.split();
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s * 10;
            }
        }
        pp.swap();
        assert_eq!(pp.front(), &vec![10, 20]);
        assert_eq!(pp.get(Slot::A), &vec![1, 2]);
    }
}
