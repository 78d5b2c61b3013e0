//! Light phases, lamp patterns and the wire codes reported for each phase.

/// One of the three lamps of a signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lamp {
    Red,
    Yellow,
    Green,
}

/// On/off assignment for all three lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LampPattern {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LampPattern {
    /// All lamps off.
    pub const DARK: Self = Self::new(false, false, false);

    /// Creates a pattern from the red, yellow and green levels.
    #[inline]
    pub const fn new(red: bool, yellow: bool, green: bool) -> Self {
        Self { red, yellow, green }
    }

    /// Returns whether `lamp` is lit in this pattern.
    #[inline]
    pub const fn is_lit(&self, lamp: Lamp) -> bool {
        match lamp {
            Lamp::Red => self.red,
            Lamp::Yellow => self.yellow,
            Lamp::Green => self.green,
        }
    }

    /// Returns a copy with `lamp` switched to `on`.
    #[inline]
    pub const fn with(mut self, lamp: Lamp, on: bool) -> Self {
        match lamp {
            Lamp::Red => self.red = on,
            Lamp::Yellow => self.yellow = on,
            Lamp::Green => self.green = on,
        }
        self
    }
}

/// A phase of the light cycle.
///
/// The normal cycle is `Red -> RedYellow -> Green -> GreenBlinking -> Yellow`
/// and wraps back to `Red`. `YellowBlinking` is the fault phase: it is only
/// entered when the reporting link is lost (or startup fails) and is never
/// produced by [`Phase::next`].
///
/// The discriminants are the codes reported over the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Phase {
    Red = 0b1110,
    RedYellow = 0b1101,
    Green = 0b0010,
    GreenBlinking = 0b0101,
    Yellow = 0b1000,
    YellowBlinking = 0b0001,
}

impl Phase {
    /// The normal cycle in visiting order.
    pub const CYCLE: [Phase; 5] = [
        Phase::Red,
        Phase::RedYellow,
        Phase::Green,
        Phase::GreenBlinking,
        Phase::Yellow,
    ];

    /// First phase of the cycle, also where the cycle restarts after a fault.
    pub const FIRST: Phase = Phase::Red;

    /// Code transmitted when this phase is entered.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up the phase a reported code stands for.
    pub const fn from_code(code: u8) -> Option<Phase> {
        match code {
            0b1110 => Some(Phase::Red),
            0b1101 => Some(Phase::RedYellow),
            0b0010 => Some(Phase::Green),
            0b0101 => Some(Phase::GreenBlinking),
            0b1000 => Some(Phase::Yellow),
            0b0001 => Some(Phase::YellowBlinking),
            _ => None,
        }
    }

    /// Successor in the normal cycle.
    ///
    /// The fault phase has no place in the cycle; leaving it restarts the
    /// cycle from [`Phase::FIRST`].
    pub const fn next(self) -> Phase {
        match self {
            Phase::Red => Phase::RedYellow,
            Phase::RedYellow => Phase::Green,
            Phase::Green => Phase::GreenBlinking,
            Phase::GreenBlinking => Phase::Yellow,
            Phase::Yellow => Phase::Red,
            Phase::YellowBlinking => Phase::FIRST,
        }
    }

    /// Returns true for the fault phase.
    #[inline]
    pub const fn is_fault(self) -> bool {
        matches!(self, Phase::YellowBlinking)
    }

    /// The lamp that oscillates during a blinking phase.
    pub const fn blinking_lamp(self) -> Option<Lamp> {
        match self {
            Phase::GreenBlinking => Some(Lamp::Green),
            Phase::YellowBlinking => Some(Lamp::Yellow),
            _ => None,
        }
    }

    /// Pattern applied when the phase is entered.
    ///
    /// Blinking phases start with their blinking lamp lit and everything else
    /// dark.
    pub const fn pattern(self) -> LampPattern {
        match self {
            Phase::Red => LampPattern::new(true, false, false),
            Phase::RedYellow => LampPattern::new(true, true, false),
            Phase::Green => LampPattern::new(false, false, true),
            Phase::GreenBlinking => LampPattern::new(false, false, true),
            Phase::Yellow => LampPattern::new(false, true, false),
            Phase::YellowBlinking => LampPattern::new(false, true, false),
        }
    }
}

/// Cyclic successor function of the normal light cycle.
#[inline]
pub const fn advance(current: Phase) -> Phase {
    current.next()
}

/// Reconstructs the lamp pattern a receiver should show for a reported code.
///
/// Returns `None` for bytes that are not phase codes.
pub const fn decode_outputs_from_code(code: u8) -> Option<LampPattern> {
    match Phase::from_code(code) {
        Some(phase) => Some(phase.pattern()),
        None => None,
    }
}
