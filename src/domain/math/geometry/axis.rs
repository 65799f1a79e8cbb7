use serde::Deserialize;

/// Coordinate axis tag. Doubles as the kd-tree splitting-axis marker and
/// as the major-axis selector for axis-aligned cylinders.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Axis {
    #[default]
    #[serde(alias = "x")]
    X,
    #[serde(alias = "y")]
    Y,
    #[serde(alias = "z")]
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The two axes orthogonal to this one, in canonical order.
    #[inline]
    pub fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl TryFrom<u8> for Axis {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_others_succeeds() {
        assert_eq!(Axis::X.others(), (Axis::Y, Axis::Z));
        assert_eq!(Axis::Y.others(), (Axis::X, Axis::Z));
        assert_eq!(Axis::Z.others(), (Axis::X, Axis::Y));
    }

    #[test]
    fn axis_try_from_fails_when_out_of_range() {
        assert!(matches!(Axis::try_from(1), Ok(Axis::Y)));
        assert!(Axis::try_from(3).is_err());
    }
}
