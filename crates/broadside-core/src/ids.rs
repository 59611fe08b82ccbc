//! Identifier newtypes.
//!
//! Every id is a thin wrapper over an unsigned integer. Ordering follows the
//! numeric value, which keeps iteration over id-keyed collections stable.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wraps a raw value.
            #[must_use]
            pub const fn new(id: $inner) -> Self {
                Self(id)
            }

            /// Returns the raw value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self::new(id)
            }
        }
    };
}

id_newtype!(
    /// Identifies one match.
    MatchId(u64)
);

id_newtype!(
    /// Identifies a player within a match.
    PlayerId(u32)
);

id_newtype!(
    /// Identifies a ship within its owner's fleet.
    ShipId(u32)
);

id_newtype!(
    /// Identifies an ability within its ship.
    AbilityId(u32)
);

id_newtype!(
    /// Identifies a recorded game event. Monotonic within a match.
    EventId(u64)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_value() {
        assert!(PlayerId::new(1) < PlayerId::new(2));
        assert_eq!(ShipId::from(7).get(), 7);
    }

    #[test]
    fn debug_and_display() {
        assert_eq!(format!("{:?}", MatchId::new(3)), "MatchId(3)");
        assert_eq!(format!("{}", EventId::new(9)), "9");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&AbilityId::new(4)).unwrap();
        assert_eq!(json, "4");
        let back: AbilityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AbilityId::new(4));
    }
}
