//! Type-safe identifiers for network entities.
//!
//! All identifiers wrap the integer row id assigned by the store, so a
//! `LineId` can never be passed where a `StopId` is expected.

use std::fmt;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self::new(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

impl_identifier!(LineId);
impl_identifier!(StopId);
impl_identifier!(CategoryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality() {
        let id1 = StopId::new(42);
        let id2 = StopId::from(42);

        assert_eq!(id1, id2);
        assert_ne!(id1, StopId::new(43));
    }

    #[test]
    fn test_identifier_hash() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(LineId::new(7), "Métro A");

        assert_eq!(map.get(&LineId::new(7)), Some(&"Métro A"));
    }

    #[test]
    fn test_identifier_display() {
        let id = LineId::new(12);
        assert_eq!(format!("{}", id), "12");
    }

    #[test]
    fn test_identifier_conversions() {
        let id: CategoryId = 3.into();
        let raw: i64 = id.into();
        assert_eq!(raw, 3);
    }
}
