use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Three-valued answer for queries that are not always decidable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OptionalBool {
    True,
    False,
    Unknown,
}

impl OptionalBool {
    pub fn of(value: bool) -> Self {
        if value {
            OptionalBool::True
        } else {
            OptionalBool::False
        }
    }

    pub fn is_true(self) -> bool {
        self == OptionalBool::True
    }

    pub fn is_false(self) -> bool {
        self == OptionalBool::False
    }

    pub fn is_unknown(self) -> bool {
        self == OptionalBool::Unknown
    }

    pub fn is_possibly_true(self) -> bool {
        !self.is_false()
    }
}

impl From<bool> for OptionalBool {
    fn from(value: bool) -> Self {
        OptionalBool::of(value)
    }
}

impl fmt::Display for OptionalBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionalBool::True => write!(f, "true"),
            OptionalBool::False => write!(f, "false"),
            OptionalBool::Unknown => write!(f, "unknown"),
        }
    }
}

/// Hashes the allocation address of an interned value.
///
/// Interned values are compared by identity, so their hash must agree.
pub(crate) fn hash_ptr<T: ?Sized, H: Hasher>(arc: &Arc<T>, state: &mut H) {
    (Arc::as_ptr(arc) as *const () as usize).hash(state)
}
