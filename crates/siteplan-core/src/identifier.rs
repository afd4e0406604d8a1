//! Space identifiers backed by string interning.
//!
//! Placement search copies identifiers into every candidate it builds, so
//! [`SpaceId`] is a `Copy` symbol into a process-wide interner rather than an
//! owned string.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

use serde::{Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// Access is serialized through a `Mutex`. A poisoned lock is recovered since
/// the interner is append-only and cannot be left half-updated.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Interned identifier of a configured space or fixed zone.
///
/// # Examples
///
/// ```
/// use siteplan_core::identifier::SpaceId;
///
/// let cutting = SpaceId::new("cutting");
/// let same = SpaceId::new("cutting");
///
/// assert_eq!(cutting, same);
/// assert_eq!(cutting, "cutting");
/// assert_eq!(cutting.to_string(), "cutting");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(DefaultSymbol);

impl SpaceId {
    /// Creates a `SpaceId` from a string slice.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the identifier text.
    pub fn as_string(&self) -> String {
        interner().resolve(self.0).unwrap_or_default().to_string()
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.as_string();
        f.write_str(&text)
    }
}

impl From<&str> for SpaceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for SpaceId {
    fn eq(&self, other: &str) -> bool {
        interner().resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for SpaceId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for SpaceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
