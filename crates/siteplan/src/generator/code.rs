//! Compact textual encoding of a main chain.

use std::fmt::{self, Write};

use serde::Serialize;

use siteplan_core::placement::{Placement, PlacementState};

/// Layout code such as `AO-b(0)-BR-a(5)-CO`.
///
/// Each main unit contributes `<id><orientation>`; consecutive units are
/// joined by `-<direction>(<gap>)-` describing how the later unit attaches.
/// Two candidates with the same code place the main chain identically
/// relative to its head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LayoutCode(String);

impl LayoutCode {
    /// Encodes a chain given in sequence order.
    pub fn from_chain<'a>(chain: impl IntoIterator<Item = &'a Placement>) -> Self {
        let mut code = String::new();
        for (idx, placement) in chain.into_iter().enumerate() {
            if idx > 0 {
                match placement.attachment() {
                    Some(attachment) => {
                        // Writing into a String never fails.
                        let _ = write!(
                            code,
                            "-{}({})-",
                            attachment.direction().letter(),
                            attachment.gap()
                        );
                    }
                    None => code.push('-'),
                }
            }
            code.push_str(&placement.id().as_string());
            code.push(placement.rotation().letter());
        }
        Self(code)
    }

    /// Encodes the main chain of a placement state.
    pub fn from_state(state: &PlacementState) -> Self {
        Self::from_chain(state.chain())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayoutCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for LayoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
