//! # Identity Continuity
//!
//! Decides whether a change was applied in place or forced a replacement by
//! comparing the system-assigned UID of two snapshots of the same logical resource.

use crate::error::HarnessError;
use crate::resource::ObservedResource;

/// How a resource survived a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    /// Same UID: the object was updated in place
    InPlace,
    /// Different UID: the object was deleted and recreated
    Replaced,
}

impl Continuity {
    pub fn classify(before: &ObservedResource, after: &ObservedResource) -> Self {
        if before.uid() == after.uid() {
            Continuity::InPlace
        } else {
            Continuity::Replaced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Continuity::InPlace => "in_place",
            Continuity::Replaced => "replaced",
        }
    }
}

/// Assert the change between `before` and `after` was (or was not) a replacement
pub fn check_continuity(
    before: &ObservedResource,
    after: &ObservedResource,
    expect_new: bool,
) -> Result<(), HarnessError> {
    match (Continuity::classify(before, after), expect_new) {
        (Continuity::InPlace, true) => Err(HarnessError::ExpectedReplace {
            uid: before.uid().to_string(),
        }),
        (Continuity::Replaced, false) => Err(HarnessError::ExpectedInPlace {
            before: before.uid().to_string(),
            after: after.uid().to_string(),
        }),
        _ => Ok(()),
    }
}
