//! Read-only abstraction over a cloned Git repository.
//!
//! [`GitView`] exposes exactly the surface a history miner needs: commit
//! lookup, branch enumeration, per-commit change lists, and patch
//! extraction. [`patch_identity::fingerprint`] turns a commit's diff into a
//! normalized identity used to detect cherry-picks.

mod commit;
mod error;
mod patch_identity;
mod view;

pub use commit::{ChangeEntry, ChangeKind, Commit, CommitId, InvalidCommitId};
pub use error::GitViewError;
pub use patch_identity::{fingerprint, PatchFingerprint};
pub use view::GitView;
