//! Git Access Layer (spec.md §4.1): the only part of the crate that talks
//! to `gix`. Every other module reaches a repository through [`repo::GitRepo`].
//!
//! | module      | responsibility                                         |
//! |-------------|---------------------------------------------------------|
//! | `repo`      | open a repository, hand out thread-local clones          |
//! | `commits`   | bounded ancestry walks, hash-prefix resolution            |
//! | `tree`      | tree flattening, blob reads with size/binary guards       |
//! | `diff`      | LCS line diff, tree-to-tree changed-file summaries        |
//! | `blame`     | line attribution over the first-parent chain              |
//! | `refs`      | branch and tag enumeration                                |
//! | `scanner`   | working-tree content scan fast path (the `ignore` crate)  |
//! | `error`     | `GitLayerError` and the transient-I/O retry policy         |

pub mod blame;
pub mod commits;
pub mod diff;
pub mod error;
pub mod refs;
pub mod repo;
pub mod scanner;
pub mod tree;

pub use error::GitLayerError;
pub use repo::{GitRepo, RepositoryIdentity};
