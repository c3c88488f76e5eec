//! Concrete collaborators for the Polyver release engine.
//!
//! Each module implements one of the `polyver_core` seams against a real
//! system: the filesystem, libgit2, the PyPI JSON API, the terminal and the
//! Poetry CLI.

pub mod git;
pub mod poetry;
pub mod prompt;
pub mod pypi;
pub mod pyproject;
pub mod scanner;
pub mod version_plans;

pub use git::Git2Client;
pub use poetry::PoetryLockfile;
pub use prompt::DialoguerPrompter;
pub use pypi::PypiRegistry;
pub use pyproject::PyprojectStore;
pub use scanner::Scanner;
pub use version_plans::FsVersionPlanStore;
