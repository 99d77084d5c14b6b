//! CLI commands module.

mod classify;
mod identify;
mod respond;
mod run;
mod util;

pub use classify::ClassifyCommand;
pub use identify::IdentifyCommand;
pub use respond::RespondCommand;
pub use run::RunCommand;

pub(crate) use util::*;
