pub mod cli;
pub mod runfile;

pub use cli::{build_cli_command, Cli, Commands, HeuristicCommands, MilpCommands};
pub use runfile::{HeuristicRun, MilpRun};
