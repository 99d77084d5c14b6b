use clap::{Args, ValueEnum};
use mamaswitch_session::{select_response, Role};
use mamaswitch_utterance::{classify, Attitude, Command};
use serde::Serialize;

use super::{output_result, text_or_stdin};
use crate::Cli;

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Mother,
    Child,
}

impl From<RoleArg> for Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Mother => Role::Mother,
            RoleArg::Child => Role::Child,
        }
    }
}

/// Print the reply the session would give to a text in a fixed role.
#[derive(Args)]
pub struct RespondCommand {
    /// Speaker role
    #[arg(long, value_enum)]
    role: RoleArg,

    /// Utterance text (default: stdin)
    text: Vec<String>,
}

#[derive(Serialize)]
struct Reply {
    role: Role,
    command: Option<Command>,
    attitude: Attitude,
    response: String,
}

impl RespondCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let text = text_or_stdin(&self.text)?;
        let tags = classify(text.as_str());
        let role = Role::from(self.role);
        let response = select_response(tags.command, tags.attitude, role);
        output_result(
            &Reply {
                role,
                command: tags.command,
                attitude: tags.attitude,
                response,
            },
            cli.json,
        )
    }
}
