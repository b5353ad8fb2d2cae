//! Icinga2 `CheckCommand` definitions derived from a clap command tree.

use clap::ArgAction;

pub struct CommandDescription {
    name: String,
    subcommand: Option<String>,
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    key: String,
    var: String,
    description: Option<String>,
    is_flag: bool,
    is_positional: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("error converting to command description: {0}")]
    CommandDescriptionFromError(#[from] CommandDescriptionFromError),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandDescriptionFromError {
    #[error("argument \"{0}\" has no long name")]
    MissingLongArgument(String),
}

impl CommandDescription {
    /// Describes `sub` (or the root command if `None`), including the root's global arguments.
    pub fn new(
        name: &str,
        root: &clap::Command,
        sub: Option<&clap::Command>,
    ) -> Result<Self, CommandDescriptionFromError> {
        let mut arguments = Vec::new();
        for arg in root
            .get_arguments()
            .filter(|a| sub.is_none() || a.is_global_set())
        {
            arguments.push(ArgumentDescription::new(name, arg)?);
        }
        if let Some(sub) = sub {
            for arg in sub.get_arguments() {
                arguments.push(ArgumentDescription::new(name, arg)?);
            }
        }

        Ok(CommandDescription {
            name: name.to_owned(),
            subcommand: sub.map(|s| s.get_name().to_owned()),
            arguments,
        })
    }

    pub fn command_name(&self) -> String {
        match &self.subcommand {
            Some(sub) => format!("{}-{}", self.name, sub),
            None => self.name.clone(),
        }
    }

    pub fn to_icinga_command(&self) -> Result<String, ToIcingaCommandError> {
        let current_exe = std::env::current_exe()?
            .to_str()
            .ok_or(ToIcingaCommandError::InvalidExecutablePath)?
            .to_owned();
        Ok(self.render(&current_exe))
    }

    fn render(&self, exe: &str) -> String {
        let mut out = format!("object CheckCommand \"{}\" {{\n", self.command_name());

        match &self.subcommand {
            Some(sub) => out.push_str(&format!("  command = [ \"{exe}\", \"{sub}\" ]\n")),
            None => out.push_str(&format!("  command = [ \"{exe}\" ]\n")),
        }
        out.push_str("  arguments = {\n");
        for arg in &self.arguments {
            out.push_str(&format!("  \"{}\" = {{\n", arg.key));

            if arg.is_flag {
                out.push_str(&format!("    set_if = \"${}$\"\n", arg.var));
            } else {
                out.push_str(&format!("    value = \"${}$\"\n", arg.var));
            }

            if arg.is_positional {
                out.push_str("    skip_key = true\n");
                out.push_str("    required = true\n");
                out.push_str("    order = 99\n");
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "    description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("  }\n");
        }
        out.push_str("  }\n\n");

        for arg in &self.arguments {
            if let Some(default_value) = &arg.default_value {
                out.push_str(&format!(
                    "  vars.{} = \"{}\"\n",
                    arg.var,
                    escape_string(default_value)
                ));
            }
        }

        out.push_str("}\n");
        out
    }
}

impl ArgumentDescription {
    fn new(prefix: &str, arg: &clap::Arg) -> Result<Self, CommandDescriptionFromError> {
        let id = arg.get_id().as_str();
        let is_positional = arg.is_positional();
        let key = match (arg.get_long(), is_positional) {
            (Some(long), _) => format!("--{long}"),
            (None, true) => id.to_owned(),
            (None, false) => {
                return Err(CommandDescriptionFromError::MissingLongArgument(
                    id.to_owned(),
                ))
            }
        };

        let var = format!("{}_{}", prefix, arg.get_long().unwrap_or(id)).replace('-', "_");
        let description = arg.get_help().map(|s| s.to_string());
        let is_flag = matches!(
            arg.get_action(),
            ArgAction::SetTrue | ArgAction::SetFalse | ArgAction::Count
        );

        let default_value = arg
            .get_default_values()
            .first()
            .and_then(|v| v.to_str())
            .map(|s| s.to_string());

        Ok(ArgumentDescription {
            key,
            var,
            description,
            is_flag,
            is_positional,
            default_value: if is_flag { None } else { default_value },
        })
    }
}

fn escape_string(s: &str) -> String {
    ["\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{}", c)))
}

/// One `CheckCommand` per subcommand, or a single one if `cmd` has none.
pub fn icinga_commands(name: &str, cmd: &clap::Command) -> Result<String, ToIcingaCommandError> {
    let mut descriptions = Vec::new();
    if cmd.get_subcommands().next().is_none() {
        descriptions.push(CommandDescription::new(name, cmd, None)?);
    }
    for sub in cmd.get_subcommands() {
        descriptions.push(CommandDescription::new(name, cmd, Some(sub))?);
    }

    let mut out = String::new();
    for description in descriptions {
        out.push_str(&description.to_icinga_command()?);
        out.push('\n');
    }
    Ok(out)
}

/// Print the Icinga command configuration if the GENERATE_ICINGA_COMMAND environment variable is set
/// and exit the process.
pub fn print_icinga_command_config_if_env_and_exit(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), ToIcingaCommandError> {
    if std::env::var_os("GENERATE_ICINGA_COMMAND").is_none() {
        return Ok(());
    }

    let out = icinga_commands(name, cmd)?;
    println!("{}", out.trim());
    std::process::exit(0);
}
