use std::str::FromStr;

use anyhow::{bail, Result};

use crate::sensor::SensorOutcome;

pub const HELP: &str = "\
commands:
  login                      store a fake token and go home
  lock                       lock, or restore when locked
  restore                    restore the session
  biometrics [on|off]        switch unlock policy (toggles without argument)
  clear                      wipe the vault
  background | foreground    simulate the app leaving or returning
  sensor ok|fail|cancel|alter  outcome of the next biometric prompt
  status                     print the current status
  help
  quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Login,
    Lock,
    Restore,
    Biometrics(Option<bool>),
    Clear,
    Background,
    Foreground,
    Sensor(SensorOutcome),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let arg = words.next();

        let command = match (name, arg) {
            ("login", None) => Self::Login,
            ("lock", None) => Self::Lock,
            ("restore", None) => Self::Restore,
            ("biometrics", None) => Self::Biometrics(None),
            ("biometrics", Some("on")) => Self::Biometrics(Some(true)),
            ("biometrics", Some("off")) => Self::Biometrics(Some(false)),
            ("clear", None) => Self::Clear,
            ("background", None) => Self::Background,
            ("foreground", None) => Self::Foreground,
            ("sensor", Some(outcome)) => Self::Sensor(outcome.parse()?),
            ("status", None) => Self::Status,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            _ => bail!("unrecognized command '{}', try 'help'", line.trim()),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("login".parse::<Command>().unwrap(), Command::Login);
        assert_eq!(
            "biometrics off".parse::<Command>().unwrap(),
            Command::Biometrics(Some(false))
        );
        assert_eq!(
            "  biometrics ".parse::<Command>().unwrap(),
            Command::Biometrics(None)
        );
        assert_eq!(
            "sensor alter".parse::<Command>().unwrap(),
            Command::Sensor(SensorOutcome::Altered)
        );
    }

    #[test]
    fn test_reject_unknown_and_bad_args() {
        assert!("".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("biometrics maybe".parse::<Command>().is_err());
        assert!("sensor".parse::<Command>().is_err());
    }
}
