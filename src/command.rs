// Demo driver commands
// One command per stdin line

use std::str::FromStr;

use thiserror::Error;

/// Error type for command parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
}

/// A request typed into the demo driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Wake,
    Dormant,
    Tip {
        id: String,
        animation: Option<String>,
    },
    Dismiss,
    Close,
    Show,
    Hide,
    Mischief,
    /// Play the click sound
    Click,
    Sound(String),
    Mute,
    Unmute,
    Toggle,
    /// Print the presentation state
    State,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "wake" => Command::Wake,
            "dormant" | "sleep" => Command::Dormant,
            "tip" => {
                let id = words.next().ok_or(CommandError::MissingArgument("tip"))?;
                Command::Tip {
                    id: id.to_string(),
                    animation: words.next().map(str::to_string),
                }
            }
            "dismiss" => Command::Dismiss,
            "close" => Command::Close,
            "show" => Command::Show,
            "hide" => Command::Hide,
            "mischief" => Command::Mischief,
            "click" => Command::Click,
            "sound" => {
                let id = words.next().ok_or(CommandError::MissingArgument("sound"))?;
                Command::Sound(id.to_string())
            }
            "mute" => Command::Mute,
            "unmute" => Command::Unmute,
            "toggle" => Command::Toggle,
            "state" | "status" => Command::State,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("wake", Command::Wake)]
    #[case("  SLEEP ", Command::Dormant)]
    #[case("dismiss", Command::Dismiss)]
    #[case("click", Command::Click)]
    #[case("sound ui.hover", Command::Sound("ui.hover".into()))]
    #[case("toggle", Command::Toggle)]
    #[case("exit", Command::Quit)]
    fn test_parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>(), Ok(expected));
    }

    #[test]
    fn test_parse_tip() {
        assert_eq!(
            "tip welcome Explain".parse::<Command>(),
            Ok(Command::Tip {
                id: "welcome".into(),
                animation: Some("Explain".into())
            })
        );
        assert_eq!(
            "tip welcome".parse::<Command>(),
            Ok(Command::Tip {
                id: "welcome".into(),
                animation: None
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("tip".parse::<Command>(), Err(CommandError::MissingArgument("tip")));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(CommandError::Unknown("dance".into()))
        );
    }
}
