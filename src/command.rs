use chrono::NaiveDate;

use crate::model::{parse_date, AppointmentId};

/// Parsed command from one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreatePatient { username: String, password: String },
    CreateCaregiver { username: String, password: String },
    LoginPatient { username: String, password: String },
    LoginCaregiver { username: String, password: String },
    SearchSchedule { date: NaiveDate },
    Reserve { date: NaiveDate, vaccine: String },
    UploadAvailability { date: NaiveDate },
    Cancel { id: AppointmentId },
    AddDoses { vaccine: String, amount: u32 },
    ShowAppointments,
    Logout,
    Quit,
}

/// Parse one line: a verb plus whitespace-separated arguments. Dates and
/// numbers are validated here, so the engine only ever sees typed values.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or(CommandError::Empty)?;
    let args: Vec<&str> = words.collect();

    match verb {
        "create_patient" => {
            check_arity("create_patient", &args, 2)?;
            Ok(Command::CreatePatient {
                username: args[0].into(),
                password: args[1].into(),
            })
        }
        "create_caregiver" => {
            check_arity("create_caregiver", &args, 2)?;
            Ok(Command::CreateCaregiver {
                username: args[0].into(),
                password: args[1].into(),
            })
        }
        "login_patient" => {
            check_arity("login_patient", &args, 2)?;
            Ok(Command::LoginPatient {
                username: args[0].into(),
                password: args[1].into(),
            })
        }
        "login_caregiver" => {
            check_arity("login_caregiver", &args, 2)?;
            Ok(Command::LoginCaregiver {
                username: args[0].into(),
                password: args[1].into(),
            })
        }
        "search_caregiver_schedule" => {
            check_arity("search_caregiver_schedule", &args, 1)?;
            Ok(Command::SearchSchedule {
                date: parse_date_arg(args[0])?,
            })
        }
        "reserve" => {
            check_arity("reserve", &args, 2)?;
            Ok(Command::Reserve {
                date: parse_date_arg(args[0])?,
                vaccine: args[1].into(),
            })
        }
        "upload_availability" => {
            check_arity("upload_availability", &args, 1)?;
            Ok(Command::UploadAvailability {
                date: parse_date_arg(args[0])?,
            })
        }
        "cancel" => {
            check_arity("cancel", &args, 1)?;
            let id: AppointmentId = args[0]
                .parse()
                .map_err(|_| CommandError::InvalidId(args[0].into()))?;
            Ok(Command::Cancel { id })
        }
        "add_doses" => {
            check_arity("add_doses", &args, 2)?;
            let amount: u32 = args[1]
                .parse()
                .map_err(|_| CommandError::InvalidAmount(args[1].into()))?;
            Ok(Command::AddDoses {
                vaccine: args[0].into(),
                amount,
            })
        }
        "show_appointments" => {
            check_arity("show_appointments", &args, 0)?;
            Ok(Command::ShowAppointments)
        }
        "logout" => {
            check_arity("logout", &args, 0)?;
            Ok(Command::Logout)
        }
        "quit" => {
            check_arity("quit", &args, 0)?;
            Ok(Command::Quit)
        }
        other => Err(CommandError::UnknownOperation(other.to_string())),
    }
}

fn check_arity(verb: &'static str, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() != expected {
        return Err(CommandError::WrongArity(verb, expected, args.len()));
    }
    Ok(())
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_date(raw).ok_or_else(|| CommandError::InvalidDate(raw.to_string()))
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    UnknownOperation(String),
    WrongArity(&'static str, usize, usize),
    InvalidDate(String),
    InvalidAmount(String),
    InvalidId(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::UnknownOperation(v) => write!(f, "unknown operation: {v}"),
            CommandError::WrongArity(verb, expected, got) => {
                write!(f, "{verb}: expected {expected} arguments, got {got}")
            }
            CommandError::InvalidDate(s) => write!(f, "invalid date: {s}"),
            CommandError::InvalidAmount(s) => write!(f, "invalid amount: {s}"),
            CommandError::InvalidId(s) => write!(f, "invalid appointment id: {s}"),
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create_patient() {
        let cmd = parse_line("create_patient alice Str0ng!pw").unwrap();
        assert_eq!(
            cmd,
            Command::CreatePatient {
                username: "alice".into(),
                password: "Str0ng!pw".into(),
            }
        );
    }

    #[test]
    fn parse_login_caregiver() {
        let cmd = parse_line("login_caregiver bob Str0ng!pw").unwrap();
        assert_eq!(
            cmd,
            Command::LoginCaregiver {
                username: "bob".into(),
                password: "Str0ng!pw".into(),
            }
        );
    }

    #[test]
    fn parse_search_schedule() {
        let cmd = parse_line("search_caregiver_schedule 2022-05-01").unwrap();
        match cmd {
            Command::SearchSchedule { date } => assert_eq!(date.to_string(), "2022-05-01"),
            _ => panic!("expected SearchSchedule, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_reserve_date_then_vaccine() {
        let cmd = parse_line("reserve 2022-05-01 Pfizer").unwrap();
        match cmd {
            Command::Reserve { date, vaccine } => {
                assert_eq!(date.to_string(), "2022-05-01");
                assert_eq!(vaccine, "Pfizer");
            }
            _ => panic!("expected Reserve, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_upload_availability() {
        let cmd = parse_line("upload_availability 2022-05-01").unwrap();
        assert!(matches!(cmd, Command::UploadAvailability { .. }));
    }

    #[test]
    fn parse_cancel() {
        assert_eq!(parse_line("cancel 7").unwrap(), Command::Cancel { id: 7 });
    }

    #[test]
    fn parse_add_doses() {
        let cmd = parse_line("add_doses Pfizer 100").unwrap();
        assert_eq!(
            cmd,
            Command::AddDoses {
                vaccine: "Pfizer".into(),
                amount: 100,
            }
        );
    }

    #[test]
    fn parse_bare_commands() {
        assert_eq!(parse_line("show_appointments").unwrap(), Command::ShowAppointments);
        assert_eq!(parse_line("logout").unwrap(), Command::Logout);
        assert_eq!(parse_line("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn parse_tolerates_extra_whitespace() {
        let cmd = parse_line("  reserve   2022-05-01    Pfizer ").unwrap();
        assert!(matches!(cmd, Command::Reserve { .. }));
    }

    #[test]
    fn parse_bad_date_errors() {
        assert_eq!(
            parse_line("upload_availability 2022-13-01"),
            Err(CommandError::InvalidDate("2022-13-01".into()))
        );
        assert_eq!(
            parse_line("reserve tomorrow Pfizer"),
            Err(CommandError::InvalidDate("tomorrow".into()))
        );
    }

    #[test]
    fn parse_bad_numbers_error() {
        assert_eq!(
            parse_line("cancel seven"),
            Err(CommandError::InvalidId("seven".into()))
        );
        assert_eq!(
            parse_line("cancel -1"),
            Err(CommandError::InvalidId("-1".into()))
        );
        assert_eq!(
            parse_line("add_doses Pfizer lots"),
            Err(CommandError::InvalidAmount("lots".into()))
        );
        assert_eq!(
            parse_line("add_doses Pfizer -5"),
            Err(CommandError::InvalidAmount("-5".into()))
        );
    }

    #[test]
    fn parse_wrong_arity_errors() {
        assert_eq!(
            parse_line("create_patient alice"),
            Err(CommandError::WrongArity("create_patient", 2, 1))
        );
        assert_eq!(
            parse_line("reserve 2022-05-01 Pfizer extra"),
            Err(CommandError::WrongArity("reserve", 2, 3))
        );
        assert_eq!(
            parse_line("logout now"),
            Err(CommandError::WrongArity("logout", 0, 1))
        );
    }

    #[test]
    fn parse_unknown_operation_errors() {
        assert_eq!(
            parse_line("reschedule 0 2022-05-02"),
            Err(CommandError::UnknownOperation("reschedule".into()))
        );
    }

    #[test]
    fn parse_empty_errors() {
        assert_eq!(parse_line(""), Err(CommandError::Empty));
        assert_eq!(parse_line("   "), Err(CommandError::Empty));
    }
}
