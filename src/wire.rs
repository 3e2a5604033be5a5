use std::sync::Arc;
use std::time::Instant;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use crate::command::{self, Command, CommandError};
use crate::engine::{Engine, EngineError};
use crate::limits::MAX_LINE_LEN;
use crate::model::{Actor, AppointmentInfo, Role, ScheduleView};
use crate::observability;

/// Sent once per connection, before the first command line is read.
pub const GREETING: &str = "\
Welcome to the COVID-19 Vaccine Reservation Scheduling Application!
*** Please enter one of the following commands ***
> create_patient <username> <password>
> create_caregiver <username> <password>
> login_patient <username> <password>
> login_caregiver <username> <password>
> search_caregiver_schedule <date>
> reserve <date> <vaccine>
> upload_availability <date>
> cancel <appointment_id>
> add_doses <vaccine> <number>
> show_appointments
> logout
> quit";

const TRY_AGAIN: &str = "Please try again!";
const LOGIN_FIRST: &str = "Please login first!";
const BYE: &str = "Bye!";

// ── Connection loop ──────────────────────────────────────────────

/// Drive one client session: lockstep line-in, reply-out until the client
/// quits or disconnects. The session identity lives here, not in the Engine,
/// so two connections logged in as the same user do not interfere.
pub async fn process_connection(
    socket: TcpStream,
    engine: Arc<Engine>,
) -> Result<(), LinesCodecError> {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    framed.send(GREETING).await?;

    let mut session: Option<Actor> = None;

    while let Some(frame) = framed.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                // The codec discards up to the next newline; the session
                // itself survives an oversized line.
                framed.send(TRY_AGAIN).await?;
                continue;
            }
            Err(err) => return Err(err),
        };

        let cmd = match command::parse_line(&line) {
            Ok(cmd) => cmd,
            Err(CommandError::Empty) => continue,
            Err(err) => {
                framed.send(parse_error_reply(&err)).await?;
                continue;
            }
        };

        if cmd == Command::Quit {
            framed.send(BYE).await?;
            break;
        }

        let label = observability::command_label(&cmd);
        let started = Instant::now();
        let result = execute_command(&engine, &mut session, cmd).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::COMMANDS_TOTAL, "command" => label, "status" => status)
            .increment(1);
        metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(command = label, status, "command handled");

        let reply = match &result {
            Ok(reply) | Err(reply) => reply,
        };
        framed.send(reply).await?;
    }

    Ok(())
}

// ── Command execution ────────────────────────────────────────────

/// Run one command against the engine. `Ok` and `Err` both carry the exact
/// text sent to the client; the split only feeds the status metric label.
async fn execute_command(
    engine: &Engine,
    session: &mut Option<Actor>,
    cmd: Command,
) -> Result<String, String> {
    match cmd {
        Command::CreatePatient { username, password } => engine
            .register_patient(&username, &password)
            .await
            .map(|()| format!("Created user {username}"))
            .map_err(register_error_reply),
        Command::CreateCaregiver { username, password } => engine
            .register_caregiver(&username, &password)
            .await
            .map(|()| format!("Created user {username}"))
            .map_err(register_error_reply),
        Command::LoginPatient { username, password } => {
            login_reply(engine, session, &username, &password, Role::Patient)
        }
        Command::LoginCaregiver { username, password } => {
            login_reply(engine, session, &username, &password, Role::Caregiver)
        }
        Command::SearchSchedule { date } => {
            current_actor(session)?;
            Ok(schedule_reply(&engine.search_schedule(date).await))
        }
        Command::Reserve { date, vaccine } => {
            let actor = current_actor(session)?;
            engine
                .reserve(actor, date, &vaccine)
                .await
                .map(|(id, caregiver)| {
                    format!("Appointment ID: {id}\nCaregiver username: {caregiver}")
                })
                .map_err(engine_error_reply)
        }
        Command::UploadAvailability { date } => {
            let actor = current_actor(session)?;
            engine
                .upload_availability(actor, date)
                .await
                .map(|()| "Availability uploaded!".to_string())
                .map_err(engine_error_reply)
        }
        Command::Cancel { id } => {
            let actor = current_actor(session)?;
            engine
                .cancel(actor, id)
                .await
                .map(|()| "Canceled successfully!".to_string())
                .map_err(engine_error_reply)
        }
        Command::AddDoses { vaccine, amount } => {
            let actor = current_actor(session)?;
            engine
                .add_doses(actor, &vaccine, amount)
                .await
                .map(|()| "Doses updated!".to_string())
                .map_err(engine_error_reply)
        }
        Command::ShowAppointments => {
            let actor = current_actor(session)?;
            let rows = engine.list_appointments(actor).await;
            Ok(appointments_reply(actor.role, &rows))
        }
        Command::Logout => {
            current_actor(session)?;
            *session = None;
            Ok("Successfully logged out!".to_string())
        }
        // Intercepted by the connection loop; kept so the match stays total.
        Command::Quit => Ok(BYE.to_string()),
    }
}

/// Resolve the connection's logged-in identity, or the login prompt when
/// there is none. Commands never reach the Engine without one.
fn current_actor(session: &Option<Actor>) -> Result<&Actor, String> {
    session
        .as_ref()
        .ok_or_else(|| engine_error_reply(EngineError::NotAuthenticated))
}

fn login_reply(
    engine: &Engine,
    session: &mut Option<Actor>,
    username: &str,
    password: &str,
    role: Role,
) -> Result<String, String> {
    if session.is_some() {
        return Err("User already logged in.".to_string());
    }
    let actor = engine
        .login(username, password, role)
        .map_err(|_| "Login failed.".to_string())?;
    let reply = format!("Logged in as: {}", actor.username);
    *session = Some(actor);
    Ok(reply)
}

// ── Replies ──────────────────────────────────────────────────────

/// Registration keeps its own wording: a password failure names the violated
/// rule so the user can fix it on the next attempt.
fn register_error_reply(err: EngineError) -> String {
    match err {
        EngineError::UsernameTaken(_) => "Username taken, try again!".to_string(),
        EngineError::InvalidInput(reason) => format!("Password must {reason}, try again!"),
        other => engine_error_reply(other),
    }
}

/// Domain failures each have a fixed user-facing line; everything else
/// (limits, store trouble, invariant bugs) collapses to a generic retry
/// with the detail kept in the log.
fn engine_error_reply(err: EngineError) -> String {
    match err {
        EngineError::NotAuthenticated => LOGIN_FIRST.to_string(),
        EngineError::WrongRole(Role::Patient) => "Please login as a patient!".to_string(),
        EngineError::WrongRole(Role::Caregiver) => {
            "Please login as a caregiver first!".to_string()
        }
        EngineError::InvalidCredentials => "Login failed.".to_string(),
        EngineError::UsernameTaken(_) => "Username taken, try again!".to_string(),
        EngineError::AppointmentNotFound(_) => "No such appointment!".to_string(),
        EngineError::NoAvailableCaregiver => "No available caregiver!".to_string(),
        EngineError::NoAvailableVaccine => "No available vaccine!".to_string(),
        err => {
            tracing::warn!(error = %err, "command failed");
            TRY_AGAIN.to_string()
        }
    }
}

fn parse_error_reply(err: &CommandError) -> &'static str {
    match err {
        CommandError::InvalidDate(_) => "Please enter a valid date!",
        CommandError::UnknownOperation(_) => "Invalid operation name!",
        CommandError::Empty
        | CommandError::WrongArity(..)
        | CommandError::InvalidAmount(_)
        | CommandError::InvalidId(_) => TRY_AGAIN,
    }
}

/// A date with no available caregiver gets the lone no-caregiver line;
/// the stock listing only accompanies a bookable caregiver.
fn schedule_reply(view: &ScheduleView) -> String {
    if view.caregivers.is_empty() {
        return "No available caregiver!".to_string();
    }
    let mut lines = vec!["Available caregivers:".to_string()];
    lines.extend(view.caregivers.iter().cloned());
    lines.push("Vaccines:".to_string());
    for stock in &view.vaccines {
        lines.push(format!("{} {}", stock.name, stock.doses));
    }
    lines.join("\n")
}

fn appointments_reply(role: Role, rows: &[AppointmentInfo]) -> String {
    if rows.is_empty() {
        return "No appointment!".to_string();
    }
    let counterparty = match role {
        Role::Patient => "Caregiver",
        Role::Caregiver => "Patient",
    };
    rows.iter()
        .map(|row| {
            format!(
                "Appointment ID: {}, Vaccine: {}, Date: {}, {}: {}",
                row.id, row.vaccine, row.date, counterparty, row.counterparty
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
