//! `rollcall` - CLI for office and meeting attendance
//!
//! Each attendance subcommand runs one session against the simulated location
//! provider and recorder, then prints the confirmation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use rollcall::cli::{
    notes_answer, Cli, Command, ConfigCommand, MeetingCommand, OfficeCommand, ProfileCommand,
    RegisterCommand, SessionArgs,
};
use rollcall::{
    init_logging, AttendanceController, Config, Confirmation, ConsoleNavigator, Error, FlowKind,
    ProfileStore, Registration, RegistrationStep, SessionHandle, SessionSettings, SessionState,
    SimulatedLocationProvider, SimulatedRecorder, Storage,
};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // Validation reports a broken file instead of failing to start
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return validate_config(file.clone().or_else(|| cli.config.clone()));
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Command::Register(cmd) => handle_register(&config, cmd, &mut input).await,
        Command::Menu => handle_menu(&config),
        Command::Profile(cmd) => handle_profile(&config, &cmd),
        Command::Office(cmd) => handle_office(&config, &cmd, &mut input).await,
        Command::Meeting(cmd) => handle_meeting(&config, &cmd, &mut input).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

/// Print `label` and read one line. `None` once stdin is closed.
async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label} ");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

async fn handle_register(
    config: &Config,
    cmd: RegisterCommand,
    input: &mut Input,
) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    if let Some(existing) = storage.get()? {
        if !cmd.force {
            bail!(
                "already registered as {} ({}); use --force to replace",
                existing.name(),
                existing.phone_number()
            );
        }
    }

    let mut wizard = Registration::new();
    let mut phone = cmd.phone;
    let mut name = cmd.name;

    let profile = loop {
        let step = wizard.step();
        let (value, given) = match step {
            RegistrationStep::Phone => next_value(&mut phone, input, step).await?,
            RegistrationStep::Name => next_value(&mut name, input, step).await?,
        };

        let outcome = match step {
            RegistrationStep::Phone => wizard.submit_phone(&value).map(|()| None),
            RegistrationStep::Name if !given && value.trim().eq_ignore_ascii_case("back") => {
                wizard.back();
                continue;
            }
            RegistrationStep::Name => wizard.submit_name(&value).map(Some),
        };

        match outcome {
            Ok(Some(profile)) => break profile,
            Ok(None) => {}
            Err(err) if given => return Err(Error::from(err).into()),
            Err(err) => eprintln!("{err}"),
        }
    };

    storage
        .set(&profile)
        .context("failed to save registration")?;
    println!("Registered {} ({}).", profile.name(), profile.phone_number());
    Ok(())
}

/// Take a value given on the command line, or ask for it. The flag says
/// whether it came from the command line.
async fn next_value(
    given: &mut Option<String>,
    input: &mut Input,
    step: RegistrationStep,
) -> anyhow::Result<(String, bool)> {
    if let Some(value) = given.take() {
        return Ok((value, true));
    }

    println!("{}", step.prompt());
    let label = match step {
        RegistrationStep::Phone => "Phone number:",
        RegistrationStep::Name => "Name (or 'back'):",
    };
    let value = prompt(input, label)
        .await?
        .context("registration aborted")?;
    Ok((value, false))
}

fn handle_menu(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    println!("Attendance App");
    match storage.get()? {
        Some(profile) => {
            println!("Welcome, {}!", profile.name());
            println!();
            println!("Office Attendance");
            println!("  rollcall office checkin");
            println!("  rollcall office checkout");
            println!("Meeting Attendance");
            println!("  rollcall meeting checkin [--notes TEXT]");
            println!("  rollcall meeting checkout [--notes TEXT]");
        }
        None => {
            println!("{}", RegistrationStep::Phone.prompt());
            println!("  rollcall register");
        }
    }
    Ok(())
}

fn handle_profile(config: &Config, cmd: &ProfileCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        ProfileCommand::Show { json } => {
            let profile = storage.get()?.ok_or(Error::NotRegistered)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Name:          {}", profile.name());
                println!("Phone number:  {}", profile.phone_number());
            }
        }
        ProfileCommand::Clear => {
            if storage.clear()? {
                println!("Registration cleared.");
            } else {
                println!("No registration to clear.");
            }
        }
    }
    Ok(())
}

async fn handle_office(
    config: &Config,
    cmd: &OfficeCommand,
    input: &mut Input,
) -> anyhow::Result<()> {
    run_attendance(config, cmd.kind(), None, cmd.args(), input).await
}

async fn handle_meeting(
    config: &Config,
    cmd: &MeetingCommand,
    input: &mut Input,
) -> anyhow::Result<()> {
    let args = cmd.args();
    run_attendance(config, cmd.kind(), args.notes.clone(), &args.session, input).await
}

/// Run one attendance session to a terminal state.
async fn run_attendance(
    config: &Config,
    kind: FlowKind,
    notes: Option<String>,
    args: &SessionArgs,
    input: &mut Input,
) -> anyhow::Result<()> {
    let profile = open_storage(config)?
        .get()?
        .ok_or(Error::NotRegistered)?;

    let mut simulation = config.simulation.clone();
    if args.deny_location {
        simulation.location_permission = false;
    }

    let controller = AttendanceController::new(
        Arc::new(SimulatedLocationProvider::from(&simulation)),
        Arc::new(SimulatedRecorder::from(&simulation)),
        Arc::new(ConsoleNavigator),
        SessionSettings::from(&config.session),
    );
    let flow = config.flow(kind);

    println!(
        "{} {} for {}",
        kind.context_label(),
        kind.action_label(),
        profile.name()
    );

    loop {
        let handle = controller.start(flow)?;
        let attempt = run_attempt(
            &controller,
            &handle,
            kind,
            flow.auto_dismiss.is_none(),
            notes.as_deref(),
            args,
            input,
        );

        match controller
            .cancel_on(&handle, attempt, tokio::signal::ctrl_c())
            .await
        {
            Some(Ok(Step::Finished)) | None => return Ok(()),
            Some(Ok(Step::Again)) => {}
            Some(Err(err)) => return Err(err),
        }
    }
}

/// How one attempt ended.
#[derive(Debug)]
enum Step {
    Finished,
    Again,
}

/// Drive one attempt from location lookup to dismissal or a retry decision.
async fn run_attempt(
    controller: &AttendanceController,
    handle: &SessionHandle,
    kind: FlowKind,
    manual_dismiss: bool,
    notes: Option<&str>,
    args: &SessionArgs,
    input: &mut Input,
) -> anyhow::Result<Step> {
    println!("Getting location...");
    let state = controller.acquire_location(handle).await;

    if let Some(issue) = controller.location_issue() {
        println!("Location: {issue}");
    }

    if matches!(state, SessionState::ValidatingInput) {
        let (text, given) = match notes {
            Some(text) => (text.to_string(), true),
            None => (read_notes(controller, input).await?, false),
        };

        if let Err(err) = controller.submit_notes(handle, &text).await {
            let err = Error::from(err);
            if err.is_validation_error() && !given {
                eprintln!("{err}");
                return Ok(Step::Again);
            }
            return Err(err.into());
        }
    }

    match controller.state() {
        SessionState::Confirmed(record) => {
            let confirmation = Confirmation::for_record(&record);
            println!("{confirmation}");
            match record.location() {
                Some(location) => println!("{location}"),
                None => println!("Location not recorded"),
            }

            if manual_dismiss {
                if !args.yes {
                    prompt(input, &format!("[{}]", confirmation.button_label())).await?;
                }
                controller.confirm_dismiss(handle);
            }
            controller.wait_until_finished().await;
            Ok(Step::Finished)
        }
        SessionState::Failed { reason } => {
            let confirmation = controller
                .confirmation()
                .unwrap_or_else(|| Confirmation::for_failure(kind, &reason));
            eprintln!("{confirmation}");
            controller.retry(handle)?;

            let again = if args.yes {
                false
            } else {
                prompt(input, "Retry? [y/N]")
                    .await?
                    .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("y"))
            };
            if !again {
                bail!(
                    "{} {} failed: {reason}",
                    kind.context_label(),
                    kind.action_label()
                );
            }
            Ok(Step::Again)
        }
        SessionState::Cancelled => Ok(Step::Finished),
        other => bail!("session stopped in unexpected state: {other}"),
    }
}

/// Ask for meeting notes. An empty answer reuses notes from a failed attempt.
async fn read_notes(controller: &AttendanceController, input: &mut Input) -> anyhow::Result<String> {
    let draft = controller.draft_notes();
    let label = match &draft {
        Some(draft) => format!("Meeting notes [{draft}]:"),
        None => "Meeting notes:".to_string(),
    };

    let entered = prompt(input, &label).await?;
    notes_answer(entered, draft).context("notes aborted")
}

fn validate_config(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            Ok(())
        }
        Err(e) => bail!("configuration error: {e}"),
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:        {}", config.database_path().display());
                println!();
                println!("[Session]");
                println!(
                    "  Location timeout:     {} ms",
                    config.session.location_timeout_ms
                );
                println!(
                    "  Submit timeout:       {} ms",
                    config.session.submit_timeout_ms
                );
                println!(
                    "  Office auto-dismiss:  {}",
                    describe_dismiss(config.session.office_auto_dismiss_ms)
                );
                println!(
                    "  Meeting auto-dismiss: {}",
                    describe_dismiss(config.session.meeting_auto_dismiss_ms)
                );
                println!(
                    "  Location required:    {}",
                    config.session.location_required
                );
                println!();
                println!("[Simulation]");
                println!(
                    "  Coordinates:          {}, {}",
                    config.simulation.latitude, config.simulation.longitude
                );
                println!(
                    "  Location delay:       {} ms",
                    config.simulation.location_delay_ms
                );
                println!(
                    "  Submit delay:         {} ms",
                    config.simulation.submit_delay_ms
                );
                println!(
                    "  Location permission:  {}",
                    config.simulation.location_permission
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => return validate_config(file),
    }
    Ok(())
}

fn describe_dismiss(ms: u64) -> String {
    if ms == 0 {
        "manual".to_string()
    } else {
        format!("{ms} ms")
    }
}
