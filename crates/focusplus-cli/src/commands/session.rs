use std::time::Duration;

use clap::Subcommand;
use focusplus_core::{format_duration, AppConfig, FocusEngine, FocusSession, PendingBreak, SessionType};
use serde::Serialize;

use super::{open_engine, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a focus session, ending any running one
    Start {
        /// Session type: manual, pomodoro or custom
        #[arg(long = "type", default_value = "manual")]
        kind: SessionType,
        /// Target length in minutes (ignored for pomodoro)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// End the running session
    End,
    /// Print the current focus state as JSON
    Status,
    /// Drive the engine once per interval until Ctrl-C
    Watch {
        #[arg(long, default_value = "1")]
        interval_secs: u64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    in_focus_mode: bool,
    session: Option<FocusSession>,
    remaining_ms: Option<u64>,
    remaining: Option<String>,
    pending_break: Option<PendingBreak>,
    pomodoro_count: u32,
}

impl Status {
    fn of(engine: &FocusEngine) -> Result<Self, Box<dyn std::error::Error>> {
        let remaining_ms = if engine.is_in_focus_mode() {
            engine.remaining_ms()?
        } else {
            None
        };
        Ok(Self {
            in_focus_mode: engine.is_in_focus_mode(),
            session: engine.current_session(),
            remaining_ms,
            remaining: remaining_ms.map(format_duration),
            pending_break: engine.pending_break(),
            pomodoro_count: engine.pomodoro_count(),
        })
    }
}

pub fn run(action: SessionAction, config: &AppConfig) -> CmdResult {
    let mut engine = open_engine(config)?;

    match action {
        SessionAction::Start { kind, minutes } => {
            let session = engine.start_session(kind, minutes)?;
            print_json(&session)?;
        }
        SessionAction::End => {
            let ended = engine.end_session()?;
            print_json(&ended)?;
        }
        SessionAction::Status => {
            print_json(&Status::of(&engine)?)?;
        }
        SessionAction::Watch { interval_secs } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(&mut engine, Duration::from_secs(interval_secs.max(1))))?;
        }
    }

    engine.dispose();
    Ok(())
}

/// One status line per interval, plus one line per engine event.
async fn watch(engine: &mut FocusEngine, every: Duration) -> CmdResult {
    let subscription = engine.subscribe(|event| match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    });

    let mut interval = tokio::time::interval(every);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Other invocations may have started or ended a session.
                engine.reload()?;
                engine.tick()?;
                println!("{}", serde_json::to_string(&Status::of(engine)?)?);
            }
            _ = &mut shutdown => break,
        }
    }

    subscription.unsubscribe();
    Ok(())
}
