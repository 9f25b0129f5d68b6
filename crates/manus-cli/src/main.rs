//! `manus` – headless runner for the glove pipeline.
//!
//! 1. Loads `~/.manus/config.toml` (writing defaults on first run) and
//!    applies `MANUS_*` overrides.
//! 2. Opens the configured glove backend and builds one hand per side.
//! 3. Ticks the [`GloveSession`] at `frame_rate_hz` against a target wall,
//!    printing gesture and connection events as they happen.
//! 4. Stops after `max_frames` frames or on Ctrl-C and shuts the transport
//!    down cleanly.
//!
//! `manus calibrate` runs the glove calibration routine on both hands before
//! the frame loop starts.

mod config;
mod scene;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use colored::Colorize;
use manus_hal::{BackendOptions, open_backend};
use manus_perception::{BoneHierarchy, PoseClip, Retargeter};
use manus_runtime::GloveSession;
use manus_types::{CalibrationFlags, Gesture, HandEvent, HandEventPayload, HandSide, ManusError};
use tracing::{debug, warn};

/// Distance of the target wall in front of the hands, in metres.
const WALL_DISTANCE: f32 = 2.0;
/// Haptic pulse while a hand holds a fist.
const FIST_VIBRATION: f32 = 0.6;

fn main() {
    let _telemetry = manus_runtime::init_tracing("manus");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the frame loop …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop with max_frames instead");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok((cfg, true)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok((cfg, false)) => {
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            std::process::exit(2);
        }
    };

    let calibrate = std::env::args().nth(1).as_deref() == Some("calibrate");

    if let Err(e) = run(&cfg, calibrate, &shutdown) {
        println!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cfg: &config::Config, calibrate: bool, shutdown: &AtomicBool) -> Result<(), ManusError> {
    let mut session = build_session(cfg)?;

    println!(
        "  Backend {} · {} Hz · tracking {:?} · aiming with the {} hand",
        session.backend_name().bold(),
        cfg.frame_rate_hz,
        cfg.tracking(),
        cfg.interaction_hand
    );

    if let Err(e) = session.start() {
        println!(
            "  {} {}  Running without glove data until the driver responds.",
            "⚠".yellow().bold(),
            e
        );
    }

    if calibrate {
        for side in HandSide::ALL {
            match session.calibrate(side, CalibrationFlags::default()) {
                Ok(()) => println!("  {} {} glove calibrated", "✓".green().bold(), side),
                Err(e) => println!("  {} {} glove: {}", "✗".red().bold(), side, e),
            }
        }
    }

    println!();
    let mut wall = scene::TargetWall::new(WALL_DISTANCE);
    let period = Duration::from_secs_f64(1.0 / f64::from(cfg.frame_rate_hz));

    while !shutdown.load(Ordering::SeqCst) {
        if cfg.max_frames > 0 && session.frame() >= cfg.max_frames {
            break;
        }
        let started = Instant::now();

        let report = session.tick(&mut wall);
        debug!(frame = report.frame, aim = ?report.aim, "frame done");

        for event in session.drain_events() {
            print_event(&event);
            if let HandEventPayload::GestureChanged { from, to } = event.payload {
                let power = match (from, to) {
                    (_, Gesture::Fist) => Some(FIST_VIBRATION),
                    (Gesture::Fist, _) => Some(0.0),
                    _ => None,
                };
                if let Some(power) = power
                    && let Err(e) = session.vibrate(event.hand, power)
                {
                    debug!(hand = %event.hand, error = %e, "vibration unavailable");
                }
            }
        }

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let frames = session.frame();
    session.shutdown()?;
    println!();
    println!(
        "  {} {} frames, aim line toggled {} times.",
        "✓ Done:".green().bold(),
        frames,
        wall.toggles()
    );
    Ok(())
}

fn build_session(cfg: &config::Config) -> Result<GloveSession, ManusError> {
    let transport = open_backend(
        cfg.backend.into(),
        BackendOptions {
            poll_timeout_ms: cfg.poll_timeout_ms,
            sim_frames_per_pose: cfg.sim_frames_per_pose,
            bridge_factory: None,
        },
    )?;

    let pose = match &cfg.pose_clip {
        Some(path) => PoseClip::load(path)?,
        None => PoseClip::default_curl(),
    };
    let retargeter = Retargeter::new(Box::new(pose))
        .with_time_scale(cfg.time_scale)
        .with_tracking(cfg.tracking());

    let mut session = GloveSession::new(transport, retargeter, cfg.interaction_hand);
    for side in HandSide::ALL {
        let hierarchy = match &cfg.hand_model {
            Some(path) => BoneHierarchy::load(path)?,
            None => BoneHierarchy::standard_hand(side),
        };
        session.add_hand(side, hierarchy);
    }
    Ok(session)
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_event(event: &HandEvent) {
    let hand = format!("{:>5}", event.hand.to_string()).bold();
    let time = event.timestamp.format("%H:%M:%S%.3f").to_string().dimmed();
    match &event.payload {
        HandEventPayload::GestureChanged { from, to } => {
            println!("  {time} {hand}  {} → {}", from.to_string().dimmed(), to.to_string().cyan().bold());
        }
        HandEventPayload::TransportLost { reason } => {
            println!("  {time} {hand}  {} ({reason})", "glove lost".yellow());
        }
        HandEventPayload::TransportRestored => {
            println!("  {time} {hand}  {}", "glove back".green());
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   __ _  ___ ____  __ _____"#.bold().cyan());
    println!("{}", r#"  /  ' \/ _ `/ _ \/ // (_-<"#.bold().cyan());
    println!("{}", r#" /_/_/_/\_,_/_//_/\_,_/___/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "manus".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Glove tracking, gestures and hand retargeting");
    println!();
}
