//! Composition root: wires configuration, the secret, the embedded server
//! and the main window together, and maps host lifecycle signals onto
//! `start`/`stop`.
//!
//! Every startup failure is fatal. The host never shows a window for a
//! server that did not come up behind the auth gate.

use crate::error::HearthError;
use crate::frontend::FrontendListener;
use crate::proxy::LoopbackProxy;
use crate::state::AppState;
use crate::window::create_main_window;

use server_core::config::{EnvOverrides, Mode, ServerEnvironment, ShellConfig};
use server_core::lifecycle::{
    LifecycleSettings, RequestListener, ServerLifecycle, ServerPhase, wait_until_ready,
};
use server_core::secret::generate_secret;

use common::RedactedSecret;

use std::fs::create_dir_all;
use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};
use tauri::{AppHandle, Manager, RunEvent, Runtime};

/// Everything needed to construct the lifecycle manager.
#[derive(Debug)]
pub struct StartupPlan {
    pub environment: ServerEnvironment,
    pub settings: LifecycleSettings,
    pub probe_timeout: Duration,
}

/// Resolve mode, overrides and auth policy into a startup plan.
///
/// `build` is the mode of the running binary; overrides can only move a
/// development build.
///
/// # Errors
///
/// Returns [`HearthError::Core`] if the overridden config is invalid or the
/// environment cannot be built.
pub fn plan_startup(
    mut config: ShellConfig,
    overrides: &EnvOverrides,
    build: Mode,
    app_data_dir: &Path,
    secret: RedactedSecret,
) -> Result<StartupPlan, HearthError> {
    let mode = overrides.mode_for(build);

    config.apply_overrides(overrides);
    config.validate()?;

    let auth_required = config.effective_auth_required(mode);
    if !auth_required {
        warn!("Auth gate disabled for this {mode} run");
    }

    let environment = ServerEnvironment::builder()
        .with_app_data_dir(app_data_dir)
        .with_mode(mode)
        .with_auth_required(auth_required)
        .with_secret(secret)
        .build()?;

    info!(
        "Startup plan: mode={mode}, auth_required={auth_required}, database={}",
        environment.database_path().display()
    );

    Ok(StartupPlan {
        environment,
        settings: LifecycleSettings::from(&config.server),
        probe_timeout: config.server.probe_timeout(),
    })
}

/// Start the server and, for a local server, wait until it answers.
///
/// A failed readiness probe stops the server again before returning.
///
/// # Errors
///
/// Returns [`HearthError::Core`] on start or probe failure.
pub async fn launch<L: RequestListener>(
    lifecycle: &ServerLifecycle,
    listener: L,
    probe_timeout: Duration,
) -> Result<u16, HearthError> {
    let port = lifecycle.start(listener).await?;

    if let ServerPhase::Running { local: true, .. } = lifecycle.phase().await {
        let credential = lifecycle.credential();
        if let Err(e) = wait_until_ready(port, credential.as_ref(), probe_timeout).await {
            error!("Embedded server failed readiness check: {e}");
            if let Err(stop_err) = lifecycle.stop().await {
                warn!("Failed to stop server after readiness failure: {stop_err}");
            }
            return Err(e.into());
        }
    }

    Ok(port)
}

/// Build the managed state from the Tauri path resolver and process environment.
///
/// The shared secret is generated here, once per process.
pub fn prepare<R: Runtime>(app: &AppHandle<R>) -> Result<AppState, HearthError> {
    let paths = app.path();

    let config_dir = paths
        .app_config_dir()
        .map_err(|e| HearthError::hearth(format!("Failed to get config directory: {e}")))?;
    let app_data_dir = paths
        .app_data_dir()
        .map_err(|e| HearthError::hearth(format!("Failed to get app data directory: {e}")))?;
    create_dir_all(&app_data_dir).map_err(|e| {
        HearthError::hearth(format!("Failed to create app data directory: {e}"))
    })?;

    let resource_dir = paths
        .resource_dir()
        .map_err(|e| HearthError::hearth(format!("Failed to get resource directory: {e}")))?;

    let config = ShellConfig::load_or_create(&config_dir)?;
    let overrides = EnvOverrides::from_process_env()?;
    let secret = generate_secret()?;

    let plan = plan_startup(config, &overrides, Mode::from_build(), &app_data_dir, secret)?;
    let lifecycle = ServerLifecycle::new(plan.environment, plan.settings);

    Ok(AppState::new(
        lifecycle,
        FrontendListener::from_resource_dir(&resource_dir),
        LoopbackProxy::new()?,
        plan.probe_timeout,
    ))
}

/// Bring the server up and open the main window.
pub fn open<R: Runtime>(app: &AppHandle<R>, state: &AppState) -> Result<(), HearthError> {
    let port = tauri::async_runtime::block_on(launch(
        state.lifecycle(),
        state.frontend().clone(),
        state.probe_timeout(),
    ))?;

    create_main_window(app, state.mode(), port)?;
    Ok(())
}

/// Map Tauri run events onto the server lifecycle.
///
/// Closing the last window and quitting both stop the server; stopping twice
/// is harmless. On macOS the app stays alive with no windows and a reopen
/// brings the server and the window back.
pub fn handle_run_event<R: Runtime>(app: &AppHandle<R>, event: RunEvent) {
    match event {
        RunEvent::ExitRequested { code, api, .. } => {
            stop_server(app, "exit requested");
            if code.is_none() && keeps_running_without_windows() {
                debug!("All windows closed; staying alive until reopen");
                api.prevent_exit();
            }
        }
        RunEvent::Exit => stop_server(app, "exit"),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows,
            ..
        } => {
            if !has_visible_windows && app.webview_windows().is_empty() {
                reopen(app);
            }
        }
        _ => {}
    }
}

/// Whether closing every window leaves the application running.
pub const fn keeps_running_without_windows() -> bool {
    cfg!(target_os = "macos")
}

fn stop_server<R: Runtime>(app: &AppHandle<R>, reason: &str) {
    let Some(state) = app.try_state::<AppState>() else {
        debug!("Stop on {reason} skipped: no server state");
        return;
    };

    match tauri::async_runtime::block_on(state.lifecycle().stop()) {
        Ok(outcome) => info!("Server stop on {reason}: {outcome:?}"),
        Err(e) => error!("Server stop on {reason} failed: {e}"),
    }
}

#[cfg(target_os = "macos")]
fn reopen<R: Runtime>(app: &AppHandle<R>) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };

    info!("Reopen requested; restarting server and window");
    if let Err(e) = open(app, &state) {
        error!("Reopen failed, exiting: {e}");
        app.exit(1);
    }
}

/// Log a fatal startup error and exit with a non-zero status.
pub fn fail_closed(error: &dyn std::error::Error) -> ! {
    error!("Fatal startup error: {error}");
    eprintln!("Hearth failed to start: {error}");
    std::process::exit(1)
}
