// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use hearth::commands;
use hearth::error::HearthError;
use hearth::host;
use hearth::logger::initialize as LoggerInitialize;
use hearth::proxy;

use std::fs::create_dir_all;

use log::info;
use tauri::Manager;

fn main() {
    let app = proxy::register(tauri::Builder::default())
        .invoke_handler(tauri::generate_handler![
            commands::server::get_auth_credential,
            commands::server::get_server_status,
        ])
        .setup(|app| {
            let log_dir = app
                .path()
                .app_log_dir()
                .map_err(|e| HearthError::hearth(format!("Failed to get log directory: {e}")))?;

            create_dir_all(&log_dir)
                .map_err(|e| HearthError::hearth(format!("Failed to create log directory: {e}")))?;

            // Logger first so every later failure is recorded
            LoggerInitialize(&log_dir)?;

            info!("Hearth starting");

            // Managed before the window opens so the proxy can reach it
            let state = host::prepare(app.handle())?;
            app.manage(state.clone());
            host::open(app.handle(), &state)?;

            info!("Hearth started");
            Ok(())
        })
        .build(tauri::generate_context!());

    match app {
        Ok(app) => app.run(|handle, event| host::handle_run_event(handle, event)),
        Err(e) => host::fail_closed(&e),
    }
}
