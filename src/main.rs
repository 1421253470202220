mod errors;
mod logging;
mod config;
mod initialization;
mod models;
mod parsers;
mod manager_wbgt;
mod manager_scrape;
mod wbgt_level;
mod snapshot;
mod storage;
mod collector;
mod dashboard;
mod worker;

use std::env;
use std::process::ExitCode;
use anyhow::anyhow;
use log::error;
use crate::initialization::config;

fn main() -> ExitCode {
    let mode = env::args().nth(1).unwrap_or("fetch".to_string());

    let config = match config(&mode) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match mode.as_str() {
        "fetch" => collector::run(&config),
        "render" => worker::render_once(&config),
        "watch" => worker::run(&config),
        other => Err(anyhow!("unknown mode '{}', expected fetch, render or watch", other)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
