mod app;
mod catalog;
mod config;
mod engine;
mod error;
mod player;
mod runtime;
mod ui;

fn main() -> anyhow::Result<()> {
    runtime::run()
}
