//! Handlers for the `start`, `stop` and `status` subcommands.

use std::io::Write;

use kartina_supervisor::SysinfoInspector;

pub fn handle_start() -> anyhow::Result<()> {
    let config = kartina_config::discover_and_load();
    let mut inspector = SysinfoInspector::new();
    kartina_supervisor::start(&mut inspector, &config.supervisor, &mut console_prompt)?;
    Ok(())
}

pub fn handle_stop() -> anyhow::Result<()> {
    let mut inspector = SysinfoInspector::new();
    kartina_supervisor::stop(&mut inspector);
    Ok(())
}

pub fn handle_status() -> anyhow::Result<()> {
    let mut inspector = SysinfoInspector::new();
    kartina_supervisor::status(&mut inspector);
    Ok(())
}

/// Print a question and read one answer line from the terminal.
fn console_prompt(question: &str) -> std::io::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
