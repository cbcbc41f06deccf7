//! `load` command: print module values, optionally reloading on Enter.

use anyhow::{Result, bail};
use dynreload::{ModuleHandle, ReloadError, Reloader, log};
use std::io::{self, BufRead, Write};

/// Load every specifier once, then keep reloading if `interactive`.
pub fn run(reloader: &Reloader, specifiers: &[String], pretty: bool, interactive: bool) -> Result<()> {
    let failed = load_all(reloader, specifiers, pretty)?;

    if interactive {
        if reloader.config().use_cache {
            log!("hint"; "caching is on, pass --no-cache to pick up edits");
        }
        return prompt_loop(reloader, specifiers, pretty, io::stdin().lock());
    }

    if failed > 0 {
        bail!("{} of {} module(s) failed to load", failed, specifiers.len());
    }
    Ok(())
}

/// Load and print each specifier. Returns how many failed.
fn load_all(reloader: &Reloader, specifiers: &[String], pretty: bool) -> Result<usize> {
    let mut stdout = io::stdout().lock();
    let mut failed = 0;

    for specifier in specifiers {
        match reloader.load(specifier) {
            Ok(module) => writeln!(stdout, "{}", render(&module, pretty)?)?,
            Err(err) => {
                failed += 1;
                report(reloader, &err);
            }
        }
    }

    stdout.flush()?;
    Ok(failed)
}

/// Wait for input: an empty line reloads, `q` or EOF quits.
fn prompt_loop(
    reloader: &Reloader,
    specifiers: &[String],
    pretty: bool,
    mut input: impl BufRead,
) -> Result<()> {
    loop {
        eprint!("Press Enter to reload, q to quit: ");
        io::stderr().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if matches!(line.trim().to_lowercase().as_str(), "q" | "quit") {
            return Ok(());
        }

        load_all(reloader, specifiers, pretty)?;
    }
}

/// JSON rendering of a module's value.
pub fn render(module: &ModuleHandle, pretty: bool) -> Result<String> {
    let value = module.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

/// The reloader already logs failures unless silent; not-found and caller
/// errors are never logged there.
fn report(reloader: &Reloader, err: &ReloadError) {
    match err {
        ReloadError::LoadFailure { .. } if !reloader.config().silent => {}
        ReloadError::ModuleNotFound { specifier, tried } => {
            log!("error"; "module not found: {}", specifier);
            for candidate in tried {
                eprintln!("- {}", candidate.display());
            }
        }
        other => log!("error"; "{}", other),
    }
}
