pub mod fzf_invoker;
pub mod integrity;

use std::io::{self, BufRead, Write};

use self::fzf_invoker::FzfInvoker;
use anyhow::{Context, Result};

/// Wrapper around the `termenu` picker that keeps the UX consistent across the
/// project. The helper converts the supplied items into `String`s so callers do
/// not have to worry about ownership. `None` means the menu was cancelled.
pub fn choose_one<S: ToString>(title: &str, items: Vec<S>) -> Result<Option<String>> {
    let display_items: Vec<String> = items.into_iter().map(|s| s.to_string()).collect();
    let picker = FzfInvoker::new(title.to_string(), display_items);
    picker.invoke().context("show menu")
}

/// Ask for one line on stdin. Returns `None` at end of input.
pub fn prompt(label: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    prompt_from(&mut stdin.lock(), &mut io::stderr(), label)
}

fn prompt_from(
    input: &mut impl BufRead,
    output: &mut impl Write,
    label: &str,
) -> Result<Option<String>> {
    write!(output, "{label}: ").context("write prompt")?;
    output.flush().context("flush prompt")?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("read answer")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
