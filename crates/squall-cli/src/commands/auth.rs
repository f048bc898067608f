use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{Context as _, bail};

use squall_control::TOKEN_ENV;

use super::Context;

pub fn login(ctx: &Context, with_token: bool) -> anyhow::Result<()> {
    let store = ctx.token_store()?;
    let token = if with_token {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail!("nothing read from stdin\nTry: squall auth login --with-token < token.txt");
        }
        read_token(stdin.lock())?
    } else {
        prompt_token(&mut io::stdin().lock(), &mut io::stdout())?
    };

    store.set(&token)?;
    println!("Token stored in {}", store.location());
    Ok(())
}

pub fn logout(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.token_store()?;
    println!("Removing stored token, if it exists.");
    store.delete()?;
    Ok(())
}

pub fn show(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.token_store()?;
    let env = std::env::var(TOKEN_ENV).unwrap_or_default();
    let stored = store.get()?;

    if env.is_empty() && stored.is_none() {
        bail!(
            "no token found. Please login with 'squall auth login' or set the {TOKEN_ENV} environment variable"
        );
    }
    println!("{TOKEN_ENV}=\"{env}\"");
    println!("Token from {}: {}", store.location(), stored.unwrap_or_default());
    Ok(())
}

/// Whole input, trimmed. Empty input is an error.
fn read_token<R: Read>(mut input: R) -> anyhow::Result<String> {
    let mut raw = String::new();
    input.read_to_string(&mut raw).context("read token from stdin")?;
    let token = raw.trim();
    if token.is_empty() {
        bail!("empty token\nTry: squall auth login --with-token < token.txt");
    }
    Ok(token.to_string())
}

/// Ask until a non-empty key is entered.
fn prompt_token<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> anyhow::Result<String> {
    let mut line = String::new();
    loop {
        write!(output, "Input your API Key: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            bail!("no API Key entered");
        }
        let token = line.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
        writeln!(output, "API Key cannot be empty.")?;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn stdin_token_is_trimmed() {
        assert_eq!(read_token("  tok-123\n".as_bytes()).unwrap(), "tok-123");
        assert!(read_token(" \n".as_bytes()).unwrap_err().to_string().starts_with("empty token"));
    }

    #[test]
    fn prompt_skips_blank_lines() {
        let mut out = Vec::new();
        let token = prompt_token(&mut Cursor::new("\n  \nkey-1\n"), &mut out).unwrap();
        assert_eq!(token, "key-1");

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Input your API Key: ").count(), 3);
        assert_eq!(out.matches("API Key cannot be empty.").count(), 2);
    }

    #[test]
    fn prompt_fails_at_end_of_input() {
        let mut out = Vec::new();
        assert!(prompt_token(&mut Cursor::new(""), &mut out).is_err());
    }
}
