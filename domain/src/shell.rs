//! Quoting helpers for command lines handed to a shell.

use std::borrow::Cow;

use crate::error::HandlerError;

/// Quote a single word so the shell reads it back verbatim.
pub fn quote(word: &str) -> Result<Cow<'_, str>, HandlerError> {
    shlex::try_quote(word).map_err(|_| HandlerError::Quote(word.to_owned()))
}

/// Join an argument list into one shell command line.
pub fn join<'a, I>(words: I) -> Result<String, HandlerError>
where
    I: IntoIterator<Item = &'a str>,
{
    let words: Vec<&str> = words.into_iter().collect();
    shlex::try_join(words.iter().copied()).map_err(|_| HandlerError::Quote(words.join(" ")))
}
