//! Command line construction for the transfer tool.
//!
//! - [`Invocation`]: the ordered program + argument list handed to a hook
//! - [`CommandBuilder`]: turns a validated task and its connection into an
//!   [`Invocation`]
//!
//! Flag order is part of the output contract. Logs and replay tooling compare
//! command lines token by token, so the builder only ever walks fixed field
//! sequences and insertion-ordered maps.

mod builder;

pub use builder::{build, CommandBuilder};

use serde::Serialize;
use std::fmt;

/// Placeholder that replaces secrets in rendered command lines.
pub const MASK: &str = "MASKED";

/// Flags whose following token is a secret.
const SECRET_FLAGS: &[&str] = &["--password"];

/// A fully resolved command line.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program followed by every argument.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }

    /// Position of `token` in [`tokens`](Self::tokens), if present.
    pub fn position(&self, token: &str) -> Option<usize> {
        self.tokens().position(|t| t == token)
    }

    /// Token following `flag`, if the flag is present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        let idx = self.args.iter().position(|a| a == flag)?;
        self.args.get(idx + 1).map(String::as_str)
    }

    /// Command line safe for logs: secrets replaced by [`MASK`].
    pub fn masked(&self) -> String {
        let mut rendered = Vec::with_capacity(self.args.len() + 1);
        rendered.push(quote(&self.program));

        let mut hide_next = false;
        for arg in &self.args {
            if hide_next {
                rendered.push(MASK.to_string());
            } else {
                rendered.push(quote(arg));
            }
            hide_next = SECRET_FLAGS.contains(&arg.as_str());
        }
        rendered.join(" ")
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        format!("'{}'", token.replace('\'', "'\\''"))
    } else {
        token.to_string()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Invocation").field(&self.masked()).finish()
    }
}
