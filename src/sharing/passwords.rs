//! Password intake seam
//!
//! Prompting is owned by the (out-of-scope) interactive front end; this crate
//! only defines the seam so recovery flows can be driven by a terminal, a
//! test script, or any other source.

use std::collections::VecDeque;

use crate::errors::{WalletError, WalletResult};

/// Source of operator-entered passwords.
pub trait PasswordSource {
    /// Read one password for the given prompt.
    fn read_password(&mut self, prompt: &str) -> WalletResult<String>;
}

/// Collect one password per share slot, confirming each entry.
///
/// A confirmation mismatch re-prompts the same slot; it is never an error.
pub fn collect_share_passwords<S: PasswordSource>(
    source: &mut S,
    n: u8,
) -> WalletResult<Vec<String>> {
    let mut passwords = Vec::with_capacity(n as usize);
    for slot in 0..n {
        loop {
            let first = source.read_password(&format!("Password for share {slot}"))?;
            let confirm = source.read_password(&format!("Confirm password for share {slot}"))?;
            if first == confirm {
                passwords.push(first);
                break;
            }
            tracing::warn!(slot, "password confirmation mismatch, try again");
        }
    }
    Ok(passwords)
}

/// Scripted password source for tests and non-interactive callers.
pub struct ScriptedPasswords {
    queue: VecDeque<String>,
}

impl ScriptedPasswords {
    pub fn new<I, S>(passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: passwords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl PasswordSource for ScriptedPasswords {
    fn read_password(&mut self, _prompt: &str) -> WalletResult<String> {
        self.queue
            .pop_front()
            .ok_or_else(|| WalletError::InvalidInput("password source exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_mismatch_reprompts_the_same_slot() {
        // Slot 0: mismatch once, then a matching pair. Slot 1: immediate match.
        let mut source =
            ScriptedPasswords::new(["alpha", "aplha", "alpha", "alpha", "beta", "beta"]);
        let passwords = collect_share_passwords(&mut source, 2).unwrap();
        assert_eq!(passwords, vec!["alpha".to_string(), "beta".to_string()]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn exhausted_source_errors() {
        let mut source = ScriptedPasswords::new(["only-one"]);
        assert!(collect_share_passwords(&mut source, 1).is_err());
    }
}
