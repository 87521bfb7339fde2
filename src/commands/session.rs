use anyhow::{bail, Result};

use crate::commands::print_field_errors;
use crate::error::AuthError;
use crate::models::Session;
use crate::session::SessionGate;

/// Admission check shared by every protected command. The CLI equivalent of
/// redirecting an unauthenticated view to the login screen.
pub fn require_login(gate: &SessionGate) -> Result<Session> {
    match gate.current()? {
        Some(session) if session.is_authenticated => Ok(session),
        _ => bail!("Not logged in. Run 'novaticket login <email> <password>' first."),
    }
}

pub fn sign_up(gate: &SessionGate, email: &str, full_name: &str, password: &str) -> Result<()> {
    match gate.sign_up(email, full_name, password) {
        Ok(user) => {
            println!("Account created for {}. Please log in.", user.email);
            Ok(())
        }
        Err(AuthError::Validation(errors)) => {
            print_field_errors(&errors);
            bail!("Please correct the errors before proceeding");
        }
        Err(AuthError::EmailTaken) => {
            bail!("An account with this email already exists");
        }
        Err(err) => Err(err.into()),
    }
}

pub fn log_in(gate: &SessionGate, email: &str, password: &str) -> Result<()> {
    match gate.log_in(email, password) {
        Ok(session) => {
            println!("Login successful! Welcome back, {}.", session.first_name());
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => {
            bail!("Invalid email or password. Please try again.");
        }
        Err(err) => Err(err.into()),
    }
}

pub fn log_out(gate: &SessionGate) -> Result<()> {
    if gate.current()?.is_none() {
        println!("Not logged in.");
        return Ok(());
    }
    gate.clear()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(gate: &SessionGate) -> Result<()> {
    match gate.current()? {
        Some(session) => {
            println!("{} <{}>", session.full_name, session.email);
            println!("Logged in since {}", session.login_time.format("%Y-%m-%d %H:%M:%S"));
        }
        None => println!("Not logged in."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::Arc;

    fn setup_gate() -> SessionGate {
        SessionGate::new(Arc::new(MemoryStorage::new()) as Arc<dyn Storage>)
    }

    #[test]
    fn test_require_login_rejects_without_session() {
        let gate = setup_gate();
        let err = require_login(&gate).unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[test]
    fn test_require_login_admits_after_login() {
        let gate = setup_gate();
        sign_up(&gate, "ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        log_in(&gate, "ada@example.com", "difference-engine").unwrap();

        let session = require_login(&gate).unwrap();
        assert_eq!(session.email, "ada@example.com");
    }

    #[test]
    fn test_require_login_rejects_after_logout() {
        let gate = setup_gate();
        sign_up(&gate, "ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        log_in(&gate, "ada@example.com", "difference-engine").unwrap();
        log_out(&gate).unwrap();

        assert!(require_login(&gate).is_err());
    }

    #[test]
    fn test_sign_up_surfaces_validation_failure() {
        let gate = setup_gate();
        let err = sign_up(&gate, "bad", "X", "pw").unwrap_err();
        assert!(err.to_string().contains("correct the errors"));
    }

    #[test]
    fn test_duplicate_signup_message() {
        let gate = setup_gate();
        sign_up(&gate, "ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        let err = sign_up(&gate, "ada@example.com", "Ada Again", "difference-engine").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_wrong_credentials_message() {
        let gate = setup_gate();
        sign_up(&gate, "ada@example.com", "Ada Lovelace", "difference-engine").unwrap();
        let err = log_in(&gate, "ada@example.com", "nope!").unwrap_err();
        assert!(err.to_string().contains("Invalid email or password"));
    }

    #[test]
    fn test_log_out_when_not_logged_in_is_fine() {
        let gate = setup_gate();
        assert!(log_out(&gate).is_ok());
    }
}
