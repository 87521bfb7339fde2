pub mod create;
pub mod delete;
pub mod init;
pub mod list;
pub mod session;
pub mod show;
pub mod stats;
pub mod update;
pub mod watch;

use crate::error::FieldErrors;

pub(crate) fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors {
        eprintln!("  {}: {}", field, message);
    }
}
