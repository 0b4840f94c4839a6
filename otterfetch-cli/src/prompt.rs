//! Interactive overwrite confirmation.

use std::path::Path;

use dialoguer::Confirm;
use otterfetch::Confirmation;

/// Asks on the terminal whether an existing file may be overwritten.
/// Anything but an explicit yes counts as a decline, including a failed
/// prompt on a non-interactive stdin.
pub struct InteractiveConfirmation;

impl Confirmation for InteractiveConfirmation {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        Confirm::new()
            .with_prompt(format!(
                "File {} already exists. Do you want to overwrite it?",
                path.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
