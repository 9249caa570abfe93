//! Obsidian vault persistence.

mod vault;

pub use vault::{note_file_name, render_note, ObsidianVault, SaveOutcome, VaultError};
