//! Native folder dialog integration using the rfd crate

use rfd::FileDialog;
use std::path::PathBuf;

/// Opens a native folder picker for choosing where exports are saved.
///
/// Returns `Some(PathBuf)` if a folder was selected, `None` if cancelled.
pub fn pick_output_folder(initial_dir: Option<&PathBuf>) -> Option<PathBuf> {
    let mut dialog = FileDialog::new().set_title("Choose Export Folder");

    if let Some(dir) = initial_dir {
        dialog = dialog.set_directory(dir);
    }

    dialog.pick_folder()
}
