use askama::Template;

use super::WorkspaceError;

/// Substituted when the workspace listing is empty
pub const NO_FILES: &str = "No files found in workspace";

#[derive(Template)]
#[template(path = "instructions.txt")]
pub struct InstructionsTemplate<'a> {
    pub files: &'a str,
}

/// Render the usage instructions around a file listing
///
/// The listing is embedded verbatim; an empty listing becomes [`NO_FILES`].
pub fn render_instructions(listing: &str) -> Result<String, WorkspaceError> {
    let files = if listing.is_empty() { NO_FILES } else { listing };
    Ok(InstructionsTemplate { files }.render()?)
}
