//! Prompt rendering - git-aware prompt line for the current directory
//!
//! Inside a git checkout the prompt looks like `bash: repo git:(main): `,
//! elsewhere it falls back to `bash: dir `. Colors come from a [`Palette`]
//! chosen once when the session is created.

use crossterm::style::{style, Color, Stylize};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Branch reference line inside `.git/HEAD`
static HEAD_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ref: refs/heads/(.*)").expect("HEAD_REF is a valid pattern"));

/// Prompt-specific errors
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Error reading git HEAD file {}: {source}", path.display())]
    MetadataReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How prompt segments are decorated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Bold ANSI colors
    Ansi,
    /// No escape sequences at all
    Plain,
}

/// Role of a prompt segment, mapped to a color by the palette
#[derive(Debug, Clone, Copy)]
enum Tone {
    Label,
    Location,
    Vcs,
}

impl Palette {
    pub fn from_colors(colors: bool) -> Self {
        if colors {
            Palette::Ansi
        } else {
            Palette::Plain
        }
    }

    fn paint(self, text: &str, tone: Tone) -> String {
        match self {
            Palette::Plain => text.to_string(),
            Palette::Ansi => {
                let color = match tone {
                    Tone::Label => Color::Red,
                    Tone::Location => Color::Yellow,
                    Tone::Vcs => Color::Blue,
                };
                style(text).with(color).bold().to_string()
            }
        }
    }
}

/// Renders the prompt line shown before each command
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    /// Terminal name shown first, e.g. `bash`
    label: String,
    palette: Palette,
}

impl PromptRenderer {
    pub fn new(label: impl Into<String>, palette: Palette) -> Self {
        Self {
            label: label.into(),
            palette,
        }
    }

    /// Render the prompt for `cwd`.
    ///
    /// Never fails: an unreadable `.git/HEAD` is logged and the plain form is
    /// used instead.
    pub fn render(&self, cwd: &Path, display_whole_path: bool) -> String {
        let label = self.palette.paint(&format!("{}: ", self.label), Tone::Label);
        let location = if display_whole_path {
            cwd.display().to_string()
        } else {
            final_segment(cwd)
        };

        if let Some(head) = find_git_head(cwd) {
            match read_branch(&head) {
                Ok(branch) => {
                    let mut info = self.palette.paint(&location, Tone::Label);
                    if let Some(branch) = branch {
                        info.push(' ');
                        info.push_str(&self.branch_segment(&branch));
                    }
                    return format!("{}{}: ", label, info);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        format!(
            "{}{}",
            label,
            self.palette.paint(&format!("{} ", location), Tone::Location)
        )
    }

    fn branch_segment(&self, branch: &str) -> String {
        format!(
            "{}{}{}",
            self.palette.paint("git:(", Tone::Vcs),
            self.palette.paint(branch, Tone::Location),
            self.palette.paint(")", Tone::Vcs)
        )
    }
}

/// Last component of `path`, or `/` when there is none
pub fn final_segment(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "/".to_string())
}

/// Find the nearest `.git/HEAD` at or above `start`
pub fn find_git_head(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".git").join("HEAD"))
        .find(|head| head.exists())
}

/// Read the checked-out branch from a `.git/HEAD` file.
///
/// Returns `Ok(None)` for a detached HEAD. When several lines match, the last
/// one wins.
pub fn read_branch(head: &Path) -> Result<Option<String>, PromptError> {
    let content =
        std::fs::read_to_string(head).map_err(|source| PromptError::MetadataReadFailure {
            path: head.to_path_buf(),
            source,
        })?;

    Ok(content
        .lines()
        .filter_map(|line| HEAD_REF.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|branch| branch.as_str().to_string())
        .last())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_segment() {
        assert_eq!(final_segment(Path::new("/a/b/c")), "c");
        assert_eq!(final_segment(Path::new("/")), "/");
    }

    #[test]
    fn test_blank_segment_falls_back_to_root() {
        assert_eq!(final_segment(Path::new("/a/ ")), "/");
    }

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let painted = Palette::Plain.paint("bash: ", Tone::Label);
        assert_eq!(painted, "bash: ");
    }
}
