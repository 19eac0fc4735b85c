//! Injected policies for script names and delete confirmation

use std::sync::LazyLock;

use regex::Regex;
use rgss_fs::validate_path_identifier;
use rgss_index::is_placeholder;

use crate::tree::ScriptNode;

/// Decides whether a script name may be used as a file name.
pub trait NamePolicy {
    /// Returns the reason when `name` is rejected.
    fn validate(&self, name: &str) -> Result<(), String>;
}

/// Names that any common filesystem accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamePolicy;

const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

impl NamePolicy for DefaultNamePolicy {
    fn validate(&self, name: &str) -> Result<(), String> {
        validate_path_identifier(name, "Script name")?;
        if name.trim() != name {
            return Err("must not start or end with whitespace".to_string());
        }
        if name.ends_with('.') {
            return Err("must not end with '.'".to_string());
        }
        if let Some(c) = name
            .chars()
            .find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control())
        {
            return Err(format!("must not contain {:?}", c));
        }
        if is_placeholder(name) {
            return Err("Untitled_<n> is reserved for untitled scripts".to_string());
        }
        Ok(())
    }
}

static WORD_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("Invalid word name regex"));

/// Word characters only: letters, digits and underscores.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictNamePolicy;

impl NamePolicy for StrictNamePolicy {
    fn validate(&self, name: &str) -> Result<(), String> {
        DefaultNamePolicy.validate(name)?;
        if !WORD_NAME_REGEX.is_match(name) {
            return Err("only letters, digits and '_' are allowed".to_string());
        }
        Ok(())
    }
}

/// Asks whether a script may be deleted.
pub trait ConfirmPolicy {
    fn confirm_delete(&self, node: &ScriptNode) -> bool;
}

/// Confirms every delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmPolicy for AutoConfirm {
    fn confirm_delete(&self, _node: &ScriptNode) -> bool {
        true
    }
}

impl<F> ConfirmPolicy for F
where
    F: Fn(&ScriptNode) -> bool,
{
    fn confirm_delete(&self, node: &ScriptNode) -> bool {
        self(node)
    }
}
