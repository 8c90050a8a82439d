//! Script splitting on a delimiter line

/// Delimiter token recognized by default
pub const DEFAULT_DELIMITER: &str = "GO";

/// One block of statement text between delimiter lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptUnit {
    /// 1-based position among the non-empty units
    pub ordinal: usize,
    /// 1-based script line of the unit's first statement line
    pub start_line: usize,
    /// Non-blank lines, verbatim, each terminated by `\n`
    pub text: String,
}

/// Split `raw` into units.
///
/// A line is a delimiter only when its trimmed content equals `delimiter`
/// exactly (case-sensitive). Blank lines are dropped and units that end up
/// empty are discarded.
pub fn split_script(raw: &str, delimiter: &str) -> Vec<ScriptUnit> {
    let mut units = Vec::new();
    let mut text = String::new();
    let mut start_line = 0;

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed == delimiter {
            push_unit(&mut units, &mut text, start_line);
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if text.is_empty() {
            start_line = idx + 1;
        }
        text.push_str(line);
        text.push('\n');
    }
    push_unit(&mut units, &mut text, start_line);

    units
}

fn push_unit(units: &mut Vec<ScriptUnit>, text: &mut String, start_line: usize) {
    if text.is_empty() {
        return;
    }
    units.push(ScriptUnit {
        ordinal: units.len() + 1,
        start_line,
        text: std::mem::take(text),
    });
}
