// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered, anchored line matching.

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

use super::{FieldMap, UpdateRoutine};

/// A line pattern bound to an update routine.
#[derive(Debug, Clone)]
pub struct ResponsePattern {
    id: String,
    regex: Regex,
    routine: UpdateRoutine,
}

impl ResponsePattern {
    /// Compiles a pattern.
    ///
    /// The expression is anchored to the whole line, matched without regard
    /// to case, and allowed trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Pattern` if the expression does not compile, or
    /// `ConfigError::MissingCaptureGroup` if it lacks a named group the
    /// routine reads.
    pub fn new(id: impl Into<String>, expression: &str, routine: UpdateRoutine) -> Result<Self, ConfigError> {
        let id = id.into();
        let regex = RegexBuilder::new(&format!(r"^(?:{expression})\s*$"))
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::Pattern { id: id.clone(), source })?;

        for &group in routine.required_groups() {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(ConfigError::MissingCaptureGroup { pattern: id, group });
            }
        }

        Ok(Self { id, regex, routine })
    }

    /// Returns the pattern identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the bound update routine.
    #[must_use]
    pub fn routine(&self) -> UpdateRoutine {
        self.routine
    }

    /// Matches a trimmed line, returning its named captures.
    ///
    /// Groups that did not participate in the match are left out.
    #[must_use]
    pub fn captures(&self, line: &str) -> Option<FieldMap> {
        let caps = self.regex.captures(line)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
                .collect(),
        )
    }
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    /// Identifier of the matching pattern.
    pub pattern: &'a str,
    /// Routine the pattern is bound to.
    pub routine: UpdateRoutine,
    /// Named captures.
    pub fields: FieldMap,
}

/// Response patterns in declaration order.
///
/// # Examples
///
/// ```
/// use niles_lib::response::{ResponseMatcher, ResponsePattern, UpdateRoutine};
///
/// let matcher = ResponseMatcher::new(vec![
///     ResponsePattern::new("activeZone", r"rznc,4,(?P<zone>\d+)", UpdateRoutine::ActiveZoneChanged).unwrap(),
/// ]);
///
/// let found = matcher.match_line("RZNC,4,7 \r\n").unwrap();
/// assert_eq!(found.pattern, "activeZone");
/// assert_eq!(found.fields["zone"], "7");
/// assert!(matcher.match_line("rznc,4,7x").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseMatcher {
    patterns: Vec<ResponsePattern>,
}

impl ResponseMatcher {
    /// Creates a matcher trying `patterns` in order.
    #[must_use]
    pub fn new(patterns: Vec<ResponsePattern>) -> Self {
        Self { patterns }
    }

    /// Returns the patterns in match order.
    #[must_use]
    pub fn patterns(&self) -> &[ResponsePattern] {
        &self.patterns
    }

    /// Finds the first pattern matching the trimmed line.
    #[must_use]
    pub fn match_line(&self, raw: &str) -> Option<LineMatch<'_>> {
        let line = raw.trim();
        self.patterns.iter().find_map(|pattern| {
            pattern.captures(line).map(|fields| LineMatch {
                pattern: pattern.id(),
                routine: pattern.routine(),
                fields,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = r"usc,2,(?P<zone>\d+),(?P<source>\d+),(?P<onOff>\d+),(?P<volume>\d+),(?P<mute>\d+),(?P<bass>-?\d+),(?P<treble>-?\d+)";
    const ACTIVE: &str = r"rznc,4,(?P<zone>\d+)";

    fn matcher() -> ResponseMatcher {
        ResponseMatcher::new(vec![
            ResponsePattern::new("zoneStatus", STATUS, UpdateRoutine::FullZoneStatus).unwrap(),
            ResponsePattern::new("activeZone", ACTIVE, UpdateRoutine::ActiveZoneChanged).unwrap(),
        ])
    }

    #[test]
    fn status_line_fields() {
        let m = matcher();
        let found = m.match_line("usc,2,3,2,1,45,0,6,7").unwrap();
        assert_eq!(found.pattern, "zoneStatus");
        assert_eq!(found.routine, UpdateRoutine::FullZoneStatus);
        assert_eq!(found.fields["zone"], "3");
        assert_eq!(found.fields["onOff"], "1");
        assert_eq!(found.fields["treble"], "7");
        assert_eq!(found.fields.len(), 7);
    }

    #[test]
    fn trailing_whitespace_tolerated() {
        assert!(matcher().match_line("rznc,4,7   \r").is_some());
    }

    #[test]
    fn partial_lines_do_not_match() {
        let m = matcher();
        assert!(m.match_line("xrznc,4,7").is_none());
        assert!(m.match_line("rznc,4,7,8").is_none());
        assert!(m.match_line("usc,2,3,2,1,45,0,6").is_none());
        assert!(m.match_line("garbage").is_none());
        assert!(m.match_line("").is_none());
    }

    #[test]
    fn first_match_wins() {
        let m = ResponseMatcher::new(vec![
            ResponsePattern::new("first", r"rznc,4,(?P<zone>\d+)", UpdateRoutine::ActiveZoneChanged).unwrap(),
            ResponsePattern::new("second", r"rznc,(?P<zone>\d+),\d+", UpdateRoutine::ActiveZoneChanged).unwrap(),
        ]);
        assert_eq!(m.match_line("rznc,4,2").unwrap().pattern, "first");
        assert_eq!(m.match_line("rznc,5,2").unwrap().pattern, "second");
    }

    #[test]
    fn alternation_stays_anchored() {
        let p = ResponsePattern::new("alt", r"a(?P<zone>1)|b(?P<zone2>2)", UpdateRoutine::ActiveZoneChanged).unwrap();
        assert!(p.captures("a1").is_some());
        assert!(p.captures("a1 trailing").is_none());
    }

    #[test]
    fn missing_group_rejected() {
        let err = ResponsePattern::new("bad", r"rznc,4,(\d+)", UpdateRoutine::ActiveZoneChanged).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCaptureGroup { group: "zone", .. }));
    }

    #[test]
    fn invalid_regex_rejected() {
        let err = ResponsePattern::new("bad", r"rznc,(", UpdateRoutine::ActiveZoneChanged).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { ref id, .. } if id == "bad"));
    }
}
