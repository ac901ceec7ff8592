//! # Rule Editing
//!
//! State held while a person edits a rule, and the checks that turn that
//! state into a [`Rule`]. Validation failures come back as
//! [`ValidationError`] values to show to the user; nothing here reaches the
//! compiler until it is valid.

use access_core::{RuleId, Timestamp};

use crate::book::RuleBook;
use crate::error::ValidationError;
use crate::rule::{ExecuteCountRule, LocationRule, LocationUnit, MultipleRule, Rule, RuleKind, SatisfyType, TimeRule};

/// Hours the opposite bound moves when an edit would invert the window.
const WINDOW_SHIFT_HOURS: i64 = 1;

/// A time window that is never inverted.
///
/// Moving one bound past the other drags the other bound along, one hour
/// beyond the new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: Timestamp,
    until: Timestamp,
}

impl TimeWindow {
    /// One hour starting at `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        let until = start.checked_add_hours(WINDOW_SHIFT_HOURS).unwrap_or(start);
        Self { from: start, until }
    }

    /// One hour starting now.
    pub fn starting_now() -> Self {
        Self::starting_at(Timestamp::now())
    }

    /// Window start.
    pub fn from(&self) -> Timestamp {
        self.from
    }

    /// Window end.
    pub fn until(&self) -> Timestamp {
        self.until
    }

    /// Move the start. If it passes the end, the end moves to one hour after it.
    pub fn set_from(&mut self, from: Timestamp) {
        if from > self.until {
            self.until = from.checked_add_hours(WINDOW_SHIFT_HOURS).unwrap_or(from);
        }
        self.from = from;
    }

    /// Move the end. If it precedes the start, the start moves to one hour before it.
    pub fn set_until(&mut self, until: Timestamp) {
        if self.from > until {
            self.from = until.checked_add_hours(-WINDOW_SHIFT_HOURS).unwrap_or(until);
        }
        self.until = until;
    }

    /// The compiled-rule form of this window.
    pub fn to_rule(&self) -> TimeRule {
        TimeRule {
            from: self.from,
            until: self.until,
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::starting_now()
    }
}

/// Raw text typed into the geofence fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDraft {
    /// Latitude text.
    pub latitude: String,
    /// Longitude text.
    pub longitude: String,
    /// Radius text.
    pub radius: String,
    /// Unit chosen for the radius.
    pub unit: LocationUnit,
}

impl LocationDraft {
    /// Pre-fill from an existing rule.
    pub fn from_rule(rule: &LocationRule) -> Self {
        Self {
            latitude: format!("{:?}", rule.latitude),
            longitude: format!("{:?}", rule.longitude),
            radius: format!("{:?}", rule.radius),
            unit: rule.unit,
        }
    }

    /// Check the fields in display order and build the rule.
    ///
    /// # Errors
    ///
    /// The first blank or non-numeric field.
    pub fn validate(&self) -> Result<LocationRule, ValidationError> {
        let latitude = parse_number(&self.latitude, "Latitude", ValidationError::EmptyLatitude)?;
        let longitude = parse_number(&self.longitude, "Longitude", ValidationError::EmptyLongitude)?;
        let radius = parse_number(&self.radius, "Radius", ValidationError::EmptyRadius)?;
        Ok(LocationRule {
            latitude,
            longitude,
            radius,
            unit: self.unit,
        })
    }
}

fn parse_number(input: &str, field: &'static str, when_empty: ValidationError) -> Result<f32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(when_empty);
    }
    match trimmed.parse::<f32>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::NotANumber {
            field,
            input: input.to_string(),
        }),
    }
}

/// Which single constraint a draft edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limitation {
    /// Time window.
    #[default]
    Time,
    /// Geofence.
    Location,
    /// Execution cap.
    ExecuteCount,
}

/// Whether a draft is a single constraint or a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftKind {
    /// One constraint.
    #[default]
    Single,
    /// A group of existing rules.
    Multiple,
}

/// Everything the rule editor holds for one rule.
#[derive(Debug, Clone, Default)]
pub struct RuleDraft {
    /// Single constraint or group. `None` until chosen.
    pub kind: Option<DraftKind>,
    /// Constraint edited when `kind` is `Single`.
    pub limitation: Limitation,
    /// Time fields.
    pub time: TimeWindow,
    /// Geofence fields.
    pub location: LocationDraft,
    /// Execution cap.
    pub max_executions: u32,
    /// Group mode.
    pub satisfy: SatisfyType,
    member_ids: Vec<RuleId>,
}

impl RuleDraft {
    /// A blank single-constraint draft.
    pub fn new() -> Self {
        Self {
            kind: Some(DraftKind::Single),
            ..Self::default()
        }
    }

    /// Load an existing rule for editing.
    pub fn from_rule(rule: &Rule) -> Self {
        let mut draft = Self::new();
        match rule.kind() {
            RuleKind::Time(time) => {
                draft.limitation = Limitation::Time;
                draft.time = TimeWindow::starting_at(time.from);
                draft.time.set_until(time.until);
            }
            RuleKind::Location(location) => {
                draft.limitation = Limitation::Location;
                draft.location = LocationDraft::from_rule(location);
            }
            RuleKind::Multiple(group) => {
                draft.kind = Some(DraftKind::Multiple);
                draft.satisfy = group.satisfy();
                draft.member_ids = group.members().iter().map(Rule::id).collect();
            }
            RuleKind::ExecuteCount(cap) => {
                draft.limitation = Limitation::ExecuteCount;
                draft.max_executions = cap.max;
            }
        }
        draft
    }

    /// Group member ids in order.
    pub fn member_ids(&self) -> &[RuleId] {
        &self.member_ids
    }

    /// Add a group member. Duplicates are ignored.
    pub fn add_member(&mut self, id: RuleId) {
        if !self.member_ids.contains(&id) {
            self.member_ids.push(id);
        }
    }

    /// Remove a group member. Returns whether it was present.
    pub fn remove_member(&mut self, id: RuleId) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|m| *m != id);
        self.member_ids.len() != before
    }

    /// Build the rule under `id`, resolving group members from `book`.
    ///
    /// # Errors
    ///
    /// `NoRuleKind` when no kind was chosen, geofence field errors,
    /// `EmptyRuleGroup` for a group without members and `UnknownRule` for a
    /// member id missing from `book`.
    pub fn build(&self, id: RuleId, book: &RuleBook) -> Result<Rule, ValidationError> {
        let kind: RuleKind = match self.kind.ok_or(ValidationError::NoRuleKind)? {
            DraftKind::Single => match self.limitation {
                Limitation::Time => self.time.to_rule().into(),
                Limitation::Location => self.location.validate()?.into(),
                Limitation::ExecuteCount => ExecuteCountRule {
                    max: self.max_executions,
                }
                .into(),
            },
            DraftKind::Multiple => {
                let members = self
                    .member_ids
                    .iter()
                    .map(|member| {
                        book.get(*member)
                            .cloned()
                            .ok_or_else(|| ValidationError::UnknownRule(member.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                MultipleRule::new(members, self.satisfy)?.into()
            }
        };
        Ok(Rule::with_id(id, kind))
    }
}
