//! Parser for the textual region catalogue.
//!
//! ```text
//! # comment
//! _DistanceWeightingFunction = "activation"
//! _Planes = [PlaneA, PlaneB]
//! _Curves = [SuperiorFrontalSulcus, InferiorFrontalSulcus]
//! _ClosedCurves = [Insula]
//! F2 = PlaneA & SuperiorFrontalSulcus:inferior & InferiorFrontalSulcus:superior
//! ```
//!
//! A declaration list may span several lines until its closing `]`. A term
//! without a `:qualifier` has an implicit side.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::divider::{DividerKind, Landmark};
use crate::error::{CatalogueError, DefinitionError, DefinitionErrors};
use crate::math::Point3;
use crate::rule::{DividerRef, RegionRule, RuleSet, SideRequirement};

/// One declared landmark name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DividerKind,
    /// Distance weighting function in effect when the curve was declared.
    pub weighting: Option<String>,
    pub line: usize,
}

/// A parsed catalogue: landmark declarations plus region rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    declarations: Vec<Declaration>,
    rules: RuleSet,
}

impl Catalogue {
    /// Parses catalogue text.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error with its 1-based line number.
    pub fn parse(text: &str) -> Result<Self, CatalogueError> {
        let mut catalogue = Self::default();
        let mut weighting: Option<String> = None;
        let mut pending: Option<(usize, String)> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = strip_comment(raw).trim();

            let (start, statement) = match pending.take() {
                Some((start, mut acc)) => {
                    acc.push(' ');
                    acc.push_str(line);
                    (start, acc)
                }
                None if line.is_empty() => continue,
                None => (line_no, line.to_owned()),
            };
            if statement.contains('[') && !statement.contains(']') {
                pending = Some((start, statement));
                continue;
            }

            catalogue.statement(start, &statement, &mut weighting)?;
        }

        if let Some((start, _)) = pending {
            return Err(syntax(start, "unterminated `[` list"));
        }
        Ok(catalogue)
    }

    fn statement(
        &mut self,
        line: usize,
        statement: &str,
        weighting: &mut Option<String>,
    ) -> Result<(), CatalogueError> {
        let Some((lhs, rhs)) = statement.split_once('=') else {
            return Err(syntax(line, "expected `name = ...`"));
        };
        let target = lhs.trim();
        let value = rhs.trim();
        if !is_identifier(target) {
            return Err(syntax(line, format!("invalid name `{target}`")));
        }

        let kind = match target {
            "_DistanceWeightingFunction" => {
                *weighting = Some(parse_string(line, value)?);
                return Ok(());
            }
            "_Planes" => DividerKind::Plane,
            "_Curves" => DividerKind::OpenCurve,
            "_ClosedCurves" => DividerKind::ClosedCurve,
            _ => {
                self.rules.push(parse_rule(line, target, value)?);
                return Ok(());
            }
        };

        for name in parse_list(line, value)? {
            self.declarations.push(Declaration {
                name,
                kind,
                weighting: if kind == DividerKind::Plane { None } else { weighting.clone() },
                line,
            });
        }
        Ok(())
    }

    /// Declared landmark names in order, duplicates included.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Kind of the first declaration of a name.
    ///
    /// Later declarations of the same name are ignored by
    /// [`Catalogue::check_landmarks`].
    #[must_use]
    pub fn declared_kind(&self, name: &str) -> Option<DividerKind> {
        self.declarations.iter().find(|d| d.name == name).map(|d| d.kind)
    }

    /// Names declared more than once, in order of first repetition.
    #[must_use]
    pub fn duplicate_declarations(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.declarations
            .iter()
            .map(|d| d.name.as_str())
            .filter(|name| !seen.insert(*name) && reported.insert(*name))
            .collect()
    }

    /// Returns the parsed region rules.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the parsed region rules by value.
    #[must_use]
    pub fn into_rules(self) -> RuleSet {
        self.rules
    }

    /// Adds seed points to a region. Returns `false` if no rule has that
    /// name.
    pub fn attach_seeds(&mut self, region: &str, seeds: impl IntoIterator<Item = Point3>) -> bool {
        match self.rules.get_mut(region) {
            Some(rule) => {
                rule.seeds.extend(seeds);
                true
            }
            None => false,
        }
    }

    /// Checks supplied landmarks against the declarations.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError::KindMismatch`] for every landmark whose
    /// geometry disagrees with its declared kind and a
    /// [`DefinitionError::MissingLandmark`] for every declared name with no
    /// landmark.
    pub fn check_landmarks(&self, landmarks: &[Landmark]) -> Result<(), DefinitionErrors> {
        let supplied: HashMap<&str, DividerKind> = landmarks
            .iter()
            .map(|l| (l.name.as_str(), l.kind()))
            .collect();
        let mut checked = HashSet::new();
        let mut errors = Vec::new();

        for decl in &self.declarations {
            if !checked.insert(decl.name.as_str()) {
                continue;
            }
            match supplied.get(decl.name.as_str()) {
                None => errors.push(DefinitionError::MissingLandmark {
                    name: decl.name.clone(),
                }),
                Some(&actual) if actual != decl.kind => errors.push(DefinitionError::KindMismatch {
                    name: decl.name.clone(),
                    declared: decl.kind,
                    actual,
                }),
                Some(_) => {}
            }
        }
        DefinitionErrors::into_result(errors)
    }
}

impl FromStr for Catalogue {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn syntax(line: usize, message: impl Into<String>) -> CatalogueError {
    CatalogueError::Syntax {
        line,
        message: message.into(),
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_string(line: usize, value: &str) -> Result<String, CatalogueError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .map(str::to_owned)
        .ok_or_else(|| syntax(line, "expected a quoted string"))
}

fn parse_list(line: usize, value: &str) -> Result<Vec<String>, CatalogueError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| syntax(line, "expected a `[...]` list"))?;
    let mut names = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let name = parse_string(line, item).unwrap_or_else(|_| item.to_owned());
        if !is_identifier(&name) {
            return Err(syntax(line, format!("invalid landmark name `{name}`")));
        }
        names.push(name);
    }
    Ok(names)
}

fn parse_rule(line: usize, name: &str, value: &str) -> Result<RegionRule, CatalogueError> {
    let mut rule = RegionRule::new(name);
    for term in value.split('&') {
        let term = term.trim();
        let (divider, side) = match term.split_once(':') {
            Some((divider, qualifier)) => {
                let qualifier = qualifier.trim();
                let side = SideRequirement::from_str(qualifier).map_err(|_| {
                    CatalogueError::UnknownQualifier {
                        line,
                        qualifier: qualifier.to_owned(),
                    }
                })?;
                (divider.trim(), side)
            }
            None => (term, SideRequirement::Implicit),
        };
        if !is_identifier(divider) {
            return Err(syntax(line, format!("invalid divider reference `{term}` in `{name}`")));
        }
        rule.terms.push(DividerRef::new(divider, side));
    }
    Ok(rule)
}
