use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}' (expected one of: {expected})")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Organizational tier of an evaluator.
///
/// Accepts either the kebab-case English name or the Chinese label used by
/// HR exports (e.g. `department-head` or `部门负责人`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[serde(alias = "部门负责人")]
    DepartmentHead,
    #[serde(alias = "部门经理")]
    DepartmentManager,
    #[serde(alias = "员工")]
    Peer,
    #[serde(alias = "分管领导")]
    Leader,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::DepartmentHead,
        Role::DepartmentManager,
        Role::Peer,
        Role::Leader,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Role::DepartmentHead => 0,
            Role::DepartmentManager => 1,
            Role::Peer => 2,
            Role::Leader => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::DepartmentHead => "department-head",
            Role::DepartmentManager => "department-manager",
            Role::Peer => "peer",
            Role::Leader => "leader",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::DepartmentHead => "部门负责人",
            Role::DepartmentManager => "部门经理",
            Role::Peer => "员工",
            Role::Leader => "分管领导",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| s.eq_ignore_ascii_case(role.as_str()) || s == role.label())
            .ok_or_else(|| ParseEnumError {
                kind: "role",
                value: s.to_string(),
                expected: "department-head, department-manager, peer, leader",
            })
    }
}

/// Department-level grade (甲/乙/丙/丁). Selects the tier quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum DepartmentRating {
    #[serde(alias = "甲")]
    A,
    #[serde(alias = "乙")]
    B,
    #[default]
    #[serde(alias = "丙")]
    C,
    #[serde(alias = "丁")]
    D,
}

impl DepartmentRating {
    pub const ALL: [DepartmentRating; 4] = [
        DepartmentRating::A,
        DepartmentRating::B,
        DepartmentRating::C,
        DepartmentRating::D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DepartmentRating::A => "甲",
            DepartmentRating::B => "乙",
            DepartmentRating::C => "丙",
            DepartmentRating::D => "丁",
        }
    }
}

impl fmt::Display for DepartmentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            DepartmentRating::A => "A",
            DepartmentRating::B => "B",
            DepartmentRating::C => "C",
            DepartmentRating::D => "D",
        };
        f.write_str(letter)
    }
}

impl FromStr for DepartmentRating {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DepartmentRating::ALL
            .into_iter()
            .find(|rating| s.eq_ignore_ascii_case(&rating.to_string()) || s == rating.label())
            .ok_or_else(|| ParseEnumError {
                kind: "department rating",
                value: s.to_string(),
                expected: "A, B, C, D, 甲, 乙, 丙, 丁",
            })
    }
}

/// Final performance grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        };
        f.write_str(letter)
    }
}

/// One value per evaluator role, indexed by [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoleBuckets([f64; 4]);

impl RoleBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, f64)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self[role]))
    }
}

impl Index<Role> for RoleBuckets {
    type Output = f64;

    fn index(&self, role: Role) -> &f64 {
        &self.0[role.index()]
    }
}

impl IndexMut<Role> for RoleBuckets {
    fn index_mut(&mut self, role: Role) -> &mut f64 {
        &mut self.0[role.index()]
    }
}

impl Serialize for RoleBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RoleBuckets", 4)?;
        state.serialize_field("department_head_score", &self[Role::DepartmentHead])?;
        state.serialize_field("department_manager_score", &self[Role::DepartmentManager])?;
        state.serialize_field("peer_score", &self[Role::Peer])?;
        state.serialize_field("leader_score", &self[Role::Leader])?;
        state.end()
    }
}
