// Candidate pool construction: validation and normalization of the raw
// per-player records supplied by the projection pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("player record {index} has an empty id")]
    EmptyId { index: usize },

    #[error("player record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("duplicate player id `{id}`")]
    DuplicateId { id: String },

    #[error("player `{id}` has unrecognized position label `{label}`")]
    UnknownPosition { id: String, label: String },

    #[error("player `{id}` has an empty club label")]
    EmptyClub { id: String },

    #[error("player `{id}` has negative cost {cost}")]
    NegativeCost { id: String, cost: f64 },

    #[error("player `{id}` has a non-finite value for `{field}`")]
    NonFinite { id: String, field: &'static str },

    #[error("failed to read players file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Football positions used for starting-lineup quota accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in lineup display order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position label into a Position enum.
    ///
    /// Accepts the common fantasy-data abbreviations case-insensitively:
    /// - "GK"/"GKP"/"GOALKEEPER" -> Goalkeeper
    /// - "DEF"/"D"/"DEFENDER" -> Defender
    /// - "MID"/"M"/"MIDFIELDER" -> Midfielder
    /// - "FWD"/"FW"/"F"/"FORWARD" -> Forward
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DEF" | "D" | "DEFENDER" => Some(Position::Defender),
            "MID" | "M" | "MIDFIELDER" => Some(Position::Midfielder),
            "FWD" | "FW" | "F" | "FORWARD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Deterministic ordering index for lineup display (GK first).
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Player records
// ---------------------------------------------------------------------------

/// A validated candidate player, immutable for the duration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub position: Position,
    /// Club label, normalized to trimmed lowercase. The per-club cap is
    /// driven by the clubs actually present in the pool.
    pub club: String,
    /// Cost in budget units (e.g. millions).
    pub cost: f64,
    /// Expected points from the projection model. May be zero or negative.
    pub projected_points: f64,
}

/// Permissive per-player input record as it arrives from upstream data
/// (e.g. a CSV export of the projection pipeline). Every field is optional
/// at this stage so that missing-field errors are reported per record
/// during pool construction instead of failing deserialization wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlayer {
    pub id: Option<String>,
    pub position: Option<String>,
    pub club: Option<String>,
    pub cost: Option<f64>,
    pub projected_points: Option<f64>,
}

// ---------------------------------------------------------------------------
// Candidate pool
// ---------------------------------------------------------------------------

/// An ordered collection of validated players with unique ids.
///
/// Input order is preserved: the formulator's variable-to-player mapping and
/// the fallback's tie-breaking both rely on it for reproducible runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePool {
    players: Vec<Player>,
}

impl CandidatePool {
    /// Validate and normalize raw records into a candidate pool.
    ///
    /// Rejects records with a missing or empty id, duplicate ids, unknown
    /// position labels, empty club labels, negative or non-finite cost, or
    /// non-finite projected points. Club labels are normalized to trimmed
    /// lowercase so per-club caps match regardless of source casing.
    pub fn build(raw: Vec<RawPlayer>) -> Result<Self, ValidationError> {
        let mut players = Vec::with_capacity(raw.len());
        let mut seen_ids: HashSet<String> = HashSet::with_capacity(raw.len());

        for (index, record) in raw.into_iter().enumerate() {
            let id = match record.id {
                Some(id) => id.trim().to_string(),
                None => return Err(ValidationError::MissingField { index, field: "id" }),
            };
            if id.is_empty() {
                return Err(ValidationError::EmptyId { index });
            }
            if !seen_ids.insert(id.clone()) {
                return Err(ValidationError::DuplicateId { id });
            }

            let label = record
                .position
                .ok_or(ValidationError::MissingField { index, field: "position" })?;
            let position = Position::from_str_pos(&label).ok_or_else(|| {
                ValidationError::UnknownPosition {
                    id: id.clone(),
                    label: label.clone(),
                }
            })?;

            let club = record
                .club
                .ok_or(ValidationError::MissingField { index, field: "club" })?
                .trim()
                .to_lowercase();
            if club.is_empty() {
                return Err(ValidationError::EmptyClub { id });
            }

            let cost = record
                .cost
                .ok_or(ValidationError::MissingField { index, field: "cost" })?;
            if !cost.is_finite() {
                return Err(ValidationError::NonFinite { id, field: "cost" });
            }
            if cost < 0.0 {
                return Err(ValidationError::NegativeCost { id, cost });
            }

            let projected_points = record.projected_points.ok_or(ValidationError::MissingField {
                index,
                field: "projected_points",
            })?;
            if !projected_points.is_finite() {
                return Err(ValidationError::NonFinite {
                    id,
                    field: "projected_points",
                });
            }

            players.push(Player {
                id,
                position,
                club,
                cost,
                projected_points,
            });
        }

        Ok(CandidatePool { players })
    }

    /// The validated players, in input order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of pool players at the given position.
    pub fn count_at(&self, position: Position) -> usize {
        self.players.iter().filter(|p| p.position == position).count()
    }

    /// Unique club labels in first-seen order.
    ///
    /// The per-club cap constraint is generated from this list, so caps
    /// always bind for every club actually present in the pool.
    pub fn clubs(&self) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut clubs = Vec::new();
        for player in &self.players {
            if seen.insert(player.club.as_str()) {
                clubs.push(player.club.as_str());
            }
        }
        clubs
    }
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Load a candidate pool from a CSV file with columns
/// `id,position,club,cost,projected_points`. Extra columns are ignored.
pub fn load_players_csv(path: &Path) -> Result<CandidatePool, ValidationError> {
    let text = std::fs::read_to_string(path).map_err(|e| ValidationError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut raw = Vec::new();
    for record in reader.deserialize::<RawPlayer>() {
        let record = record.map_err(|e| ValidationError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        raw.push(record);
    }

    CandidatePool::build(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, position: &str, club: &str, cost: f64, points: f64) -> RawPlayer {
        RawPlayer {
            id: Some(id.to_string()),
            position: Some(position.to_string()),
            club: Some(club.to_string()),
            cost: Some(cost),
            projected_points: Some(points),
        }
    }

    #[test]
    fn from_str_pos_standard_labels() {
        assert_eq!(Position::from_str_pos("GK"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("DEF"), Some(Position::Defender));
        assert_eq!(Position::from_str_pos("MID"), Some(Position::Midfielder));
        assert_eq!(Position::from_str_pos("FWD"), Some(Position::Forward));
    }

    #[test]
    fn from_str_pos_aliases_and_case() {
        assert_eq!(Position::from_str_pos("gkp"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("Goalkeeper"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("d"), Some(Position::Defender));
        assert_eq!(Position::from_str_pos("fw"), Some(Position::Forward));
        assert_eq!(Position::from_str_pos(" mid "), Some(Position::Midfielder));
    }

    #[test]
    fn from_str_pos_invalid() {
        assert_eq!(Position::from_str_pos("XX"), None);
        assert_eq!(Position::from_str_pos(""), None);
        assert_eq!(Position::from_str_pos("STRIKER"), None);
    }

    #[test]
    fn display_str_roundtrip() {
        for pos in Position::ALL {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
    }

    #[test]
    fn sort_order_goalkeeper_first() {
        let mut order: Vec<u8> = Position::ALL.iter().map(|p| p.sort_order()).collect();
        let sorted = order.clone();
        order.sort();
        assert_eq!(order, sorted);
        assert_eq!(Position::Goalkeeper.sort_order(), 0);
    }

    #[test]
    fn build_valid_pool() {
        let pool = CandidatePool::build(vec![
            raw("p1", "GK", "Arsenal", 4.5, 3.2),
            raw("p2", "DEF", "chelsea", 5.0, 4.1),
        ])
        .unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.players()[0].id, "p1");
        assert_eq!(pool.players()[0].position, Position::Goalkeeper);
        // Club labels are normalized to lowercase.
        assert_eq!(pool.players()[0].club, "arsenal");
        assert_eq!(pool.players()[1].club, "chelsea");
    }

    #[test]
    fn build_preserves_input_order() {
        let pool = CandidatePool::build(vec![
            raw("z", "MID", "a", 5.0, 1.0),
            raw("a", "MID", "b", 5.0, 2.0),
            raw("m", "MID", "c", 5.0, 3.0),
        ])
        .unwrap();
        let ids: Vec<&str> = pool.players().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn build_rejects_missing_fields() {
        let mut record = raw("p1", "GK", "arsenal", 4.5, 3.2);
        record.cost = None;
        let err = CandidatePool::build(vec![record]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingField { field: "cost", .. }
        ));

        let err = CandidatePool::build(vec![RawPlayer::default()]).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { field: "id", .. }));
    }

    #[test]
    fn build_rejects_duplicate_id() {
        let err = CandidatePool::build(vec![
            raw("p1", "GK", "arsenal", 4.5, 3.2),
            raw("p1", "DEF", "chelsea", 5.0, 4.1),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateId { id } if id == "p1"));
    }

    #[test]
    fn build_rejects_negative_cost() {
        let err = CandidatePool::build(vec![raw("p1", "GK", "arsenal", -1.0, 3.2)]).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeCost { .. }));
    }

    #[test]
    fn build_rejects_non_finite_values() {
        let err =
            CandidatePool::build(vec![raw("p1", "GK", "arsenal", f64::NAN, 3.2)]).unwrap_err();
        assert!(matches!(err, ValidationError::NonFinite { field: "cost", .. }));

        let err = CandidatePool::build(vec![raw("p1", "GK", "arsenal", 4.5, f64::INFINITY)])
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NonFinite {
                field: "projected_points",
                ..
            }
        ));
    }

    #[test]
    fn build_rejects_unknown_position() {
        let err = CandidatePool::build(vec![raw("p1", "QB", "arsenal", 4.5, 3.2)]).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownPosition { label, .. } if label == "QB"));
    }

    #[test]
    fn build_rejects_empty_club() {
        let err = CandidatePool::build(vec![raw("p1", "GK", "   ", 4.5, 3.2)]).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyClub { id } if id == "p1"));
    }

    #[test]
    fn build_allows_zero_cost_and_negative_points() {
        let pool = CandidatePool::build(vec![raw("p1", "GK", "arsenal", 0.0, -2.5)]).unwrap();
        assert_eq!(pool.players()[0].cost, 0.0);
        assert_eq!(pool.players()[0].projected_points, -2.5);
    }

    #[test]
    fn clubs_unique_first_seen_order() {
        let pool = CandidatePool::build(vec![
            raw("p1", "GK", "Arsenal", 4.5, 3.2),
            raw("p2", "DEF", "Chelsea", 5.0, 4.1),
            raw("p3", "MID", "ARSENAL", 7.0, 5.5),
        ])
        .unwrap();
        assert_eq!(pool.clubs(), vec!["arsenal", "chelsea"]);
    }

    #[test]
    fn count_at_position() {
        let pool = CandidatePool::build(vec![
            raw("p1", "GK", "a", 4.0, 1.0),
            raw("p2", "DEF", "b", 4.0, 1.0),
            raw("p3", "DEF", "c", 4.0, 1.0),
        ])
        .unwrap();
        assert_eq!(pool.count_at(Position::Goalkeeper), 1);
        assert_eq!(pool.count_at(Position::Defender), 2);
        assert_eq!(pool.count_at(Position::Forward), 0);
    }

    #[test]
    fn load_players_csv_parses_rows() {
        let dir = std::env::temp_dir().join("squadopt-pool-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("players.csv");
        std::fs::write(
            &path,
            "id,position,club,cost,projected_points\n\
             p1,GK,arsenal,4.5,3.2\n\
             p2,DEF,chelsea,5.0,4.1\n",
        )
        .unwrap();

        let pool = load_players_csv(&path).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.players()[1].position, Position::Defender);
    }

    #[test]
    fn load_players_csv_missing_file() {
        let err = load_players_csv(Path::new("/nonexistent/players.csv")).unwrap_err();
        assert!(matches!(err, ValidationError::Io { .. }));
    }
}
