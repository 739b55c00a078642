//! Character types available to sessions

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::pipeline::Character;
use super::profile::{CharacterProfile, ProfileError};
use super::stage::Stage;
use super::states::{build_state_graph, CharacterStateGraph};

/// A validated profile plus the state graph shared by all its instances
#[derive(Debug)]
pub struct CharacterType {
    profile: CharacterProfile,
    graph: Arc<CharacterStateGraph>,
}

impl CharacterType {
    pub fn new(profile: CharacterProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        let graph = build_state_graph(&profile).map_err(|source| ProfileError::Graph {
            character: profile.name.clone(),
            source,
        })?;
        Ok(Self {
            profile,
            graph: Arc::new(graph),
        })
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &CharacterProfile {
        &self.profile
    }

    pub fn graph(&self) -> &Arc<CharacterStateGraph> {
        &self.graph
    }
}

/// Named character types, built once at startup
#[derive(Debug, Clone)]
pub struct Roster {
    types: BTreeMap<String, Arc<CharacterType>>,
}

impl Roster {
    /// Roster compiled into the binary
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::from_profiles(vec![CharacterProfile::vanguard(), CharacterProfile::zephyr()])
    }

    pub fn from_profiles(profiles: Vec<CharacterProfile>) -> Result<Self, ProfileError> {
        if profiles.is_empty() {
            return Err(ProfileError::EmptyRoster);
        }
        let mut types = BTreeMap::new();
        for profile in profiles {
            let name = profile.name.clone();
            if types.contains_key(&name) {
                return Err(ProfileError::DuplicateCharacter(name));
            }
            types.insert(name, Arc::new(CharacterType::new(profile)?));
        }
        Ok(Self { types })
    }

    /// Parse a JSON array of profiles
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let profiles: Vec<CharacterProfile> = serde_json::from_str(json)?;
        Self::from_profiles(profiles)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_json(&json)?;
        info!(path = %path.display(), characters = roster.len(), "Loaded character profiles");
        Ok(roster)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CharacterType>> {
        self.types.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// New simulation instance of `name` on `stage`
    pub fn spawn(&self, name: &str, stage: Arc<Stage>) -> Option<Character> {
        self.get(name).map(|kind| Character::new(kind, stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_has_both_characters() {
        let roster = Roster::builtin().unwrap();
        let names: Vec<_> = roster.names().collect();
        assert_eq!(names, ["vanguard", "zephyr"]);
        assert!(roster.get("zephyr").is_some());
        assert!(roster.get("nobody").is_none());
    }

    #[test]
    fn json_roster_round_trips_profiles() {
        let json = serde_json::to_string(&vec![CharacterProfile::zephyr()]).unwrap();
        let roster = Roster::from_json(&json).unwrap();
        let zephyr = roster.get("zephyr").unwrap();
        assert_eq!(zephyr.profile().max_jump_count(), 3);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Roster::from_profiles(vec![
            CharacterProfile::vanguard(),
            CharacterProfile::vanguard(),
        ])
        .unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateCharacter(name) if name == "vanguard"));
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert!(matches!(
            Roster::from_json("[]"),
            Err(ProfileError::EmptyRoster)
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Roster::from_json("{not json"),
            Err(ProfileError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Roster::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ProfileError::Io { .. }));
    }
}
