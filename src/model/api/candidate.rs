use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::credentials::MAX_NAME_LENGTH,
    db::candidate::{Candidate, CandidateCore, CandidateId},
};

/// A candidate as configured for seeding, e.g. a `[[default.candidates]]` table in
/// `Rocket.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub position: String,
    pub bio: String,
    pub image_url: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub manifesto: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CandidateSpec {
    /// Convert into a database candidate at the given list position.
    pub fn into_candidate(self, order: u32) -> Candidate {
        Candidate {
            id: self.id,
            candidate: CandidateCore {
                name: self.name,
                party: self.party,
                position: self.position,
                bio: self.bio,
                image_url: self.image_url,
                age: self.age,
                education: self.education,
                experience: self.experience,
                manifesto: self.manifesto,
                color: self.color,
                order,
            },
        }
    }
}

/// A partial edit of a candidate's descriptive fields.
///
/// Unknown fields (including `id` and `votes`) are rejected outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CandidateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifesto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CandidateUpdate {
    /// Check the edit is acceptable, returning a user-facing reason if not.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("name", &self.name),
            ("party", &self.party),
            ("bio", &self.bio),
            ("image URL", &self.image_url),
        ];
        for (field, value) in required {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("Candidate {field} cannot be empty"));
            }
        }
        if matches!(&self.name, Some(name) if name.chars().count() > MAX_NAME_LENGTH) {
            return Err(format!(
                "Name cannot be more than {MAX_NAME_LENGTH} characters"
            ));
        }
        Ok(())
    }

    /// The `$set` document for this edit, using database field names.
    /// Empty iff the edit changes nothing.
    pub fn to_set_document(&self) -> Result<Document, bson::ser::Error> {
        let set = Set {
            name: self.name.as_deref(),
            party: self.party.as_deref(),
            bio: self.bio.as_deref(),
            image_url: self.image_url.as_deref(),
            age: self.age,
            education: self.education.as_deref(),
            experience: self.experience.as_deref(),
            manifesto: self.manifesto.as_deref(),
            color: self.color.as_deref(),
        };
        bson::to_document(&set)
    }
}

/// Database-side view of [`CandidateUpdate`], with snake_case field names.
#[derive(Serialize)]
struct Set<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    party: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    education: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    experience: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifesto: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
}

/// API-friendly representation of a candidate with its derived vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDesc {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub position: String,
    pub bio: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifesto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub votes: u64,
}

impl CandidateDesc {
    pub fn new(candidate: Candidate, votes: u64) -> Self {
        let Candidate { id, candidate } = candidate;
        Self {
            id,
            name: candidate.name,
            party: candidate.party,
            position: candidate.position,
            bio: candidate.bio,
            image_url: candidate.image_url,
            age: candidate.age,
            education: candidate.education,
            experience: candidate.experience,
            manifesto: candidate.manifesto,
            color: candidate.color,
            votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn update_set_document_uses_db_names() {
        let update = CandidateUpdate {
            image_url: Some("/new.png".to_string()),
            age: Some(50),
            ..Default::default()
        };
        let set = update.to_set_document().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("image_url").unwrap(), "/new.png");
        assert!(set.contains_key("age"));
        assert!(!set.contains_key("imageUrl"));
        assert!(CandidateUpdate::default()
            .to_set_document()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn update_rejects_votes_and_ids() {
        assert!(serde_json::from_str::<CandidateUpdate>(r#"{"votes": 100}"#).is_err());
        assert!(serde_json::from_str::<CandidateUpdate>(r#"{"id": "9"}"#).is_err());
        let update: CandidateUpdate =
            serde_json::from_str(r##"{"imageUrl": "/x.png", "color": "#000"}"##).unwrap();
        assert_eq!(update.image_url.as_deref(), Some("/x.png"));
        assert_eq!(update.color.as_deref(), Some("#000"));
    }

    #[test]
    fn update_validation() {
        assert!(CandidateUpdate::default().validate().is_ok());
        let blank = CandidateUpdate {
            party: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
        let long = CandidateUpdate {
            name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..Default::default()
        };
        assert!(long.validate().is_err());
    }
}
