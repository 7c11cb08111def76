//! Team members shown on the clinic pages, and the admin form that adds them.

use reqwest::multipart::Form;
use reqwest::Method;
use serde::Deserialize;

use crate::client::api::ApiClient;
use crate::client::error::ApiError;
use crate::client::types::{string_or_number, MessageResponse};
use crate::client::upload::ImageUpload;
use crate::shared::error::SharedError;

/// A clinic location a team member works at
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LocationList {
    #[serde(default)]
    data: Vec<Location>,
}

/// Raw "add team member" fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMemberForm {
    pub name: String,
    pub position: String,
    pub location_id: String,
    pub specialty: String,
    pub picture: Option<ImageUpload>,
}

impl TeamMemberForm {
    pub fn validate(self) -> Result<NewTeamMember, SharedError> {
        let filled = |value: &str, field: &str, message: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(SharedError::validation(field, message))
            } else {
                Ok(value.to_string())
            }
        };

        let name = filled(&self.name, "name", "Name is required")?;
        let position = filled(&self.position, "position", "Position is required")?;
        let location_id = filled(&self.location_id, "locationId", "Location is required")?;
        let specialty = filled(&self.specialty, "specialty", "Specialty is required")?;
        let picture = self
            .picture
            .ok_or_else(|| SharedError::validation("file", "Picture is required"))?;

        Ok(NewTeamMember {
            name,
            position,
            location_id,
            specialty,
            picture,
        })
    }
}

/// A validated team member, ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeamMember {
    pub name: String,
    pub position: String,
    pub location_id: String,
    pub specialty: String,
    pub picture: ImageUpload,
}

impl NewTeamMember {
    /// Multipart body for `POST /team-member/create`
    pub fn form(&self) -> Result<Form, ApiError> {
        Ok(Form::new()
            .text("name", self.name.clone())
            .text("position", self.position.clone())
            .part("file", self.picture.part()?)
            .text("locationId", self.location_id.clone())
            .text("specialty", self.specialty.clone()))
    }
}

impl ApiClient {
    /// `GET /location/all`
    pub async fn fetch_locations(&self, token: Option<&str>) -> Result<Vec<Location>, ApiError> {
        let path = "/location/all";
        let request = self.with_token(self.request(Method::GET, path), token);
        let list: LocationList = self.execute(path, request).await?;
        Ok(list.data)
    }

    /// `POST /team-member/create` as multipart
    pub async fn create_team_member(
        &self,
        member: &NewTeamMember,
        token: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        let path = "/team-member/create";
        let request = self.request(Method::POST, path).multipart(member.form()?);
        let response = self.execute(path, self.with_token(request, token)).await?;
        tracing::info!("[TEAM] Added {} ({})", member.name, member.position);
        Ok(response)
    }
}
