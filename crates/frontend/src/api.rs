use member_map_shared::models::{GeocodeCandidate, Profile, ProfileInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn origin() -> Result<String, String> {
    let window = web_sys::window().ok_or("No window")?;
    window
        .location()
        .origin()
        .map_err(|_| "Could not read page origin".to_string())
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(format!("{}/graphql", origin()?))
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

const PROFILE_FIELDS: &str = "id name program graduationYear currentTerm location latitude longitude owner { displayName avatarUrl email } createdAt updatedAt";

/// Everything the directory page needs in one round trip.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryData {
    pub profiles: Vec<Profile>,
    pub my_profile: Option<Profile>,
    pub member_count: u64,
}

pub async fn fetch_directory() -> Result<DirectoryData, String> {
    query(
        &format!(
            "query {{ profiles {{ {PROFILE_FIELDS} }} myProfile {{ {PROFILE_FIELDS} }} memberCount }}"
        ),
        None,
    )
    .await
}

#[derive(Deserialize)]
pub struct GeocodeResponse {
    pub geocode: Vec<GeocodeCandidate>,
}

pub async fn geocode(text: &str) -> Result<Vec<GeocodeCandidate>, String> {
    let variables = serde_json::json!({ "query": text });
    let resp: GeocodeResponse = query(
        r#"query Geocode($query: String!) {
            geocode(query: $query) { label latitude longitude }
        }"#,
        Some(variables),
    )
    .await?;
    Ok(resp.geocode)
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    profile: Option<Profile>,
    error: Option<String>,
}

/// Interpret a `/api/profile` response.
pub fn parse_submit_response(status: u16, body: &str) -> Result<Profile, String> {
    let parsed: SubmitBody = serde_json::from_str(body)
        .map_err(|_| format!("Failed to save profile (HTTP {status}). Please try again."))?;
    match (status, parsed.profile, parsed.error) {
        (200, Some(profile), _) => Ok(profile),
        (401, _, _) => Err("Your session has expired. Please sign in again.".to_string()),
        (_, _, Some(error)) => Err(error),
        _ => Err(format!("Failed to save profile (HTTP {status}). Please try again.")),
    }
}

pub async fn submit_profile(input: &ProfileInput) -> Result<Profile, String> {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/profile", origin()?))
        .json(input)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status().as_u16();
    let body = resp.text().await.map_err(|e| e.to_string())?;
    parse_submit_response(status, &body)
}
