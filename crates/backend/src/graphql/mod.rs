use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, InputObject, Object, SimpleObject, ID};
use member_map_shared::{
    layout,
    models::{self, ProfileInput},
    search,
};

use crate::geocoder::Geocoder;
use crate::profiles::{self, SubmitError};
use crate::session::Viewer;
use crate::storage::{Storage, StorageError};

// GraphQL output types

#[derive(SimpleObject, Clone)]
pub struct GqlOwner {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Only visible to signed-in viewers.
    pub email: Option<String>,
}

#[derive(SimpleObject, Clone)]
pub struct GqlProfile {
    pub id: ID,
    pub name: String,
    pub program: String,
    pub graduation_year: Option<String>,
    pub current_term: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub owner: GqlOwner,
    pub created_at: String,
    pub updated_at: String,
}

impl GqlProfile {
    fn new(p: models::Profile, show_email: bool) -> Self {
        GqlProfile {
            id: ID(p.id),
            name: p.name,
            program: p.program,
            graduation_year: p.graduation_year,
            current_term: p.current_term,
            location: p.location,
            latitude: p.latitude,
            longitude: p.longitude,
            owner: GqlOwner {
                display_name: p.owner.display_name,
                avatar_url: p.owner.avatar_url,
                email: p.owner.email.filter(|_| show_email),
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlMarker {
    pub profile: GqlProfile,
    pub offset_latitude: f64,
    pub offset_longitude: f64,
}

#[derive(SimpleObject)]
pub struct GqlSearchResult {
    pub too_short: bool,
    pub summary: Option<String>,
    pub results: Vec<GqlProfile>,
}

#[derive(SimpleObject)]
pub struct GqlGeocodeCandidate {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

// Input types

#[derive(InputObject)]
#[graphql(name = "ProfileInput")]
pub struct ProfileInputGql {
    pub name: String,
    pub program: String,
    pub graduation_year: Option<String>,
    pub current_term: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<ProfileInputGql> for ProfileInput {
    fn from(i: ProfileInputGql) -> Self {
        ProfileInput {
            name: i.name,
            program: i.program,
            graduation_year: i.graduation_year,
            current_term: i.current_term,
            location: i.location,
            latitude: i.latitude,
            longitude: i.longitude,
        }
    }
}

fn internal(e: StorageError) -> async_graphql::Error {
    tracing::error!(error = %e, "Storage failure");
    async_graphql::Error::new("Internal server error").extend_with(|_, ext| ext.set("code", "INTERNAL"))
}

fn viewer<'a>(ctx: &'a Context<'_>) -> Option<&'a crate::session::Session> {
    ctx.data_opt::<Viewer>().and_then(|v| v.0.as_ref())
}

fn all_profiles(ctx: &Context<'_>) -> async_graphql::Result<Vec<models::Profile>> {
    let storage = ctx.data::<Arc<Storage>>()?;
    storage.list_profiles().map_err(internal)
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn profiles(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlProfile>> {
        let show_email = viewer(ctx).is_some();
        Ok(all_profiles(ctx)?
            .into_iter()
            .map(|p| GqlProfile::new(p, show_email))
            .collect())
    }

    async fn my_profile(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<GqlProfile>> {
        let Some(session) = viewer(ctx) else {
            return Ok(None);
        };
        let storage = ctx.data::<Arc<Storage>>()?;
        let profile = storage
            .get_profile(&session.account_id)
            .map_err(internal)?;
        Ok(profile.map(|p| GqlProfile::new(p, true)))
    }

    async fn member_count(&self, ctx: &Context<'_>) -> async_graphql::Result<u64> {
        let storage = ctx.data::<Arc<Storage>>()?;
        storage.count_profiles().map_err(internal)
    }

    async fn search(&self, ctx: &Context<'_>, query: String) -> async_graphql::Result<GqlSearchResult> {
        let show_email = viewer(ctx).is_some();
        let profiles = all_profiles(ctx)?;
        let outcome = search::search_outcome(&profiles, &query);
        let too_short = outcome.is_too_short();
        let results: Vec<GqlProfile> = outcome
            .into_results()
            .into_iter()
            .map(|p| GqlProfile::new(p.clone(), show_email))
            .collect();

        Ok(GqlSearchResult {
            too_short,
            summary: (!too_short).then(|| search::results_summary(results.len())),
            results,
        })
    }

    async fn markers(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlMarker>> {
        let show_email = viewer(ctx).is_some();
        let profiles = all_profiles(ctx)?;
        Ok(layout::layout(&profiles)
            .into_iter()
            .map(|m| GqlMarker {
                profile: GqlProfile::new(m.profile, show_email),
                offset_latitude: m.offset_latitude,
                offset_longitude: m.offset_longitude,
            })
            .collect())
    }

    async fn geocode(
        &self,
        ctx: &Context<'_>,
        query: String,
    ) -> async_graphql::Result<Vec<GqlGeocodeCandidate>> {
        let geocoder = ctx.data::<Geocoder>()?;
        let candidates = geocoder.search(&query).await.map_err(|e| {
            tracing::warn!(error = %e, "Geocode failed");
            async_graphql::Error::new("Location lookup failed, please try again")
                .extend_with(|_, ext| ext.set("code", "GEOCODER_UNAVAILABLE"))
        })?;
        Ok(candidates
            .into_iter()
            .map(|c| GqlGeocodeCandidate {
                label: c.label,
                latitude: c.latitude,
                longitude: c.longitude,
            })
            .collect())
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn upsert_profile(
        &self,
        ctx: &Context<'_>,
        input: ProfileInputGql,
    ) -> async_graphql::Result<GqlProfile> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let input = ProfileInput::from(input);

        match profiles::submit_profile(storage, viewer(ctx), &input) {
            Ok(profile) => Ok(GqlProfile::new(profile, true)),
            Err(SubmitError::Unauthorized) => Err(async_graphql::Error::new("Unauthorized")
                .extend_with(|_, ext| ext.set("code", "UNAUTHENTICATED"))),
            Err(SubmitError::Input(e)) => Err(async_graphql::Error::new(e.to_string())
                .extend_with(|_, ext| ext.set("code", "BAD_USER_INPUT"))),
            Err(SubmitError::Storage(e)) => Err(internal(e)),
        }
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(storage: Arc<Storage>, geocoder: Geocoder) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(storage)
        .data(geocoder)
        .finish()
}
