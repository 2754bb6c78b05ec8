use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::clock::{Clock, SystemClock};
use super::error::{CandidateFailure, ClientError, ProbeError};
use super::mock::MockDataProvider;
use super::models::{
    ConfigStatus, EndpointReport, GuildStats, LeaderboardQuery, MatchQuery, MatchRecord,
    PlayerRecord, Provenance, QueueQuery, Sourced, TeamRecord,
};
use super::normalize;
use super::probe::{Candidate, EndpointProbe, Probed};
use super::resources::{self, ResourceDescriptor};
use super::transport::{ReqwestTransport, Transport};

pub const DEFAULT_API_URL: &str = "https://api.neatqueue.com";
pub const CLIENT_USER_AGENT: &str = "ApeSquad-NeatQueue-Client/1.0";

const DEFAULT_MATCH_LIMIT: usize = 20;

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub guild_id: Option<String>,
    pub timeout: Duration,
    /// Retries per request, applied by the transport
    pub retries: u32,
    pub retry_delay: Duration,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl ClientConfig {
    /// Validate `base_url` and build a config with default timeouts and limits.
    /// Blank credentials count as absent.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        guild_id: Option<String>,
    ) -> Result<Self, ClientError> {
        let url = Url::parse(base_url.trim()).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(url.scheme().to_string()));
        }

        Ok(ClientConfig {
            base_url: url,
            api_key: non_empty(api_key),
            guild_id: non_empty(guild_id),
            timeout: Duration::from_millis(10_000),
            retries: 3,
            retry_delay: Duration::from_millis(1_000),
            default_limit: 50,
            max_limit: 100,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.guild_id.is_some()
    }

    pub fn status(&self) -> ConfigStatus {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push("NEATQUEUE_API_KEY");
        }
        if self.guild_id.is_none() {
            missing.push("DISCORD_GUILD_ID");
        }
        ConfigStatus {
            is_configured: self.is_configured(),
            has_api_key: self.api_key.is_some(),
            has_guild_id: self.guild_id.is_some(),
            base_url: self.base_url.to_string(),
            missing,
        }
    }

    fn limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Values substituted into candidate templates.
#[derive(Debug, Default)]
struct Params<'a> {
    player: Option<&'a str>,
    limit: usize,
    offset: usize,
    season: Option<&'a str>,
}

/// Percent-encode one path segment. Spaces become `%20`, not the form `+`.
fn encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

/// Resilient NeatQueue client.
///
/// Every "get" operation tries its candidate endpoints in order, normalizes
/// the first plausible answer, and otherwise serves mock data. None of them
/// fail; the provenance tag says where the data came from.
#[derive(Clone)]
pub struct NeatQueueClient {
    config: Arc<ClientConfig>,
    probe: EndpointProbe,
    mock: MockDataProvider,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl NeatQueueClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.retries, config.retry_delay)?;
        Self::with_parts(config, Arc::new(transport), Arc::new(SystemClock))
    }

    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let headers = request_headers(config.api_key.as_deref())?;
        let cancel = CancellationToken::new();
        let probe = EndpointProbe::new(transport, headers, config.timeout, cancel.clone());

        info!(
            base_url = %config.base_url,
            configured = config.is_configured(),
            "NeatQueue client ready"
        );

        Ok(NeatQueueClient {
            config: Arc::new(config),
            probe,
            mock: MockDataProvider::new(Arc::clone(&clock)),
            clock,
            cancel,
        })
    }

    /// Cancelling this token stops in-flight probing at the next candidate.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn config_status(&self) -> ConfigStatus {
        self.config.status()
    }

    // ── Operations ─────────────────────────────────────────────────────────────

    /// Guild leaderboard. If no guild-scoped endpoint answers, the global
    /// stats endpoint is tried; when that carries no player list either, a
    /// placeholder leaderboard is served.
    pub async fn leaderboard(&self, query: LeaderboardQuery) -> Sourced<Vec<PlayerRecord>> {
        let limit = self.config.limit(query.limit);
        if !self.is_configured() {
            debug!(resource = "leaderboard", "NeatQueue not configured, serving mock data");
            return Sourced::mock(self.mock.leaderboard(limit), Provenance::MockUnconfigured);
        }

        let params = Params {
            season: query.season.as_deref(),
            limit,
            offset: query.offset,
            ..Params::default()
        };

        let payload = match self.fetch(&resources::LEADERBOARD, &params).await {
            Ok(hit) => {
                debug!(endpoint = %hit.endpoint, "Leaderboard endpoint answered");
                Some(hit.payload)
            }
            Err(ProbeError::Cancelled) => None,
            Err(e) => {
                warn!(error = %e, "No guild-specific leaderboard endpoint answered, trying global stats");
                match self.fetch(&resources::GLOBAL_STATS, &params).await {
                    Ok(hit) => Some(hit.payload),
                    Err(e) => {
                        warn!(resource = "global-stats", error = %e, "Falling back to mock data");
                        None
                    }
                }
            }
        };

        match payload {
            Some(raw) if normalize::has_player_envelope(&raw) => {
                let records = normalize::normalize_players(&raw)
                    .into_iter()
                    .skip(query.offset)
                    .take(limit)
                    .collect();
                Sourced::live(records)
            }
            Some(raw) => {
                info!("Global stats carry no player list, deriving placeholder leaderboard");
                debug!(stats = %raw, "Global stats payload");
                Sourced::mock(self.mock.leaderboard(limit), Provenance::MockFallbackOnError)
            }
            None => Sourced::mock(self.mock.leaderboard(limit), Provenance::MockFallbackOnError),
        }
    }

    /// Stats for one player. `records` is `None` when the player is unknown.
    pub async fn player_stats(
        &self,
        player_id: &str,
        season: Option<&str>,
    ) -> Sourced<Option<PlayerRecord>> {
        let params = Params {
            player: Some(player_id),
            season,
            ..Params::default()
        };
        self.acquire(
            &resources::PLAYER_STATS,
            &params,
            |raw| normalize::normalize_player(raw, player_id),
            || self.mock.player(player_id),
        )
        .await
    }

    pub async fn guild_stats(&self, season: Option<&str>) -> Sourced<GuildStats> {
        let params = Params {
            season,
            ..Params::default()
        };
        self.acquire(
            &resources::GUILD_STATS,
            &params,
            normalize::normalize_guild_stats,
            || self.mock.guild_stats(),
        )
        .await
    }

    pub async fn seasons(&self) -> Sourced<Vec<String>> {
        self.acquire(
            &resources::SEASONS,
            &Params::default(),
            normalize::normalize_seasons,
            || self.mock.seasons(),
        )
        .await
    }

    pub async fn recent_matches(&self, query: MatchQuery) -> Sourced<Vec<MatchRecord>> {
        let limit = self.config.limit(query.limit.or(Some(DEFAULT_MATCH_LIMIT)));
        let params = Params {
            limit,
            offset: query.offset,
            ..Params::default()
        };
        self.acquire(
            &resources::MATCHES,
            &params,
            |raw| {
                let mut matches = normalize::normalize_matches(raw);
                matches.truncate(limit);
                matches
            },
            || self.mock.matches(),
        )
        .await
    }

    /// Teams currently waiting in the guild's queues.
    pub async fn queue(&self, query: QueueQuery) -> Sourced<Vec<TeamRecord>> {
        let limit = self.config.limit(query.limit);
        let now = self.clock.now();
        let params = Params {
            limit,
            ..Params::default()
        };
        self.acquire(
            &resources::QUEUE,
            &params,
            |raw| {
                let mut teams = normalize::normalize_teams(raw, now);
                teams.truncate(limit);
                teams
            },
            || self.mock.queue(),
        )
        .await
    }

    /// Hit each generic discovery path once and report what answered.
    pub async fn discover_endpoints(&self) -> Result<Vec<EndpointReport>, ClientError> {
        if !self.is_configured() {
            return Err(ClientError::NotConfigured);
        }

        let mut reports = Vec::with_capacity(resources::DISCOVERY_PATHS.len());
        for path in resources::DISCOVERY_PATHS {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(candidate) = self.render(path, &Params::default()) else {
                continue;
            };
            let report = match self.probe.fetch(&candidate).await {
                Ok((status, data)) => EndpointReport {
                    path: path.to_string(),
                    ok: true,
                    status: Some(status),
                    error: None,
                    data: Some(data),
                },
                Err(failure) => EndpointReport {
                    path: path.to_string(),
                    ok: false,
                    status: match &failure {
                        CandidateFailure::Status { status, .. } => Some(*status),
                        _ => None,
                    },
                    error: Some(failure.to_string()),
                    data: None,
                },
            };
            debug!(path, ok = report.ok, "Discovery probe");
            reports.push(report);
        }

        info!(
            answered = reports.iter().filter(|r| r.ok).count(),
            total = reports.len(),
            "Endpoint discovery finished"
        );
        Ok(reports)
    }

    // ── Plumbing ───────────────────────────────────────────────────────────────

    async fn acquire<T>(
        &self,
        resource: &ResourceDescriptor,
        params: &Params<'_>,
        normalize: impl FnOnce(&Value) -> T,
        fallback: impl FnOnce() -> T,
    ) -> Sourced<T> {
        if !self.is_configured() {
            debug!(resource = resource.name, "NeatQueue not configured, serving mock data");
            return Sourced::mock(fallback(), Provenance::MockUnconfigured);
        }

        match self.fetch(resource, params).await {
            Ok(hit) => {
                debug!(resource = resource.name, endpoint = %hit.endpoint, "Normalizing live payload");
                Sourced::live(normalize(&hit.payload))
            }
            Err(e) => {
                warn!(resource = resource.name, error = %e, "Falling back to mock data");
                Sourced::mock(fallback(), Provenance::MockFallbackOnError)
            }
        }
    }

    async fn fetch(
        &self,
        resource: &ResourceDescriptor,
        params: &Params<'_>,
    ) -> Result<Probed, ProbeError> {
        let candidates: Vec<Candidate> = resource
            .candidates
            .iter()
            .filter_map(|template| self.render(template, params))
            .collect();
        self.probe.probe(resource.name, &candidates, resource.shape).await
    }

    fn render(&self, template: &str, params: &Params<'_>) -> Option<Candidate> {
        let guild = self.config.guild_id.as_deref().unwrap_or_default();
        let path = template
            .replace("{guild}", &encode(guild))
            .replace("{player}", &encode(params.player.unwrap_or_default()))
            .replace("{limit}", &params.limit.to_string())
            .replace("{offset}", &params.offset.to_string());

        let base = self.config.base_url.as_str().trim_end_matches('/');
        let mut url = match Url::parse(&format!("{}{}", base, path)) {
            Ok(url) => url,
            Err(e) => {
                warn!(template, error = %e, "Skipping unrenderable candidate endpoint");
                return None;
            }
        };
        if let Some(season) = params.season {
            url.query_pairs_mut().append_pair("season", season);
        }
        Some(Candidate { path, url })
    }
}

fn request_headers(api_key: Option<&str>) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| ClientError::InvalidCredential)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
