//! Probability use cases.
//!
//! Each use case runs its domain computation on the blocking pool, inside a
//! span tagged with a fresh correlation id, and memoizes the result in a TTL
//! cache when caching is enabled. The flow for injury outcomes is:
//! 1. Client computes a hit distribution (ComputeSuccessDistribution)
//! 2. Client sends it back with injury parameters (ComputeInjuryOutcome)
//! 3. The configured injury table applies unless the request carries one

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::Instrument;
use trenchodds_domain::{
    DiceMechanic, Distribution, DomainError, EngineLimits, HitDistribution, InjuryMechanic,
    InjuryOutcome, InjuryParameters, InjuryTable, ResolutionMode, RollParameters, RollShape,
    SuccessDistribution,
};

use crate::infrastructure::cache::TtlCache;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::correlation::CorrelationId;

/// Container for probability use cases.
pub struct ProbabilityUseCases {
    pub roll: Arc<ComputeRollDistribution>,
    pub success: Arc<ComputeSuccessDistribution>,
    pub injury: Arc<ComputeInjuryOutcome>,
}

impl ProbabilityUseCases {
    pub fn new(
        roll: Arc<ComputeRollDistribution>,
        success: Arc<ComputeSuccessDistribution>,
        injury: Arc<ComputeInjuryOutcome>,
    ) -> Self {
        Self {
            roll,
            success,
            injury,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let cache = CacheSettings {
            ttl: config.cache_ttl,
            max_entries: config.cache_max_entries,
        };
        Self::new(
            Arc::new(ComputeRollDistribution::new(config.limits, cache)),
            Arc::new(ComputeSuccessDistribution::new(config.limits, cache)),
            Arc::new(ComputeInjuryOutcome::new(
                config.limits,
                Arc::new(config.injury_table.clone()),
                cache,
            )),
        )
    }

    /// Drop expired results from every cache, returning how many went.
    pub async fn cleanup_expired(&self) -> usize {
        self.roll.cleanup_expired().await
            + self.success.cleanup_expired().await
            + self.injury.cleanup_expired().await
    }
}

#[derive(Debug, Error)]
pub enum ProbabilityError {
    #[error("{source}")]
    Domain {
        correlation_id: CorrelationId,
        #[source]
        source: DomainError,
    },
    #[error("Computation task failed: {message}")]
    TaskFailed {
        correlation_id: CorrelationId,
        message: String,
    },
}

impl ProbabilityError {
    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            ProbabilityError::Domain { correlation_id, .. }
            | ProbabilityError::TaskFailed { correlation_id, .. } => *correlation_id,
        }
    }
}

/// Result cache sizing shared by every use case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// `None` disables caching
    pub ttl: Option<Duration>,
    pub max_entries: usize,
}

impl CacheSettings {
    pub fn disabled() -> Self {
        Self {
            ttl: None,
            max_entries: 1,
        }
    }

    fn build<K, V>(&self) -> Option<TtlCache<K, V>>
    where
        K: Eq + std::hash::Hash + Clone + Send + Sync,
        V: Clone + Send + Sync,
    {
        self.ttl.map(|ttl| TtlCache::new(ttl, self.max_entries))
    }
}

// =============================================================================
// Roll distribution
// =============================================================================

/// Kept-dice total distribution for one roll.
pub struct ComputeRollDistribution {
    limits: EngineLimits,
    cache: Option<TtlCache<RollShape, Distribution<i32>>>,
}

impl ComputeRollDistribution {
    pub fn new(limits: EngineLimits, cache: CacheSettings) -> Self {
        Self {
            limits,
            cache: cache.build(),
        }
    }

    pub async fn execute(&self, shape: RollShape) -> Result<Distribution<i32>, ProbabilityError> {
        let correlation_id = CorrelationId::new();
        let limits = self.limits;
        cached(self.cache.as_ref(), shape, correlation_id, move || {
            DiceMechanic::new(limits).kept_dice_distribution(&shape)
        })
        .instrument(correlation_id.span("roll_distribution"))
        .await
    }

    async fn cleanup_expired(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.cleanup_expired().await,
            None => 0,
        }
    }
}

// =============================================================================
// Success distribution
// =============================================================================

/// Hit-count distribution over repeated rolls.
pub struct ComputeSuccessDistribution {
    limits: EngineLimits,
    cache: Option<TtlCache<RollParameters, HitDistribution>>,
}

impl ComputeSuccessDistribution {
    pub fn new(limits: EngineLimits, cache: CacheSettings) -> Self {
        Self {
            limits,
            cache: cache.build(),
        }
    }

    pub async fn execute(
        &self,
        params: RollParameters,
    ) -> Result<HitDistribution, ProbabilityError> {
        let correlation_id = CorrelationId::new();
        let limits = self.limits;
        cached(self.cache.as_ref(), params, correlation_id, move || {
            SuccessDistribution::new(limits).compute(&params)
        })
        .instrument(correlation_id.span("success_distribution"))
        .await
    }

    async fn cleanup_expired(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.cleanup_expired().await,
            None => 0,
        }
    }
}

// =============================================================================
// Injury outcome
// =============================================================================

/// Input for an injury outcome computation
#[derive(Debug, Clone, PartialEq)]
pub struct InjuryOutcomeInput {
    pub hits: HitDistribution,
    pub params: InjuryParameters,
    /// Replaces the configured table for this computation only
    pub table: Option<InjuryTable>,
    pub mode: ResolutionMode,
}

/// Hits are keyed by the bit pattern of their probabilities so equal inputs
/// share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InjuryCacheKey {
    hits: Vec<(u32, u64)>,
    params: InjuryParameters,
    table: Arc<InjuryTable>,
    mode: ResolutionMode,
}

/// Blood markers and out-of-action odds for a hit distribution.
pub struct ComputeInjuryOutcome {
    limits: EngineLimits,
    default_table: Arc<InjuryTable>,
    cache: Option<TtlCache<InjuryCacheKey, InjuryOutcome>>,
}

impl ComputeInjuryOutcome {
    pub fn new(limits: EngineLimits, default_table: Arc<InjuryTable>, cache: CacheSettings) -> Self {
        Self {
            limits,
            default_table,
            cache: cache.build(),
        }
    }

    /// Table used when a request does not carry its own.
    pub fn default_table(&self) -> &InjuryTable {
        &self.default_table
    }

    pub async fn execute(
        &self,
        input: InjuryOutcomeInput,
    ) -> Result<InjuryOutcome, ProbabilityError> {
        let correlation_id = CorrelationId::new();
        let span = correlation_id.span("injury_outcome");

        let table = match input.table {
            Some(table) => {
                tracing::debug!(parent: &span, table = %table.name, version = table.version, "Using request injury table");
                Arc::new(table)
            }
            None => Arc::clone(&self.default_table),
        };
        let key = InjuryCacheKey {
            hits: input
                .hits
                .iter()
                .map(|(hits, p)| (hits, p.to_bits()))
                .collect(),
            params: input.params,
            table: Arc::clone(&table),
            mode: input.mode,
        };

        let limits = self.limits;
        let hits = input.hits;
        let params = input.params;
        let mode = input.mode;
        cached(self.cache.as_ref(), key, correlation_id, move || {
            let mechanic = InjuryMechanic::new(limits, &table)?;
            InjuryOutcome::compute(&hits, &params, &mechanic, mode)
        })
        .instrument(span)
        .await
    }

    async fn cleanup_expired(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.cleanup_expired().await,
            None => 0,
        }
    }
}

// =============================================================================
// Shared plumbing
// =============================================================================

/// Serve `key` from `cache`, or compute it on the blocking pool and store it.
async fn cached<K, V, F>(
    cache: Option<&TtlCache<K, V>>,
    key: K,
    correlation_id: CorrelationId,
    compute: F,
) -> Result<V, ProbabilityError>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync,
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Result<V, DomainError> + Send + 'static,
{
    let Some(cache) = cache else {
        return run_blocking(correlation_id, compute).await;
    };

    if let Some(value) = cache.get(&key).await {
        tracing::debug!("Result cache hit");
        return Ok(value);
    }
    tracing::debug!("Result cache miss");

    let value = run_blocking(correlation_id, compute).await?;
    cache.insert(key, value.clone()).await;
    Ok(value)
}

async fn run_blocking<V, F>(correlation_id: CorrelationId, compute: F) -> Result<V, ProbabilityError>
where
    V: Send + 'static,
    F: FnOnce() -> Result<V, DomainError> + Send + 'static,
{
    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || span.in_scope(compute))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Computation task failed");
            ProbabilityError::TaskFailed {
                correlation_id,
                message: e.to_string(),
            }
        })?;

    result.map_err(|source| {
        match &source {
            DomainError::InternalInvariantViolation(_) => {
                tracing::error!(error = %source, "Computation broke a distribution invariant")
            }
            DomainError::ResourceLimitExceeded { .. } => {
                tracing::warn!(error = %source, "Computation rejected by engine limits")
            }
            DomainError::InvalidParameter(_) => {
                tracing::debug!(error = %source, "Computation rejected invalid input")
            }
        }
        ProbabilityError::Domain {
            correlation_id,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trenchodds_domain::{InjuryBand, InjuryEffect, InjuryResult};

    fn cached_settings() -> CacheSettings {
        CacheSettings {
            ttl: Some(Duration::from_secs(60)),
            max_entries: 16,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn test_roll_distribution_baseline() {
        let use_case = ComputeRollDistribution::new(EngineLimits::default(), cached_settings());
        let dist = use_case.execute(RollShape::default()).await.unwrap();
        assert_eq!(dist.len(), 11);
        assert_close(dist.probability(&7), 6.0 / 36.0);
    }

    #[tokio::test]
    async fn test_success_distribution_is_cached_and_identical() {
        let use_case = ComputeSuccessDistribution::new(EngineLimits::default(), cached_settings());
        let params = RollParameters {
            num_rolls: 5,
            ..RollParameters::default()
        };

        let first = use_case.execute(params).await.unwrap();
        let second = use_case.execute(params).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(use_case.cache.as_ref().unwrap().len().await, 1);

        let fresh = ComputeSuccessDistribution::new(EngineLimits::default(), CacheSettings::disabled())
            .execute(params)
            .await
            .unwrap();
        assert_eq!(first, fresh);
    }

    #[tokio::test]
    async fn test_success_distribution_single_roll_is_bernoulli() {
        let use_case =
            ComputeSuccessDistribution::new(EngineLimits::default(), CacheSettings::disabled());
        let dist = use_case.execute(RollParameters::default()).await.unwrap();
        assert_close(dist.probability(&1), 21.0 / 36.0);
        assert_close(dist.probability(&0), 15.0 / 36.0);
    }

    #[tokio::test]
    async fn test_limit_errors_carry_correlation_id() {
        let use_case = ComputeSuccessDistribution::new(EngineLimits::default(), cached_settings());
        let params = RollParameters {
            modified_dice: 9,
            ..RollParameters::default()
        };
        let err = use_case.execute(params).await.unwrap_err();
        match &err {
            ProbabilityError::Domain { source, .. } => {
                assert!(matches!(source, DomainError::ResourceLimitExceeded { .. }))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.correlation_id().short().len(), 8);
        assert!(use_case.cache.as_ref().unwrap().is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_rolls_rejected() {
        let use_case =
            ComputeSuccessDistribution::new(EngineLimits::default(), CacheSettings::disabled());
        let params = RollParameters {
            num_rolls: 0,
            ..RollParameters::default()
        };
        let err = use_case.execute(params).await.unwrap_err();
        assert!(matches!(
            err,
            ProbabilityError::Domain {
                source: DomainError::InvalidParameter(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_injury_outcome_default_table() {
        let use_case = ComputeInjuryOutcome::new(
            EngineLimits::default(),
            Arc::new(InjuryTable::trench_crusade()),
            cached_settings(),
        );
        let outcome = use_case
            .execute(InjuryOutcomeInput {
                hits: Distribution::point(1),
                params: InjuryParameters::default(),
                table: None,
                mode: ResolutionMode::Independent,
            })
            .await
            .unwrap();
        assert_close(outcome.out_of_action_probability(), 10.0 / 36.0);
        assert_close(
            outcome.tallies().probability(&InjuryResult::Markers(1)),
            26.0 / 36.0,
        );
    }

    #[tokio::test]
    async fn test_request_table_overrides_default() {
        let use_case = ComputeInjuryOutcome::new(
            EngineLimits::default(),
            Arc::new(InjuryTable::trench_crusade()),
            cached_settings(),
        );
        let lethal = InjuryTable {
            name: "lethal".to_string(),
            version: 1,
            bands: vec![InjuryBand::new(i32::MIN, InjuryEffect::OutOfAction)],
            downed_markers: 1,
            downed_repeat_markers: 2,
        };
        let input = |table| InjuryOutcomeInput {
            hits: Distribution::point(1),
            params: InjuryParameters::default(),
            table,
            mode: ResolutionMode::Independent,
        };

        let overridden = use_case.execute(input(Some(lethal))).await.unwrap();
        assert_close(overridden.out_of_action_probability(), 1.0);

        let standard = use_case.execute(input(None)).await.unwrap();
        assert_close(standard.out_of_action_probability(), 10.0 / 36.0);
        assert_eq!(use_case.cache.as_ref().unwrap().len().await, 2);
        assert_eq!(use_case.default_table().name, "trench_crusade");
    }

    #[tokio::test]
    async fn test_invalid_request_table_rejected() {
        let use_case = ComputeInjuryOutcome::new(
            EngineLimits::default(),
            Arc::new(InjuryTable::trench_crusade()),
            CacheSettings::disabled(),
        );
        let broken = InjuryTable {
            bands: vec![],
            ..InjuryTable::trench_crusade()
        };
        let err = use_case
            .execute(InjuryOutcomeInput {
                hits: Distribution::point(1),
                params: InjuryParameters::default(),
                table: Some(broken),
                mode: ResolutionMode::Escalating,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProbabilityError::Domain {
                source: DomainError::InvalidParameter(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired_across_caches() {
        let config = EngineConfig {
            cache_ttl: Some(Duration::from_secs(60)),
            ..EngineConfig::default()
        };
        let use_cases = ProbabilityUseCases::from_config(&config);
        use_cases.roll.execute(RollShape::default()).await.unwrap();
        assert_eq!(use_cases.cleanup_expired().await, 0);
    }
}
