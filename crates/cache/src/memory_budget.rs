//! Memory budget tracking and capacity-driven eviction
//!
//! The texture cache does not decide on its own what to evict when it grows.
//! After every insert it reports its footprint to a [`CapacityPolicy`] and
//! evicts whatever the policy selects. [`BudgetPolicy`] is the stock policy:
//! once usage goes over budget it evicts least recently used, unreferenced
//! textures until usage is back at the target utilization.

use std::fmt;

use crate::params::ResourceKey;

/// Memory pressure level indicating cache health
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryPressure {
    /// Memory usage is low (< 50% utilization)
    Low,
    /// Memory usage is moderate (50-75% utilization)
    Moderate,
    /// Memory usage is high (75-90% utilization)
    High,
    /// Memory usage is critical (> 90% utilization)
    Critical,
}

impl MemoryPressure {
    /// Get the memory pressure level from a utilization ratio (0.0 to 1.0)
    pub fn from_utilization(utilization: f64) -> Self {
        if utilization < 0.5 {
            MemoryPressure::Low
        } else if utilization < 0.75 {
            MemoryPressure::Moderate
        } else if utilization < 0.90 {
            MemoryPressure::High
        } else {
            MemoryPressure::Critical
        }
    }
}

/// Configuration for memory budget thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryBudgetConfig {
    /// Total texture memory budget in bytes
    pub total_budget: usize,
    /// Target utilization after eviction (0.0 to 1.0)
    pub target_utilization: f64,
}

impl Default for MemoryBudgetConfig {
    fn default() -> Self {
        Self {
            total_budget: 512 * 1024 * 1024,
            target_utilization: 0.80,
        }
    }
}

impl MemoryBudgetConfig {
    /// Create a configuration with a budget in megabytes
    pub fn new(total_budget_mb: usize) -> Self {
        Self::with_bytes(total_budget_mb * 1024 * 1024)
    }

    /// Create a configuration with a budget in bytes
    pub fn with_bytes(total_budget: usize) -> Self {
        Self {
            total_budget,
            ..Default::default()
        }
    }

    /// Get the target bytes after eviction
    pub fn target_bytes(&self) -> usize {
        (self.total_budget as f64 * self.target_utilization) as usize
    }
}

/// Tracks usage reported by the cache against a byte budget
#[derive(Debug, Clone)]
pub struct MemoryBudget {
    config: MemoryBudgetConfig,
    current_usage: usize,
}

impl MemoryBudget {
    pub fn new(config: MemoryBudgetConfig) -> Self {
        Self {
            config,
            current_usage: 0,
        }
    }

    pub fn current_usage(&self) -> usize {
        self.current_usage
    }

    pub fn total_budget(&self) -> usize {
        self.config.total_budget
    }

    /// Set the current usage (as reported by the cache)
    pub fn set_usage(&mut self, bytes: usize) {
        self.current_usage = bytes;
    }

    /// Get the current utilization ratio (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.config.total_budget == 0 {
            0.0
        } else {
            self.current_usage as f64 / self.config.total_budget as f64
        }
    }

    pub fn pressure(&self) -> MemoryPressure {
        MemoryPressure::from_utilization(self.utilization())
    }

    pub fn is_over_budget(&self) -> bool {
        self.current_usage > self.config.total_budget
    }

    /// Bytes to evict to get back to the target utilization
    ///
    /// Returns 0 if current usage is already below target.
    pub fn bytes_to_evict(&self) -> usize {
        self.current_usage.saturating_sub(self.config.target_bytes())
    }

    pub fn config(&self) -> &MemoryBudgetConfig {
        &self.config
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::new(MemoryBudgetConfig::default())
    }
}

/// Size of the texture cache as reported to a [`CapacityPolicy`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheFootprint {
    pub texture_count: usize,
    pub vram_used: usize,
}

/// A cached texture the policy may choose to evict
#[derive(Debug, Clone, Copy)]
pub struct EvictionCandidate {
    pub key: ResourceKey,
    pub vram_size: usize,
    /// A caller still holds a handle; evicting frees no memory yet
    pub in_use: bool,
}

/// Decides which cached textures to evict for capacity reasons
pub trait CapacityPolicy: fmt::Debug {
    /// Pick entries to evict
    ///
    /// `candidates` are ordered least recently used first. The entry that
    /// triggered the report is never among them.
    fn select_evictions(
        &mut self,
        footprint: CacheFootprint,
        candidates: &[EvictionCandidate],
    ) -> Vec<ResourceKey>;
}

/// Never evicts; the cache only shrinks through invalidation
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl CapacityPolicy for Unbounded {
    fn select_evictions(&mut self, _: CacheFootprint, _: &[EvictionCandidate]) -> Vec<ResourceKey> {
        Vec::new()
    }
}

/// LRU eviction against a byte budget and an optional texture count limit
#[derive(Debug, Clone, Default)]
pub struct BudgetPolicy {
    budget: MemoryBudget,
    max_textures: Option<usize>,
}

impl BudgetPolicy {
    pub fn new(budget: MemoryBudget) -> Self {
        Self {
            budget,
            max_textures: None,
        }
    }

    /// Budget in bytes, evicting down to the default target utilization
    pub fn with_bytes(total_budget: usize) -> Self {
        Self::new(MemoryBudget::new(MemoryBudgetConfig::with_bytes(total_budget)))
    }

    /// Also cap the number of cached textures
    pub fn with_max_textures(mut self, max_textures: usize) -> Self {
        self.max_textures = Some(max_textures);
        self
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    /// Pressure as of the last report
    pub fn pressure(&self) -> MemoryPressure {
        self.budget.pressure()
    }
}

impl CapacityPolicy for BudgetPolicy {
    fn select_evictions(
        &mut self,
        footprint: CacheFootprint,
        candidates: &[EvictionCandidate],
    ) -> Vec<ResourceKey> {
        self.budget.set_usage(footprint.vram_used);

        let mut bytes_to_free = if self.budget.is_over_budget() {
            self.budget.bytes_to_evict()
        } else {
            0
        };
        let mut count_to_free = self
            .max_textures
            .map_or(0, |max| footprint.texture_count.saturating_sub(max));

        let mut victims = Vec::new();
        for candidate in candidates {
            if bytes_to_free == 0 && count_to_free == 0 {
                break;
            }
            if candidate.in_use {
                continue;
            }
            victims.push(candidate.key);
            bytes_to_free = bytes_to_free.saturating_sub(candidate.vram_size);
            count_to_free = count_to_free.saturating_sub(1);
        }

        if !victims.is_empty() {
            log::debug!(
                "capacity eviction of {} textures ({} bytes used, pressure {:?})",
                victims.len(),
                footprint.vram_used,
                self.budget.pressure()
            );
        }
        victims
    }
}
