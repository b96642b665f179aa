//! `LlmParameters` — a named, ownable set of generation parameters — and
//! the explicit-id/user-default/system-default selection policy used to
//! resolve one for a given call. Mirrors
//! [`quarry_template::registry::TemplateRegistry`]'s resolution policy,
//! except resolution here is fallible: a call that names no explicit
//! parameter set, and whose owner has no default, and for which no
//! system default exists, is a configuration error, not a silent
//! fallback to hardcoded values.

use crate::provider::ProviderError;
use layer0::id::{ParameterSetId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A named set of generation parameters owned by a user (or the system,
/// conventionally represented by a well-known [`UserId`]). At most one
/// parameter set per owner may have `is_default` set; the registry does
/// not enforce this at write time (callers may overwrite a prior default
/// with `put`), mirroring `TemplateRegistry`'s own trust-the-caller
/// stance on `put`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmParameters {
    /// Unique id.
    pub id: ParameterSetId,
    /// Owning user.
    pub owner: UserId,
    /// Human-readable name.
    pub name: String,
    /// Maximum tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature, in `[0, 2]`.
    pub temperature: f32,
    /// Top-k sampling cutoff. `0` disables top-k filtering.
    pub top_k: u32,
    /// Nucleus sampling cutoff, in `[0, 1]`.
    pub top_p: f32,
    /// Optional repetition penalty, when the backend supports one.
    pub repetition_penalty: Option<f32>,
    /// Whether this is the owner's default parameter set.
    pub is_default: bool,
}

impl LlmParameters {
    /// Construct a parameter set, validating `temperature` and `top_p`.
    pub fn new(
        id: ParameterSetId,
        owner: UserId,
        name: impl Into<String>,
        max_new_tokens: u32,
        temperature: f32,
        top_k: u32,
        top_p: f32,
        repetition_penalty: Option<f32>,
    ) -> Result<Self, ProviderError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ProviderError::InvalidParameters(format!(
                "temperature must be in [0, 2], got {temperature}"
            )));
        }
        if !(0.0..=1.0).contains(&top_p) {
            return Err(ProviderError::InvalidParameters(format!(
                "top_p must be in [0, 1], got {top_p}"
            )));
        }

        Ok(Self {
            id,
            owner,
            name: name.into(),
            max_new_tokens,
            temperature,
            top_k,
            top_p,
            repetition_penalty,
            is_default: false,
        })
    }
}

/// In-memory store of [`LlmParameters`], implementing the mandatory
/// resolution chain: explicit id, else the caller's default, else the
/// system default, else [`ProviderError::ConfigurationMissing`].
#[derive(Default)]
pub struct ParameterRegistry {
    sets: RwLock<HashMap<ParameterSetId, LlmParameters>>,
}

impl ParameterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
        }
    }

    /// Store or overwrite a parameter set.
    pub fn put(&self, params: LlmParameters) {
        let mut sets = self.sets.write().expect("parameter registry lock poisoned");
        sets.insert(params.id.clone(), params);
    }

    /// Resolve parameters for `user`, honoring an explicit `parameter_id`
    /// override if given. Falls back to `user`'s default set, then to any
    /// system default (any set with `is_default` set, regardless of
    /// owner). Fails with [`ProviderError::ConfigurationMissing`] when
    /// none of the three apply.
    pub fn resolve(
        &self,
        parameter_id: Option<&ParameterSetId>,
        user: &UserId,
    ) -> Result<LlmParameters, ProviderError> {
        let sets = self.sets.read().expect("parameter registry lock poisoned");

        if let Some(id) = parameter_id {
            if let Some(params) = sets.get(id) {
                return Ok(params.clone());
            }
            return Err(ProviderError::ConfigurationMissing(format!(
                "no parameter set registered with id {id}"
            )));
        }

        let user_default = sets.values().find(|p| p.owner == *user && p.is_default);
        if let Some(params) = user_default {
            return Ok(params.clone());
        }

        let system_default = sets.values().find(|p| p.is_default);
        if let Some(params) = system_default {
            return Ok(params.clone());
        }

        Err(ProviderError::ConfigurationMissing(format!(
            "no explicit, user-default, or system-default LLM parameters for user {user}"
        )))
    }
}
