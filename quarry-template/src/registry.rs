//! Template storage and the explicit-id/user-default/system-default
//! selection policy.

use crate::error::TemplateError;
use crate::template::{PromptTemplate, TemplateType};
use layer0::id::{TemplateId, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory template store implementing the selection policy:
/// explicit id, else the user's default of that type, else the system
/// default, else [`TemplateError::TemplateNotFound`].
#[derive(Default)]
pub struct TemplateRegistry {
    templates: RwLock<HashMap<TemplateId, PromptTemplate>>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Store or overwrite a template.
    pub fn put(&self, template: PromptTemplate) {
        let mut templates = self.templates.write().expect("template registry lock poisoned");
        templates.insert(template.id.clone(), template);
    }

    /// Resolve a template for `user` and `template_type`, honoring an
    /// explicit `template_id` override if given.
    pub fn resolve(
        &self,
        template_id: Option<&TemplateId>,
        user: &UserId,
        template_type: TemplateType,
    ) -> Result<PromptTemplate, TemplateError> {
        let templates = self.templates.read().expect("template registry lock poisoned");

        if let Some(id) = template_id {
            if let Some(template) = templates.get(id) {
                return Ok(template.clone());
            }
        }

        let user_default = templates.values().find(|t| {
            t.template_type == template_type && t.owner == *user && t.is_default
        });
        if let Some(template) = user_default {
            return Ok(template.clone());
        }

        let system_default = templates.values().find(|t| {
            t.template_type == template_type && t.is_default
        });
        if let Some(template) = system_default {
            return Ok(template.clone());
        }

        Err(TemplateError::TemplateNotFound(format!("{template_type:?}")))
    }
}
